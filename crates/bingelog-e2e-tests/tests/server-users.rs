use bingelog_e2e_tests::{launch_user, login, prepare_env, register_user, spawn_server};
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_registration_and_profile() {
    let (args, _config_guard) = prepare_env("test_registration").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let client = reqwest::Client::new();
    let url = base_url.join("users").unwrap();

    // email domain gets normalized to lowercase
    let response = client
        .post(url.clone())
        .json(&json!({"email": "Someone@EXAMPLE.COM", "password": "testpass123", "name": "Someone"}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 201);
    let user: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        user.get("email").unwrap().as_str().unwrap(),
        "Someone@example.com"
    );
    assert!(user.get("password").is_none());
    assert!(user.get("is_active").unwrap().as_bool().unwrap());

    // login must use the normalized address
    let client = login(&base_url, "Someone@example.com", "testpass123")
        .await
        .unwrap();

    let me_url = base_url.join("users/me").unwrap();
    let response = client.get(me_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let me: serde_json::Value = response.json().await.unwrap();
    assert_eq!(me.get("name").unwrap().as_str().unwrap(), "Someone");

    let response = client
        .patch(me_url.clone())
        .json(&json!({"name": "Someone Else"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let me: serde_json::Value = response.json().await.unwrap();
    assert_eq!(me.get("name").unwrap().as_str().unwrap(), "Someone Else");

    // password change invalidates the old credentials
    let response = client
        .patch(me_url.clone())
        .json(&json!({"password": "newpass456"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert!(
        login(&base_url, "Someone@example.com", "testpass123")
            .await
            .is_err()
    );
    login(&base_url, "Someone@example.com", "newpass456")
        .await
        .unwrap();

    // only GET and PATCH are routed on /users/me
    let response = client.post(me_url).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 405);
}

#[tokio::test]
#[traced_test]
async fn test_invalid_registrations() {
    let (args, _config_guard) = prepare_env("test_invalid_registrations").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let client = reqwest::Client::new();
    let url = base_url.join("users").unwrap();

    let response = client
        .post(url.clone())
        .json(&json!({"email": "", "password": "testpass123"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    let response = client
        .post(url.clone())
        .json(&json!({"email": "not-an-email", "password": "testpass123"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    // password below minimum length
    let response = client
        .post(url.clone())
        .json(&json!({"email": "short@example.com", "password": "1234"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_login_failures() {
    let (args, _config_guard) = prepare_env("test_login_failures").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    register_user(&base_url, "user@example.com", "testpass123")
        .await
        .unwrap();

    assert!(
        login(&base_url, "user@example.com", "wrongpass")
            .await
            .is_err()
    );
    assert!(
        login(&base_url, "nobody@example.com", "testpass123")
            .await
            .is_err()
    );

    let client = reqwest::Client::new();
    let response = client
        .post(base_url.join("auth/token").unwrap())
        .json(&json!({"email": "user@example.com", "password": "wrongpass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    launch_user(&base_url, "other@example.com", "testpass123")
        .await
        .unwrap();
}
