use bingelog_dal::series::{Series, SeriesSummary};
use bingelog_e2e_tests::{
    extend_url, launch_user, prepare_env,
    rest::{create_character, create_series, create_tag},
    spawn_server,
};
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_series_round_trip() {
    let (args, _config_guard) = prepare_env("test_series_round_trip").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let client = launch_user(&base_url, "series@example.com", "testpass123")
        .await
        .unwrap();

    let tag = create_tag(&client, &base_url, "Drama").await.unwrap();
    let character = create_character(&client, &base_url, "Captain")
        .await
        .unwrap();

    let created = create_series(
        &client,
        &base_url,
        &json!({
            "title": "Long voyage",
            "status": true,
            "watch_rate": 2,
            // rating keeps 2 decimals
            "rating": 7.777,
            "link": "https://example.com/voyage",
            "tags": [tag.id],
            "characters": [character.id]
        }),
    )
    .await
    .unwrap();
    assert_eq!(created.tags, vec![tag.id]);
    assert_eq!(created.rating, 7.78);

    let api_url = base_url.join("api/series").unwrap();

    // listing is flat, id references only
    let response = client.get(api_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let listed: Vec<SeriesSummary> = response.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].characters, vec![character.id]);

    // detail nests full records
    let record_url = extend_url(&api_url, created.id);
    let response = client.get(record_url).send().await.unwrap();
    assert!(response.status().is_success());
    let detail: Series = response.json().await.unwrap();
    assert_eq!(detail.title, "Long voyage");
    assert_eq!(detail.tags.len(), 1);
    assert_eq!(detail.tags[0].name, "Drama");
    assert_eq!(detail.characters[0].name, "Captain");

    // referencing a nonexistent tag fails up front
    let response = client
        .post(api_url.clone())
        .json(&json!({
            "title": "Ghost links",
            "status": false,
            "watch_rate": 0,
            "rating": 0.0,
            "link": null,
            "tags": [9999],
            "characters": []
        }))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 400);

    // rating outside range is a validation error
    let response = client
        .post(api_url)
        .json(&json!({
            "title": "Too good",
            "status": false,
            "watch_rate": 0,
            "rating": 100.0,
            "link": null
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_series_updates() {
    let (args, _config_guard) = prepare_env("test_series_updates").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let client = launch_user(&base_url, "updates@example.com", "testpass123")
        .await
        .unwrap();

    let tag = create_tag(&client, &base_url, "Mystery").await.unwrap();
    let character = create_character(&client, &base_url, "Sleuth").await.unwrap();

    let created = create_series(
        &client,
        &base_url,
        &json!({
            "title": "Whodunit",
            "status": true,
            "watch_rate": 1,
            "rating": 6.5,
            "link": null,
            "tags": [tag.id],
            "characters": [character.id]
        }),
    )
    .await
    .unwrap();

    let api_url = base_url.join("api/series").unwrap();
    let record_url = extend_url(&api_url, created.id);

    // PATCH touches only supplied fields, links stay
    let response = client
        .patch(record_url.clone())
        .json(&json!({"rating": 9.0}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let patched: SeriesSummary = response.json().await.unwrap();
    assert_eq!(patched.rating, 9.0);
    assert_eq!(patched.title, "Whodunit");
    assert_eq!(patched.tags, vec![tag.id]);
    assert_eq!(patched.characters, vec![character.id]);

    // PUT replaces everything, omitted characters list clears the links
    let response = client
        .put(record_url.clone())
        .json(&json!({
            "title": "Whodunit, season 2",
            "status": false,
            "watch_rate": 3,
            "rating": 8.0,
            "link": null,
            "tags": [tag.id]
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let replaced: SeriesSummary = response.json().await.unwrap();
    assert_eq!(replaced.title, "Whodunit, season 2");
    assert_eq!(replaced.tags, vec![tag.id]);
    assert!(replaced.characters.is_empty());

    // PATCH with explicit empty list clears as well
    let response = client
        .patch(record_url.clone())
        .json(&json!({"tags": []}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let patched: SeriesSummary = response.json().await.unwrap();
    assert!(patched.tags.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_series_filtering_and_scope() {
    let (args, _config_guard) = prepare_env("test_series_filtering").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let client = launch_user(&base_url, "filters@example.com", "testpass123")
        .await
        .unwrap();
    let other = launch_user(&base_url, "outsider@example.com", "testpass123")
        .await
        .unwrap();

    let comedy = create_tag(&client, &base_url, "Comedy").await.unwrap();
    let drama = create_tag(&client, &base_url, "Drama").await.unwrap();
    let lead = create_character(&client, &base_url, "Lead").await.unwrap();

    let funny = create_series(
        &client,
        &base_url,
        &json!({
            "title": "Funny one",
            "status": true,
            "watch_rate": 1,
            "rating": 5.0,
            "link": null,
            "tags": [comedy.id],
            "characters": []
        }),
    )
    .await
    .unwrap();
    create_series(
        &client,
        &base_url,
        &json!({
            "title": "Sad one",
            "status": true,
            "watch_rate": 1,
            "rating": 5.0,
            "link": null,
            "tags": [drama.id],
            "characters": [lead.id]
        }),
    )
    .await
    .unwrap();

    let api_url = base_url.join("api/series").unwrap();

    let list = |query: String| {
        let client = client.clone();
        let mut url = api_url.clone();
        async move {
            url.set_query(Some(&query));
            let response = client.get(url).send().await.unwrap();
            assert!(response.status().is_success());
            let rows: Vec<SeriesSummary> = response.json().await.unwrap();
            rows
        }
    };

    // OR within one dimension
    let rows = list(format!("tags={},{}", comedy.id, drama.id)).await;
    assert_eq!(rows.len(), 2);

    // AND between dimensions
    let rows = list(format!("tags={}&characters={}", drama.id, lead.id)).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Sad one");
    let rows = list(format!("tags={}&characters={}", comedy.id, lead.id)).await;
    assert!(rows.is_empty());

    // malformed id list
    let mut bad_url = api_url.clone();
    bad_url.set_query(Some("tags=1,oops"));
    let response = client.get(bad_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // other user sees nothing and cannot address the records
    let response = other.get(api_url.clone()).send().await.unwrap();
    let rows: Vec<SeriesSummary> = response.json().await.unwrap();
    assert!(rows.is_empty());
    let response = other
        .get(extend_url(&api_url, funny.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
