use bingelog_dal::tag::Tag;
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
async fn test_tags_crud() {
    let (args, _config_guard) = prepare_env("test_tags_crud").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let client = launch_user(&base_url, "tags@example.com", "testpass123")
        .await
        .unwrap();

    let api_url = base_url.join("api/tags").unwrap();

    for name in ["Adventure", "Sci-fi", "Period"] {
        create_tag(&client, &base_url, name).await.unwrap();
    }

    // listing is name descending
    let response = client.get(api_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let tags: Vec<Tag> = response.json().await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Sci-fi", "Period", "Adventure"]);

    // rename via PUT
    let first_id = tags[0].id;
    let record_url = extend_url(&api_url, first_id);
    let response = client
        .put(record_url.clone())
        .json(&json!({"name": "Space opera"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let renamed: Tag = response.json().await.unwrap();
    assert_eq!(renamed.name, "Space opera");

    let response = client.get(record_url).send().await.unwrap();
    let fetched: Tag = response.json().await.unwrap();
    assert_eq!(fetched.name, "Space opera");

    // blank name is rejected
    let response = client
        .post(api_url.clone())
        .json(&json!({"name": "  "}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_labels_scoped_to_owner() {
    let (args, _config_guard) = prepare_env("test_labels_scoped").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let first = launch_user(&base_url, "first@example.com", "testpass123")
        .await
        .unwrap();
    let second = launch_user(&base_url, "second@example.com", "testpass123")
        .await
        .unwrap();

    let mine = create_tag(&first, &base_url, "Mine").await.unwrap();
    create_tag(&second, &base_url, "Theirs").await.unwrap();

    let api_url = base_url.join("api/tags").unwrap();
    let response = first.get(api_url.clone()).send().await.unwrap();
    let tags: Vec<Tag> = response.json().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "Mine");

    // other user's record answers 404, same as nonexistent
    let response = second
        .get(extend_url(&api_url, mine.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let response = second
        .put(extend_url(&api_url, mine.id))
        .json(&json!({"name": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // characters get the same treatment
    create_character(&first, &base_url, "Hero").await.unwrap();
    let characters_url = base_url.join("api/characters").unwrap();
    let response = second.get(characters_url).send().await.unwrap();
    let characters: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(characters.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_assigned_only_listing() {
    let (args, _config_guard) = prepare_env("test_assigned_only").unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    let client = launch_user(&base_url, "assigned@example.com", "testpass123")
        .await
        .unwrap();

    let used = create_tag(&client, &base_url, "Used").await.unwrap();
    create_tag(&client, &base_url, "Unused").await.unwrap();

    // the same tag on two series must appear once
    for title in ["First show", "Second show"] {
        create_series(
            &client,
            &base_url,
            &json!({
                "title": title,
                "status": true,
                "watch_rate": 1,
                "rating": 5.0,
                "link": null,
                "tags": [used.id],
                "characters": []
            }),
        )
        .await
        .unwrap();
    }

    let mut api_url = base_url.join("api/tags").unwrap();
    api_url.set_query(Some("assigned_only=1"));
    let response = client.get(api_url).send().await.unwrap();
    assert!(response.status().is_success());
    let tags: Vec<Tag> = response.json().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "Used");

    // without the flag both show up
    let response = client
        .get(base_url.join("api/tags").unwrap())
        .send()
        .await
        .unwrap();
    let tags: Vec<Tag> = response.json().await.unwrap();
    assert_eq!(tags.len(), 2);
}
