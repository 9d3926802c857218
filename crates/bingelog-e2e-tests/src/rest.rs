use anyhow::Result;
use bingelog_dal::{character::Character, series::SeriesSummary, tag::Tag};
use reqwest::Url;
use serde_json::json;
use tracing::info;

pub async fn create_tag(client: &reqwest::Client, base_url: &Url, name: &str) -> Result<Tag> {
    let payload = json!({"name": name});
    let api_url = base_url.join("api/tags").unwrap();

    let response = client.post(api_url.clone()).json(&payload).send().await?;
    assert!(response.status().as_u16() == 201);

    let new_tag: Tag = response.json().await?;
    Ok(new_tag)
}

pub async fn create_character(
    client: &reqwest::Client,
    base_url: &Url,
    name: &str,
) -> Result<Character> {
    let payload = json!({"name": name});
    let api_url = base_url.join("api/characters").unwrap();

    let response = client.post(api_url.clone()).json(&payload).send().await?;
    assert!(response.status().as_u16() == 201);

    let new_character: Character = response.json().await?;
    Ok(new_character)
}

pub async fn create_series<T>(
    client: &reqwest::Client,
    base_url: &Url,
    payload: &T,
) -> Result<SeriesSummary>
where
    T: serde::Serialize,
{
    let api_url = base_url.join("api/series").unwrap();

    let response = client.post(api_url.clone()).json(&payload).send().await?;
    info!("Series response: {:#?}", response);
    assert!(response.status().as_u16() == 201);

    let new_series: SeriesSummary = response.json().await?;
    Ok(new_series)
}
