use anyhow::{Result, anyhow, ensure};
use bingelog_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use reqwest::Url;
use serde_json::json;
use tempfile::TempDir;
use tracing::error;

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let base_url = format!("http://localhost:{}", port);
    let args = &[
        "bingelog-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--base-url",
        &base_url,
        "--no-cors",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Starts the server on a background task and waits until it answers health
/// checks.
pub async fn spawn_server(args: ServerConfig) -> Result<()> {
    let base_url = args.base_url.clone();
    let state = bingelog_server::build_state(&args).await?;
    tokio::spawn(async move {
        if let Err(e) = bingelog_server::run_with_state(args, state).await {
            error!("Server failed: {e}");
        }
    });
    wait_for_server(&base_url).await
}

async fn wait_for_server(base_url: &Url) -> Result<()> {
    let client = reqwest::Client::new();
    let url = base_url.join("health")?;
    for _ in 0..50 {
        if let Ok(response) = client.get(url.clone()).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not start"))
}

pub async fn register_user(base_url: &Url, email: &str, password: &str) -> Result<()> {
    let response = reqwest::Client::new()
        .post(base_url.join("users")?)
        .json(&json!({"email": email, "password": password, "name": "Test User"}))
        .send()
        .await?;
    ensure!(
        response.status().as_u16() == 201,
        "registration failed: {}",
        response.status()
    );
    Ok(())
}

/// Logs in and returns a client sending the bearer token with every request.
pub async fn login(base_url: &Url, email: &str, password: &str) -> Result<reqwest::Client> {
    let response = reqwest::Client::new()
        .post(base_url.join("auth/token")?)
        .json(&json!({"email": email, "password": password}))
        .send()
        .await?;
    ensure!(
        response.status().is_success(),
        "login failed: {}",
        response.status()
    );
    let body: serde_json::Value = response.json().await?;
    let token = body
        .get("token")
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow!("Missing token in login response"))?;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        format!("Bearer {token}").parse()?,
    );
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Registers a fresh user and returns an authorized client.
pub async fn launch_user(base_url: &Url, email: &str, password: &str) -> Result<reqwest::Client> {
    register_user(base_url, email, password).await?;
    login(base_url, email, password).await
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .expect("base url cannot be a base")
        .push(&segment.to_string());
    url
}
