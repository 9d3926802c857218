use std::path::Path;

use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use bingelog_app::state::{AppConfig, AppState};
use bingelog_app::{auth::auth_router, rest_api, user::users_router};
use bingelog_store::FileStore;
use futures::FutureExt;
use tokio::{fs, io::AsyncWriteExt as _};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::Result;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    debug!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn main_router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/users", users_router())
        .nest("/auth", auth_router())
        .nest("/api/tags", rest_api::tag::router())
        .nest("/api/characters", rest_api::character::router())
        .nest(
            "/api/series",
            rest_api::series::router(state.config().upload_limit_mb),
        )
        .with_state(state)
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.data_dir();
    if !data_dir.is_dir() {
        fs::create_dir_all(&data_dir).await?;
        info!("Created data directory {data_dir:?}");
    }

    let files_dir = config.files_dir();
    if !files_dir.is_dir() {
        fs::create_dir_all(&files_dir).await?;
        info!("Created directory for uploaded files");
    }

    let app_config = AppConfig {
        base_url: config.base_url.clone(),
        upload_limit_mb: config.upload_limit_mb,
    };

    let pool = bingelog_dal::new_pool(&config.database_url()).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    // OK to block here, short and called only on init
    let secret = read_secret(&data_dir).await?;
    let tokens = bingelog_auth::token::TokenManager::new(&secret, config.token_validity);
    let store = FileStore::new(files_dir);

    Ok(AppState::new(app_config, pool, tokens, store))
}

async fn read_secret(data_dir: &Path) -> Result<Vec<u8>, std::io::Error> {
    let secret_file = data_dir.join("secret");

    let secret = if fs::try_exists(&secret_file).await? {
        fs::read(&secret_file).await?
    } else {
        let random_bytes = rand::random::<[u8; 32]>();
        #[cfg(unix)]
        let mut file = {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;
            {
                // Make sure the file is only accessible by the current user
                let _f = OpenOptions::new()
                    .mode(0o600)
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&secret_file)?;
            }
            fs::File::options().write(true).open(&secret_file).await?
        };
        #[cfg(not(unix))]
        let mut file = fs::File::create(&secret_file).await?;

        file.write_all(&random_bytes).await?;
        random_bytes.as_ref().to_vec()
    };
    Ok(secret)
}
