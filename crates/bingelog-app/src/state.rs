use std::sync::Arc;

use bingelog_auth::token::TokenManager;
use bingelog_store::FileStore;
use sqlx::Pool;
use url::Url;

use crate::error::Result;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

// Required by axum_valid's `Garde` extractor: garde validations with the
// default `()` context need `FromRef<State> for ()`.
impl axum::extract::FromRef<AppState> for () {
    fn from_ref(_: &AppState) {}
}

impl AppState {
    pub fn new(
        app_config: AppConfig,
        pool: Pool<sqlx::Sqlite>,
        tokens: TokenManager,
        store: FileStore,
    ) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                pool,
                app_config,
                tokens,
                store,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn build_url(&self, relative_url: &str) -> Result<Url> {
        let base = &self.config().base_url;
        let url = base.join(relative_url)?;
        Ok(url)
    }

    pub fn pool(&self) -> &Pool<sqlx::Sqlite> {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }

    pub fn store(&self) -> &FileStore {
        &self.state.store
    }
}

struct AppStateInner {
    pool: Pool<sqlx::Sqlite>,
    app_config: AppConfig,
    tokens: TokenManager,
    store: FileStore,
}

pub struct AppConfig {
    pub base_url: Url,
    pub upload_limit_mb: usize,
}
