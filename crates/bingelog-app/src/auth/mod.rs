use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use bingelog_dal::user::UserRepository;
use bingelog_types::claim::ApiClaim;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub mod token;

#[derive(Debug, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Exchanges email and password for a bearer token.
pub async fn issue_token(
    State(state): State<AppState>,
    repository: UserRepository,
    Json(credentials): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let user = repository
        .check_password(&credentials.email, &credentials.password)
        .await
        .inspect_err(|_| debug!("Login failed for {}", credentials.email))?;

    let claim = ApiClaim::new_expired(user.id);
    let token = state.tokens().issue(claim).map_err(|e| {
        error!("Failed to issue token: {e}");
        ApiError::InternalError("Failed to issue token".into())
    })?;

    Ok((StatusCode::OK, Json(TokenResponse { token })))
}

pub fn auth_router() -> Router<AppState> {
    Router::new().route("/token", post(issue_token))
}
