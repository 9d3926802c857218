use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_valid::Garde;
use bingelog_dal::user::{CreateUser, UpdateUser, UserRepository};
use http::StatusCode;

use crate::{auth::token::Identity, error::ApiResult, repository_from_request, state::AppState};

repository_from_request!(UserRepository);

/// Open registration, no token required.
pub async fn register(
    repository: UserRepository,
    Garde(Json(payload)): Garde<Json<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = repository.create(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn profile(
    Identity(user_id): Identity,
    repository: UserRepository,
) -> ApiResult<impl IntoResponse> {
    let user = repository.get(user_id).await?;

    Ok((StatusCode::OK, Json(user)))
}

pub async fn update_profile(
    Identity(user_id): Identity,
    repository: UserRepository,
    Garde(Json(payload)): Garde<Json<UpdateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = repository.update(user_id, payload).await?;

    Ok((StatusCode::OK, Json(user)))
}

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        // unrouted methods on /me answer 405
        .route("/me", get(profile).patch(update_profile))
}
