pub mod character;
pub mod filters;
pub mod series;
pub mod tag;

/// Query for label listings, `?assigned_only=1` narrows the listing to
/// labels linked to at least one series.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AssignedQuery {
    assigned_only: Option<u8>,
}

impl AssignedQuery {
    pub fn assigned_only(&self) -> bool {
        self.assigned_only.unwrap_or(0) != 0
    }
}

#[macro_export]
macro_rules! label_api {
    ($entity:ty, $create:ty, $repository:ty) => {
        $crate::repository_from_request!($repository);

        pub mod label_api {
            use super::*;
            use axum::{
                extract::{Path, Query},
                response::IntoResponse,
                Json,
            };
            use axum_valid::Garde;
            use http::StatusCode;

            use $crate::auth::token::Identity;
            use $crate::error::ApiResult;
            use $crate::rest_api::AssignedQuery;

            pub async fn list(
                Identity(owner): Identity,
                repository: $repository,
                Query(query): Query<AssignedQuery>,
            ) -> ApiResult<impl IntoResponse> {
                let records = repository.list(owner, query.assigned_only()).await?;

                Ok((StatusCode::OK, Json(records)))
            }

            pub async fn create(
                Identity(owner): Identity,
                repository: $repository,
                Garde(Json(payload)): Garde<Json<$create>>,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.create(owner, payload).await?;

                Ok((StatusCode::CREATED, Json(record)))
            }

            pub async fn get(
                Identity(owner): Identity,
                Path(id): Path<i64>,
                repository: $repository,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.get(owner, id).await?;

                Ok((StatusCode::OK, Json(record)))
            }

            pub async fn update(
                Identity(owner): Identity,
                Path(id): Path<i64>,
                repository: $repository,
                Garde(Json(payload)): Garde<Json<$create>>,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.update(owner, id, payload).await?;

                Ok((StatusCode::OK, Json(record)))
            }
        }

        pub fn router() -> axum::Router<$crate::state::AppState> {
            use axum::routing::get;
            axum::Router::new()
                .route("/", get(label_api::list).post(label_api::create))
                .route("/{id}", get(label_api::get).put(label_api::update))
        }
    };
}
