use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use tracing::{debug, error};

pub type Error = anyhow::Error;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("Data error: {0}")]
    DataError(#[from] bingelog_dal::Error),
    #[error("Store error: {0}")]
    StoreError(#[from] bingelog_store::error::StoreError),
    #[error("Multipart error: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        use bingelog_dal::Error as DalError;
        use bingelog_store::error::StoreError;
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::InvalidQuery(_)
            | ApiError::MultipartError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DataError(e) => match e {
                DalError::RecordNotFound(_) => StatusCode::NOT_FOUND,
                DalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                DalError::InvalidReference(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::StoreError(e) => match e {
                StoreError::InvalidPath => StatusCode::BAD_REQUEST,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {self}");
        } else {
            debug!("Request failed: {self}");
        }
        // internal details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
