use axum::{extract::FromRequestParts, RequestPartsExt};
use axum_extra::TypedHeader;
use bingelog_types::claim::ApiClaim;
use headers::{authorization::Bearer, Authorization};
use http::{request::Parts, StatusCode};
use tracing::debug;

use crate::state::AppState;

impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_token = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .ok()
            .map(|h| h.0.token().to_string());

        match header_token {
            Some(token) => {
                let claim = state.tokens().validate::<ApiClaim>(&token).map_err(|e| {
                    debug!("Failed to validate token: {e}");
                    StatusCode::UNAUTHORIZED
                })?;
                Ok(claim)
            }
            None => {
                debug!("No token found");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

/// Authenticated user id, extracted from the bearer token.
/// Every owner scoped handler takes this as its first argument.
pub struct Identity(pub i64);

impl FromRequestParts<AppState> for Identity {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claim = ApiClaim::from_request_parts(parts, state).await?;
        claim.user_id().map(Identity).ok_or_else(|| {
            debug!("Token subject is not a valid user id");
            StatusCode::UNAUTHORIZED
        })
    }
}
