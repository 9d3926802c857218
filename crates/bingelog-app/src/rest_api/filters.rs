use crate::error::{ApiError, ApiResult};

/// Parses a comma separated id list from a query parameter, e.g. `tags=1,2,3`.
pub(super) fn parse_id_list(raw: &str) -> ApiResult<Vec<i64>> {
    if raw.len() > 1000 {
        return Err(ApiError::InvalidQuery("Id list too long".to_string()));
    }

    raw.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::InvalidQuery(format!("Invalid id: {token}")))
        })
        .collect::<Result<Vec<_>, _>>()
}
