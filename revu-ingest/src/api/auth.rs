//! Request authentication
//!
//! Adapts the shared bearer-token functions to axum request parts.

use axum::http::{header, HeaderMap};
use revu_common::api::{resolve_bearer_token, verify_token, ApiAuthError, Claims};

use crate::error::ApiError;

/// Authenticate a request from its `Authorization` header, falling back to
/// a `?token=` query value
pub fn authenticate(
    headers: &HeaderMap,
    query_token: Option<&str>,
    secret: &str,
) -> Result<Claims, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = resolve_bearer_token(authorization, query_token).ok_or(ApiAuthError::MissingToken)?;

    verify_token(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        ApiError::from(e)
    })
}
