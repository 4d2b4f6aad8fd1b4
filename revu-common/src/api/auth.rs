//! Bearer token verification
//!
//! Tokens are HS256 JWTs whose `id` claim carries the numeric user id.
//! The same token may arrive in two places:
//! - `Authorization: Bearer <token>` header (regular API clients)
//! - `?token=<token>` query parameter (browser EventSource clients, which
//!   cannot set custom headers)
//!
//! Both are resolved by [`resolve_bearer_token`] and checked by
//! [`verify_token`], so the two paths can never diverge.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies live here; services adapt these to their
//! own request types.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// Neither header nor query parameter carried a token
    MissingToken,

    /// Token signature, structure or claims were rejected
    InvalidToken(String),

    /// Token was well-formed but its `exp` has passed
    ExpiredToken,

    /// Token could not be signed
    EncodingFailed(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingToken => write!(f, "Missing bearer token"),
            ApiAuthError::InvalidToken(reason) => write!(f, "Invalid token: {}", reason),
            ApiAuthError::ExpiredToken => write!(f, "Token expired"),
            ApiAuthError::EncodingFailed(err) => write!(f, "Token encoding failed: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

// ========================================
// Claims
// ========================================

/// JWT claims understood by Revu services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Authenticated user id
    pub id: i64,

    /// Expiry (Unix seconds)
    pub exp: u64,
}

// ========================================
// Token Resolution
// ========================================

/// Pick the bearer token from the Authorization header, falling back to the
/// query parameter
///
/// A header that is present but not of the `Bearer <token>` form is ignored,
/// so the query parameter still gets a chance.
///
/// # Examples
///
/// ```
/// use revu_common::api::auth::resolve_bearer_token;
///
/// assert_eq!(resolve_bearer_token(Some("Bearer abc"), None), Some("abc"));
/// assert_eq!(resolve_bearer_token(None, Some("xyz")), Some("xyz"));
/// assert_eq!(resolve_bearer_token(Some("Bearer abc"), Some("xyz")), Some("abc"));
/// assert_eq!(resolve_bearer_token(None, None), None);
/// ```
pub fn resolve_bearer_token<'a>(
    authorization: Option<&'a str>,
    query_token: Option<&'a str>,
) -> Option<&'a str> {
    let from_header = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    from_header.or_else(|| query_token.map(str::trim).filter(|token| !token.is_empty()))
}

// ========================================
// Verification
// ========================================

/// Verify an HS256 token and return its claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiAuthError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiAuthError::ExpiredToken,
            _ => ApiAuthError::InvalidToken(e.to_string()),
        })
}

/// Sign a token for `user_id` valid for `ttl_secs` seconds
pub fn issue_token(user_id: i64, secret: &str, ttl_secs: u64) -> Result<String, ApiAuthError> {
    let now = Utc::now().timestamp().max(0) as u64;
    let claims = Claims {
        id: user_id,
        exp: now + ttl_secs,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiAuthError::EncodingFailed(e.to_string()))
}

// ========================================
// Tests
// ========================================
