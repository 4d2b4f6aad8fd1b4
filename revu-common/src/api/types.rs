//! Shared API request/response types

use serde::{Deserialize, Serialize};

// ========================================
// Authentication Types
// ========================================

/// Optional token query parameter
///
/// EventSource clients cannot set headers, so streaming endpoints accept
/// the bearer token as `?token=`.
///
/// # Examples
///
/// ```
/// // GET /products/1/reviews/upload/progress/task_abc?token=eyJhbGciOi...
/// use revu_common::api::types::TokenQuery;
///
/// let query = TokenQuery {
///     token: Some("eyJhbGciOi...".to_string()),
/// };
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}
