//! API module for shared HTTP API functionality
//!
//! Provides bearer token handling and shared types used across Revu services.
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! Each service wraps these with framework-specific extraction (Axum, etc.).

pub mod auth;
pub mod types;

pub use auth::{issue_token, resolve_bearer_token, verify_token, ApiAuthError, Claims};
pub use types::TokenQuery;
