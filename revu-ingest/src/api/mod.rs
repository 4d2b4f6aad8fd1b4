//! HTTP API handlers for revu-ingest
//!
//! REST upload endpoint plus the SSE progress stream.

pub mod auth;
pub mod health;
pub mod sse;
pub mod upload;

pub use health::health_routes;
pub use sse::{progress_routes, upload_progress_stream};
pub use upload::{upload_reviews, upload_routes};
