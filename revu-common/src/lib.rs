//! # Revu Common Library
//!
//! Shared code for the Revu review services including:
//! - Error types
//! - Bearer token verification
//! - Progress and analysis event types
//! - Configuration file loading

pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
