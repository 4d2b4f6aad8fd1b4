//! Test Helper Utilities
//!
//! Shared utilities for testing revu-ingest

#![allow(dead_code)]

pub mod app;
pub mod db_utils;
pub mod fake_analysis;
pub mod log_capture;

// Re-export commonly used items
pub use app::{
    bearer, collect_sse_events, create_test_app, test_config, MultipartBody, TestApp, TEST_SECRET,
};
pub use db_utils::{count_reviews, create_test_db, get_table_columns, has_column};
pub use fake_analysis::{spawn_fake_analysis, FakeAnalysis};
pub use log_capture::{capture_logs, LogCapture};
