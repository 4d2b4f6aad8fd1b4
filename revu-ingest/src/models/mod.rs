//! Data models for revu-ingest
//!
//! - Upload task state tracked by the registry
//! - Column mappings and decoded rows fed to the normalizer
//! - Normalized review records and run summaries

pub mod column_mapping;
pub mod ingestion_summary;
pub mod raw_row;
pub mod review;
pub mod upload_task;

pub use column_mapping::ColumnMapping;
pub use ingestion_summary::IngestionSummary;
pub use raw_row::{CellValue, RawRow};
pub use review::NormalizedRecord;
pub use upload_task::UploadTask;

use bytes::Bytes;

/// File received in an upload request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side file name; its extension selects the decoder
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}
