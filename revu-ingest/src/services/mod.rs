//! Ingestion services
//!
//! Leaf-first: decoder → normalizer → duplicate filter → orchestrator, with
//! the task registry and the analysis client shared across them.

pub mod analysis_client;
pub mod duplicate_filter;
pub mod file_decoder;
pub mod ingestion_orchestrator;
pub mod row_normalizer;
pub mod task_registry;

pub use analysis_client::{rescale_progress, AnalysisClient, AnalysisError};
pub use duplicate_filter::DuplicateFilter;
pub use file_decoder::{decode, DecodeError, FileFormat};
pub use ingestion_orchestrator::{FileError, IngestionOrchestrator};
pub use row_normalizer::{is_steam_format, RowNormalizer, SkipReason};
pub use task_registry::TaskRegistry;
