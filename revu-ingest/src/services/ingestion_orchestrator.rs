//! Ingestion orchestrator
//!
//! Runs one upload end to end in a background task: decode every file,
//! normalize and deduplicate every row, persist new reviews, then
//! optionally hand over to the remote analysis. Nothing is returned to the
//! caller; all outcomes are written to the task registry.
//!
//! **Progress bands:**
//! - 5: started
//! - 5-25: per file, `5 + (i / n) * 20`
//! - 30: files processed
//! - 35-100: remote analysis (see [`super::analysis_client`])
//!
//! Bad rows and bad files never abort the batch. Only the analysis phase can
//! fail a task.

use revu_common::events::TaskStatus;
use sqlx::SqlitePool;
use thiserror::Error;

use super::analysis_client::{AnalysisClient, ANALYSIS_PHASE_START};
use super::duplicate_filter::DuplicateFilter;
use super::file_decoder::{self, DecodeError, FileFormat};
use super::row_normalizer::{is_steam_format, RowNormalizer};
use super::task_registry::TaskRegistry;
use crate::db::reviews;
use crate::models::{ColumnMapping, IngestionSummary, UploadedFile};

/// Progress reported as soon as the task starts
pub const PROGRESS_STARTED: u8 = 5;

/// Width of the per-file progress band
const FILE_PHASE_SPAN: f64 = 20.0;

/// Progress once every file has been processed
pub const PROGRESS_FILES_DONE: u8 = 30;

/// Why a whole file was skipped
#[derive(Debug, Error)]
pub enum FileError {
    #[error("no column mapping provided")]
    MissingMapping,

    #[error("column mapping must name both the review and the date column")]
    IncompleteMapping,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("file contains no data rows")]
    NoRows,

    #[error("decoder task failed: {0}")]
    DecoderTask(String),
}

/// Task progress at the start of file `index` out of `total`
pub fn file_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_STARTED;
    }
    let fraction = index as f64 / total as f64;
    (f64::from(PROGRESS_STARTED) + fraction * FILE_PHASE_SPAN).round() as u8
}

/// Drives uploads through decode, normalize, dedupe, persist and analysis
#[derive(Clone)]
pub struct IngestionOrchestrator {
    db: SqlitePool,
    registry: TaskRegistry,
    duplicates: DuplicateFilter,
    analysis: AnalysisClient,
}

impl IngestionOrchestrator {
    pub fn new(db: SqlitePool, registry: TaskRegistry, analysis: AnalysisClient) -> Self {
        Self {
            duplicates: DuplicateFilter::new(db.clone()),
            db,
            registry,
            analysis,
        }
    }

    /// Process one upload; all results go through the task registry
    pub async fn process_upload(
        &self,
        task_id: &str,
        product_id: i64,
        files: Vec<UploadedFile>,
        mappings: Vec<ColumnMapping>,
        auto_analyze: bool,
    ) {
        let summary = self.ingest_files(task_id, product_id, &files, &mappings).await;

        tracing::info!(
            task_id = %task_id,
            product_id,
            inserted = summary.inserted_count,
            skipped = summary.skipped_count,
            duplicates = summary.duplicated_count,
            file_errors = summary.errors.len(),
            "File ingestion finished"
        );

        if !auto_analyze || summary.inserted_count == 0 {
            self.registry.complete(task_id, summary.to_message()).await;
            return;
        }

        self.registry
            .update(
                task_id,
                ANALYSIS_PHASE_START,
                "Analysis started...",
                TaskStatus::Processing,
            )
            .await;

        if let Err(e) = self
            .analysis
            .relay_analysis(&self.registry, task_id, product_id)
            .await
        {
            tracing::error!(task_id = %task_id, product_id, error = %e, "Remote analysis failed");
            self.registry
                .error(task_id, format!("Analysis failed: {}", e))
                .await;
        }
    }

    /// Ingestion phase only: files in, counts out
    ///
    /// Reports progress 5 through 30 on `task_id` and leaves the task in
    /// `processing`.
    pub async fn ingest_files(
        &self,
        task_id: &str,
        product_id: i64,
        files: &[UploadedFile],
        mappings: &[ColumnMapping],
    ) -> IngestionSummary {
        let mut summary = IngestionSummary::default();
        let total = files.len();

        self.registry
            .update(
                task_id,
                PROGRESS_STARTED,
                "Processing files...",
                TaskStatus::Processing,
            )
            .await;

        for (index, file) in files.iter().enumerate() {
            self.registry
                .update(
                    task_id,
                    file_progress(index, total),
                    format!("Processing {} ({}/{})", file.file_name, index + 1, total),
                    TaskStatus::Processing,
                )
                .await;

            if let Err(e) = self
                .ingest_file(product_id, file, mappings.get(index), &mut summary)
                .await
            {
                tracing::warn!(
                    task_id = %task_id,
                    file = %file.file_name,
                    error = %e,
                    "File skipped"
                );
                summary.record_file_error(&file.file_name, &e);
            }
        }

        self.registry
            .update(
                task_id,
                PROGRESS_FILES_DONE,
                format!(
                    "File processing finished ({} inserted)",
                    summary.inserted_count
                ),
                TaskStatus::Processing,
            )
            .await;

        summary
    }

    async fn ingest_file(
        &self,
        product_id: i64,
        file: &UploadedFile,
        mapping: Option<&ColumnMapping>,
        summary: &mut IngestionSummary,
    ) -> Result<(), FileError> {
        let mapping = mapping.ok_or(FileError::MissingMapping)?;
        if !mapping.is_complete() {
            return Err(FileError::IncompleteMapping);
        }

        let format = FileFormat::from_file_name(&file.file_name)?;
        let data = file.data.clone();
        let rows = tokio::task::spawn_blocking(move || file_decoder::decode(&data, format))
            .await
            .map_err(|e| FileError::DecoderTask(e.to_string()))??;

        let Some(first_row) = rows.first() else {
            return Err(FileError::NoRows);
        };

        let steam_format = is_steam_format(first_row);
        tracing::debug!(
            file = %file.file_name,
            rows = rows.len(),
            steam_format,
            "File decoded"
        );

        let normalizer = RowNormalizer::new(mapping, product_id, steam_format);

        for (index, row) in rows.iter().enumerate() {
            let record = match normalizer.normalize(row) {
                Ok(record) => record,
                Err(reason) => {
                    tracing::debug!(file = %file.file_name, row = index + 1, reason = %reason, "Row skipped");
                    summary.skipped_count += 1;
                    continue;
                }
            };

            if self
                .duplicates
                .is_duplicate(record.product_id, &record.review_text, record.review_day())
                .await
            {
                summary.duplicated_count += 1;
                continue;
            }

            match reviews::insert_review(&self.db, &record).await {
                Ok(_) => summary.inserted_count += 1,
                Err(e) => {
                    tracing::warn!(
                        file = %file.file_name,
                        row = index + 1,
                        error = %e,
                        "Review insert failed, row skipped"
                    );
                    summary.skipped_count += 1;
                }
            }
        }

        Ok(())
    }
}
