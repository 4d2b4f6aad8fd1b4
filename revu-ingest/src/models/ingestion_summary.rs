//! Counters for one ingestion run

use serde::Serialize;

/// Aggregate outcome of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSummary {
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub duplicated_count: usize,

    /// Per-file errors, in file order
    pub errors: Vec<String>,
}

impl IngestionSummary {
    pub fn record_file_error(&mut self, file_name: &str, message: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", file_name, message));
    }

    /// Final task message
    pub fn to_message(&self) -> String {
        let mut message = format!(
            "Upload complete ({} inserted, {} skipped, {} duplicates)",
            self.inserted_count, self.skipped_count, self.duplicated_count
        );
        if !self.errors.is_empty() {
            message.push_str(&format!(
                "; {} file error(s): {}",
                self.errors.len(),
                self.errors.join("; ")
            ));
        }
        message
    }
}
