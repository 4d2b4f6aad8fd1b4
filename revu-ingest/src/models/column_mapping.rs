//! Per-file column mapping supplied with an upload

use serde::{Deserialize, Serialize};

/// Which columns of an uploaded file hold the review text, date and rating
///
/// Blank or absent review/date columns make the mapping incomplete; the
/// orchestrator then skips the whole file with a recorded error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    #[serde(default)]
    pub review_column: String,

    #[serde(default)]
    pub date_column: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_column: Option<String>,
}

impl ColumnMapping {
    pub fn new(
        review_column: impl Into<String>,
        date_column: impl Into<String>,
        rating_column: Option<&str>,
    ) -> Self {
        Self {
            review_column: review_column.into(),
            date_column: date_column.into(),
            rating_column: rating_column.map(str::to_string),
        }
    }

    /// Both required columns are named
    pub fn is_complete(&self) -> bool {
        !self.review_column.trim().is_empty() && !self.date_column.trim().is_empty()
    }

    /// Rating column, ignoring a blank entry
    pub fn rating_column(&self) -> Option<&str> {
        self.rating_column
            .as_deref()
            .filter(|column| !column.trim().is_empty())
    }
}
