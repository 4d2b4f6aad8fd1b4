//! Canonical review record

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Review ready to be persisted
///
/// Produced by the row normalizer and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub product_id: i64,

    /// Trimmed, never empty
    pub review_text: String,

    /// Usually 0.0 - 5.0; 3.0 when the file gives nothing usable
    pub rating: f64,

    pub review_date: NaiveDateTime,

    /// Provenance tag, left for the caller to set
    pub source: Option<String>,
}

impl NormalizedRecord {
    /// Calendar day used for duplicate detection
    pub fn review_day(&self) -> NaiveDate {
        self.review_date.date()
    }
}
