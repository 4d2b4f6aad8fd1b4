//! Duplicate filter
//!
//! A review is a duplicate when the same product already has a review with
//! identical text on the same calendar day (time of day ignored).
//!
//! Lookups fail open: if the database cannot answer, the row is treated as
//! new and a warning is logged.

use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};

use crate::db::reviews;

/// Same-day duplicate check against stored reviews
#[derive(Clone)]
pub struct DuplicateFilter {
    db: Pool<Sqlite>,
}

impl DuplicateFilter {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Check whether an equivalent review is already stored
    pub async fn is_duplicate(
        &self,
        product_id: i64,
        review_text: &str,
        review_day: NaiveDate,
    ) -> bool {
        match reviews::find_same_day_review(&self.db, product_id, review_text, review_day).await {
            Ok(Some(existing_id)) => {
                tracing::debug!(product_id, existing_id, "Duplicate review found");
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(
                    product_id,
                    error = %e,
                    "Duplicate lookup failed, treating review as new"
                );
                false
            }
        }
    }
}
