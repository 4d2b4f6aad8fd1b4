//! Review table operations

use chrono::{NaiveDate, NaiveDateTime};
use revu_common::Result;
use sqlx::{Row, SqlitePool};

use crate::models::NormalizedRecord;

/// Storage format for `review_date`; SQLite's `date()` understands it
const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub(crate) fn format_review_date(date: &NaiveDateTime) -> String {
    date.format(REVIEW_DATE_FORMAT).to_string()
}

/// Insert one normalized review, returning its row id
pub async fn insert_review(pool: &SqlitePool, record: &NormalizedRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO reviews (product_id, review_text, rating, review_date, source)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.product_id)
    .bind(&record.review_text)
    .bind(record.rating)
    .bind(format_review_date(&record.review_date))
    .bind(&record.source)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find a review of the same product with identical text on the same calendar day
pub async fn find_same_day_review(
    pool: &SqlitePool,
    product_id: i64,
    review_text: &str,
    review_day: NaiveDate,
) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT review_id FROM reviews
        WHERE product_id = ? AND review_text = ? AND date(review_date) = ?
        LIMIT 1
        "#,
    )
    .bind(product_id)
    .bind(review_text)
    .bind(review_day.format("%Y-%m-%d").to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id,)| id))
}

/// Number of stored reviews for a product
pub async fn count_reviews(pool: &SqlitePool, product_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM reviews WHERE product_id = ?")
        .bind(product_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("count"))
}
