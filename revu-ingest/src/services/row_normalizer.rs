//! Row normalizer
//!
//! Converts one decoded row plus the user's column mapping into a
//! [`NormalizedRecord`], or a skip decision. Bad data is never fatal: rows
//! without review text or without a usable date are skipped, and an
//! unusable rating falls back to the neutral value.
//!
//! **Date resolution** (first success wins):
//! 1. Native date cell from a spreadsheet
//! 2. Text containing `T` or `-`, parsed as an ISO-like date/time
//! 3. Text containing `YYYY[-/]M[-/]D` anywhere
//! 4. Numeric cell only: `> 25569` is an Excel day count (1899-12-30 base),
//!    `<= 25569` is Unix seconds
//!
//! Text that merely looks numeric (`"20240115"`, `"45000"`) is never read as
//! a serial; such rows are skipped.
//!
//! **Steam ratings:** Steam exports carry `voted_up` and
//! `weighted_vote_score` instead of a star rating. When both columns exist
//! and the mapping points the rating at `voted_up`, the rating is rebuilt as
//! `3 + 2·score` for positive votes and `2·score` otherwise.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{CellValue, ColumnMapping, NormalizedRecord, RawRow};

/// Rating used when the file gives nothing usable
pub const NEUTRAL_RATING: f64 = 3.0;

/// Excel serial number of 1970-01-01
pub const EXCEL_UNIX_EPOCH_SERIAL: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86400.0;

/// Steam vote direction column
pub const STEAM_VOTED_UP_COLUMN: &str = "voted_up";

/// Steam helpfulness score column (0.0 - 1.0)
pub const STEAM_SCORE_COLUMN: &str = "weighted_vote_score";

/// Score assumed when `weighted_vote_score` is unreadable
const STEAM_DEFAULT_SCORE: f64 = 0.5;

static YMD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").expect("valid date pattern"));

/// Why a row was not turned into a record
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("review text is empty")]
    EmptyReview,

    #[error("review date could not be resolved")]
    UnparseableDate,
}

/// A file is Steam-formatted when its first row has both vote columns
pub fn is_steam_format(first_row: &RawRow) -> bool {
    first_row.has_column(STEAM_VOTED_UP_COLUMN) && first_row.has_column(STEAM_SCORE_COLUMN)
}

/// Normalizer bound to one file's mapping
pub struct RowNormalizer<'a> {
    mapping: &'a ColumnMapping,
    product_id: i64,
    steam_format: bool,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(mapping: &'a ColumnMapping, product_id: i64, steam_format: bool) -> Self {
        Self {
            mapping,
            product_id,
            steam_format,
        }
    }

    /// Normalize one row
    pub fn normalize(&self, row: &RawRow) -> Result<NormalizedRecord, SkipReason> {
        let review_text = row
            .get(&self.mapping.review_column)
            .map(|value| value.to_text().trim().to_string())
            .unwrap_or_default();
        if review_text.is_empty() {
            return Err(SkipReason::EmptyReview);
        }

        let review_date = row
            .get(&self.mapping.date_column)
            .and_then(resolve_date)
            .ok_or(SkipReason::UnparseableDate)?;

        let rating = self.resolve_rating(row);

        Ok(NormalizedRecord {
            product_id: self.product_id,
            review_text,
            rating,
            review_date,
            source: None,
        })
    }

    fn resolve_rating(&self, row: &RawRow) -> f64 {
        let rating_column = self.mapping.rating_column();

        if self.steam_format && rating_column == Some(STEAM_VOTED_UP_COLUMN) {
            return steam_rating(row.get(STEAM_VOTED_UP_COLUMN), row.get(STEAM_SCORE_COLUMN));
        }

        rating_column
            .and_then(|column| row.get(column))
            .and_then(CellValue::as_number)
            .filter(|rating| (0.0..=5.0).contains(rating))
            .unwrap_or(NEUTRAL_RATING)
    }
}

/// Rebuild a 0-5 rating from Steam's vote direction and helpfulness score
pub fn steam_rating(voted_up: Option<&CellValue>, weighted_score: Option<&CellValue>) -> f64 {
    let voted_up = voted_up.map(is_positive_vote).unwrap_or(false);
    let score = weighted_score
        .and_then(CellValue::as_number)
        .unwrap_or(STEAM_DEFAULT_SCORE);

    if voted_up {
        3.0 + score * 2.0
    } else {
        score * 2.0
    }
}

fn is_positive_vote(value: &CellValue) -> bool {
    match value {
        CellValue::Bool(b) => *b,
        CellValue::Number(n) => *n == 1.0,
        CellValue::Text(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        _ => false,
    }
}

/// Resolve a raw cell into a timestamp
pub fn resolve_date(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Text(s) => resolve_date_text(s.trim()),
        CellValue::Number(n) => date_from_serial(*n),
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

fn resolve_date_text(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }

    if s.contains('T') || s.contains('-') {
        if let Some(dt) = parse_iso_like(s) {
            return Some(dt);
        }
    }

    extract_ymd(s)
}

fn parse_iso_like(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn extract_ymd(s: &str) -> Option<NaiveDateTime> {
    let caps = YMD_PATTERN.captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

/// Convert a numeric serial into a timestamp
///
/// Values above 25569 are Excel/OLE day counts; anything else is taken as
/// Unix seconds. Resolution is one millisecond.
pub fn date_from_serial(n: f64) -> Option<NaiveDateTime> {
    if !n.is_finite() {
        return None;
    }

    let unix_seconds = if n > EXCEL_UNIX_EPOCH_SERIAL {
        (n - EXCEL_UNIX_EPOCH_SERIAL) * SECONDS_PER_DAY
    } else {
        n
    };

    let millis = (unix_seconds * 1000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }

    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn mapping(rating: Option<&str>) -> ColumnMapping {
        ColumnMapping::new("review", "date", rating)
    }

    // =========================================================================
    // Dates
    // =========================================================================

    #[test]
    fn test_iso_dates() {
        assert_eq!(
            resolve_date(&CellValue::from("2024-03-15")),
            Some(ymd_hms(2024, 3, 15, 0, 0, 0))
        );
        assert_eq!(
            resolve_date(&CellValue::from("2024-03-15T08:30:00")),
            Some(ymd_hms(2024, 3, 15, 8, 30, 0))
        );
        assert_eq!(
            resolve_date(&CellValue::from("2024-03-15 08:30")),
            Some(ymd_hms(2024, 3, 15, 8, 30, 0))
        );
        assert_eq!(
            resolve_date(&CellValue::from("2024-03-15T08:30:00+09:00")),
            Some(ymd_hms(2024, 3, 14, 23, 30, 0))
        );
    }

    #[test]
    fn test_slash_dates_via_pattern() {
        assert_eq!(
            resolve_date(&CellValue::from("2024/3/5")),
            Some(ymd_hms(2024, 3, 5, 0, 0, 0))
        );
        assert_eq!(
            resolve_date(&CellValue::from("posted 2023/12/31 by someone")),
            Some(ymd_hms(2023, 12, 31, 0, 0, 0))
        );
    }

    #[test]
    fn test_impossible_calendar_date_rejected() {
        assert_eq!(resolve_date(&CellValue::from("2024/02/30")), None);
    }

    #[test]
    fn test_native_date_cell() {
        let dt = ymd_hms(2022, 7, 1, 12, 0, 0);
        assert_eq!(resolve_date(&CellValue::DateTime(dt)), Some(dt));
    }

    #[test]
    fn test_excel_serial() {
        // 45000 days after 1899-12-30
        assert_eq!(
            resolve_date(&CellValue::Number(45000.0)),
            Some(ymd_hms(2023, 3, 15, 0, 0, 0))
        );
        assert_eq!(
            resolve_date(&CellValue::Number(45000.5)),
            Some(ymd_hms(2023, 3, 15, 12, 0, 0))
        );
    }

    #[test]
    fn test_small_numbers_are_unix_seconds() {
        assert_eq!(
            resolve_date(&CellValue::Number(25569.0)),
            Some(ymd_hms(1970, 1, 1, 7, 6, 9))
        );
        assert_eq!(
            resolve_date(&CellValue::Number(0.0)),
            Some(ymd_hms(1970, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_numeric_text_is_not_a_serial() {
        for text in ["45000", "20240115", "2024", "12", "-5", "3.5"] {
            assert_eq!(resolve_date(&CellValue::from(text)), None, "text {:?}", text);
        }

        let m = mapping(None);
        let row = RawRow::from_pairs([("review", "compact date"), ("date", "20240115")]);
        assert_eq!(
            RowNormalizer::new(&m, 1, false).normalize(&row),
            Err(SkipReason::UnparseableDate)
        );
    }

    #[test]
    fn test_excel_serial_reparse_is_stable() {
        for serial in [25570.0, 36526.25, 43831.0, 45000.5, 45292.123456] {
            let first = date_from_serial(serial).unwrap();
            let rendered = first.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
            let second = resolve_date(&CellValue::Text(rendered.clone())).unwrap();
            assert_eq!(first, second, "serial {} rendered as {}", serial, rendered);
        }
    }

    #[test]
    fn test_unresolvable_dates() {
        assert_eq!(resolve_date(&CellValue::from("yesterday")), None);
        assert_eq!(resolve_date(&CellValue::from("   ")), None);
        assert_eq!(resolve_date(&CellValue::Empty), None);
        assert_eq!(resolve_date(&CellValue::Bool(true)), None);
        assert_eq!(date_from_serial(f64::INFINITY), None);
        assert_eq!(date_from_serial(1e300), None);
    }

    // =========================================================================
    // Ratings
    // =========================================================================

    #[test]
    fn test_steam_rating_formula() {
        let up = steam_rating(Some(&CellValue::from("true")), Some(&CellValue::from("0.8")));
        let down = steam_rating(Some(&CellValue::from("false")), Some(&CellValue::from("0.8")));
        assert!(approx(up, 4.6), "got {}", up);
        assert!(approx(down, 1.6), "got {}", down);
    }

    #[test]
    fn test_steam_vote_encodings() {
        let score = CellValue::Number(0.5);
        for vote in [
            CellValue::Bool(true),
            CellValue::Number(1.0),
            CellValue::from("1"),
            CellValue::from("True"),
        ] {
            assert!(approx(steam_rating(Some(&vote), Some(&score)), 4.0));
        }
        assert!(approx(steam_rating(Some(&CellValue::from("0")), Some(&score)), 1.0));
        assert!(approx(steam_rating(None, Some(&score)), 1.0));
    }

    #[test]
    fn test_steam_unreadable_score_defaults() {
        let rating = steam_rating(Some(&CellValue::Bool(true)), Some(&CellValue::from("n/a")));
        assert!(approx(rating, 4.0));
    }

    #[test]
    fn test_steam_rating_applies_only_when_mapped() {
        let row = RawRow::from_pairs([
            ("review", "fun"),
            ("date", "2024-01-01"),
            ("voted_up", "true"),
            ("weighted_vote_score", "0.8"),
        ]);

        let steam_mapping = mapping(Some("voted_up"));
        let record = RowNormalizer::new(&steam_mapping, 1, is_steam_format(&row))
            .normalize(&row)
            .unwrap();
        assert!(approx(record.rating, 4.6));

        let plain_mapping = mapping(None);
        let record = RowNormalizer::new(&plain_mapping, 1, true).normalize(&row).unwrap();
        assert_eq!(record.rating, NEUTRAL_RATING);
    }

    #[test]
    fn test_plain_rating_range() {
        let m = mapping(Some("stars"));
        let normalizer = RowNormalizer::new(&m, 9, false);

        let rating_of = |stars: &str| {
            let row = RawRow::from_pairs([("review", "ok"), ("date", "2024-01-01"), ("stars", stars)]);
            normalizer.normalize(&row).unwrap().rating
        };

        assert_eq!(rating_of("4.5"), 4.5);
        assert_eq!(rating_of("4.5 stars"), 4.5);
        assert_eq!(rating_of("4/5"), 4.0);
        assert_eq!(rating_of("0"), 0.0);
        assert_eq!(rating_of("5"), 5.0);
        assert_eq!(rating_of("7"), NEUTRAL_RATING);
        assert_eq!(rating_of("-1"), NEUTRAL_RATING);
        assert_eq!(rating_of("five"), NEUTRAL_RATING);
        assert_eq!(rating_of(""), NEUTRAL_RATING);
    }

    // =========================================================================
    // Rows
    // =========================================================================

    #[test]
    fn test_normalize_trims_and_tags() {
        let m = mapping(None);
        let row = RawRow::from_pairs([("review", "  Great game  "), ("date", "2024-05-01")]);
        let record = RowNormalizer::new(&m, 77, false).normalize(&row).unwrap();

        assert_eq!(record.product_id, 77);
        assert_eq!(record.review_text, "Great game");
        assert_eq!(record.review_day(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(record.source, None);
    }

    #[test]
    fn test_skip_reasons() {
        let m = mapping(None);
        let normalizer = RowNormalizer::new(&m, 1, false);

        let blank = RawRow::from_pairs([("review", "   "), ("date", "2024-05-01")]);
        assert_eq!(normalizer.normalize(&blank), Err(SkipReason::EmptyReview));

        let missing_column = RawRow::from_pairs([("date", "2024-05-01")]);
        assert_eq!(normalizer.normalize(&missing_column), Err(SkipReason::EmptyReview));

        let bad_date = RawRow::from_pairs([("review", "fine"), ("date", "someday")]);
        assert_eq!(normalizer.normalize(&bad_date), Err(SkipReason::UnparseableDate));
    }

    #[test]
    fn test_numeric_review_cell_rendered_as_text() {
        let m = mapping(None);
        let mut row = RawRow::new();
        row.push("review", CellValue::Number(10.0));
        row.push("date", CellValue::Number(45000.0));

        let record = RowNormalizer::new(&m, 1, false).normalize(&row).unwrap();
        assert_eq!(record.review_text, "10");
    }
}
