//! Decoded rows prior to normalization

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid number pattern")
});

/// Raw cell value as read from an uploaded file
///
/// CSV cells are always `Text`; spreadsheet cells keep their native kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Render the cell as text
    ///
    /// Whole numbers print without a fractional part so that e.g. a numeric
    /// review id column reads "17" rather than "17.0".
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Numeric view of the cell, if it has one
    ///
    /// Text is read by its leading number and trailing junk is ignored, so
    /// `"4.5 stars"` gives 4.5 and `"4/5"` gives 4.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => NUMERIC_PREFIX
                .find(s.trim_start())
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// One decoded data row: header name → cell, in header order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.push((column.into(), value));
    }

    /// Look up a cell; with repeated headers the last one wins
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.iter().any(|(name, _)| name == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_text_rendering() {
        assert_eq!(CellValue::Number(17.0).to_text(), "17");
        assert_eq!(CellValue::Number(4.5).to_text(), "4.5");
        assert_eq!(CellValue::Bool(true).to_text(), "true");
        assert_eq!(CellValue::Empty.to_text(), "");
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(CellValue::from(" 3.5 ").as_number(), Some(3.5));
        assert_eq!(CellValue::from("abc").as_number(), None);
        assert_eq!(CellValue::from("").as_number(), None);
        assert_eq!(CellValue::Bool(true).as_number(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn test_numeric_prefix_of_text() {
        assert_eq!(CellValue::from("4.5 stars").as_number(), Some(4.5));
        assert_eq!(CellValue::from("4/5").as_number(), Some(4.0));
        assert_eq!(CellValue::from("-1.5e1x").as_number(), Some(-15.0));
        assert_eq!(CellValue::from(".5").as_number(), Some(0.5));
        assert_eq!(CellValue::from("3.").as_number(), Some(3.0));
        assert_eq!(CellValue::from("stars: 4").as_number(), None);
        assert_eq!(CellValue::from("-").as_number(), None);
    }

    #[test]
    fn test_repeated_header_last_wins() {
        let row = RawRow::from_pairs([("a", "first"), ("b", "x"), ("a", "second")]);
        assert_eq!(row.get("a"), Some(&CellValue::from("second")));
        assert!(row.has_column("b"));
        assert!(!row.has_column("c"));
    }
}
