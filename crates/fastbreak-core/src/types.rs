//! Shared data types for provider responses.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tabular result set as returned by the statistics provider.
///
/// The provider answers every endpoint with one or more result sets of the
/// shape `{ headers: [...], rowSet: [[...], ...] }`. Rows are kept as raw
/// JSON values because column types vary by endpoint (and the provider is
/// not above returning `null` where a number is expected).
///
/// This is the opaque payload the cache stores: it round-trips through
/// `serde_json` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Column names, in row order.
    pub headers: Vec<String>,
    /// Row data; each row has one value per header.
    #[serde(rename = "rowSet")]
    pub rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// Creates an empty record set with the given headers.
    #[must_use]
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the set contains no rows.
    ///
    /// An empty result set is how the provider signals "this resource does
    /// not exist"; the façade maps it to a not-found condition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of the named column, if present.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Returns the raw value at (`row`, `column name`).
    #[must_use]
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let col = self.column(name)?;
        self.rows.get(row)?.get(col)
    }

    /// Returns the value at (`row`, `column name`) as an `f64`.
    ///
    /// Integers are widened; anything else (including `null`) is `None`.
    #[must_use]
    pub fn f64_at(&self, row: usize, name: &str) -> Option<f64> {
        self.value(row, name).and_then(Value::as_f64)
    }

    /// Returns the value at (`row`, `column name`) as an `i64`.
    ///
    /// The provider frequently encodes ids as floats (`2544.0`), so float
    /// values with a zero fraction are accepted.
    #[must_use]
    pub fn i64_at(&self, row: usize, name: &str) -> Option<i64> {
        let value = self.value(row, name)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                let f = value.as_f64()?;
                (f.fract() == 0.0).then_some(f as i64)
            }
        }
    }

    /// Returns the value at (`row`, `column name`) as a string slice.
    #[must_use]
    pub fn str_at(&self, row: usize, name: &str) -> Option<&str> {
        self.value(row, name).and_then(Value::as_str)
    }
}

/// Returns the current NBA season in the provider's `"2025-26"` notation.
///
/// Seasons roll over in October; before that, the season that started the
/// previous calendar year is still current.
#[must_use]
pub fn current_season() -> String {
    let today = chrono::Utc::now();
    let start_year = if today.month() >= 10 { today.year() } else { today.year() - 1 };
    format!("{}-{:02}", start_year, (start_year + 1) % 100)
}
