//! Decode configuration

use crate::table::types::Value;

/// Options controlling how rows are pulled out of a table
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Header row counts at or above this are not trusted as a row limit
    pub row_count_ceiling: usize,
    /// Row limit used when the header row count is not trusted
    pub fallback_row_cap: usize,
    /// Consecutive undecodable rows after which decoding stops. A failed read
    /// consumes the rest of the content trunk, so in practice the first failure
    /// of a typed row or a partial trailing `int` row already ends the table.
    pub max_consecutive_failures: usize,
    /// Rows that must already be accepted before an absent `Id` ends the table
    pub padding_min_rows: usize,
    /// Columns whose zero values are written as empty strings
    pub hidden_flag_columns: Vec<String>,
    /// Recognise buffers that are already tab-separated text
    pub detect_tab_separated: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            row_count_ceiling: 1_000_000,
            fallback_row_cap: 100_000,
            max_consecutive_failures: 3,
            padding_min_rows: 3,
            hidden_flag_columns: vec![
                "IsHiddenMode".to_string(),
                "ShowTips".to_string(),
                "IsHidden".to_string(),
            ],
            detect_tab_separated: true,
        }
    }
}

impl DecodeOptions {
    /// Maximum number of rows to produce for a declared row count
    pub fn row_limit(&self, declared_rows: usize) -> usize {
        if declared_rows > 0 && declared_rows < self.row_count_ceiling {
            declared_rows
        } else {
            self.fallback_row_cap
        }
    }

    /// Apply the display rewrite for flag columns: zero becomes `""`
    pub fn normalize_value(&self, column: &str, value: Value) -> Value {
        if value.is_zero() && self.hidden_flag_columns.iter().any(|c| c == column) {
            Value::Str(String::new())
        } else {
            value
        }
    }
}
