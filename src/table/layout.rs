//! Row-major / column-major layout detection
//!
//! The content trunk carries no layout flag. Some tables store plain rows; others
//! open with a column-major metadata block of unknown length before the real rows.
//! Both cases are told apart, and the real row start located, from the decoded
//! varint stream alone.
//!
//! This is a heuristic fitted to observed files, not a rule of the format. The
//! thresholds below are kept exactly as observed so results stay comparable.

use std::ops::Range;
use tracing::{debug, warn};

use crate::table::header::TableHeader;

/// Values at or above this are treated as metadata sentinels
pub const LARGE_VALUE_THRESHOLD: u64 = 10_000_000;

/// Plausible primary key values in a real row
pub const ID_RANGE: Range<u64> = 1_000_000..4_000_000_000;

/// Consecutive plausible windows required to accept a row start
pub const VALID_RUN_LENGTH: usize = 10;

/// Candidate row starts examined before giving up
pub const MAX_ROW_START_CANDIDATES: usize = 10_000;

/// How rows are arranged in the content trunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    RowMajor,
    /// `row_start` is the varint index where rows begin, `None` when the
    /// heuristic found no plausible start (decoding then starts at 0)
    Columnar { row_start: Option<usize> },
}

impl Layout {
    pub fn is_columnar(&self) -> bool {
        matches!(self, Layout::Columnar { .. })
    }

    /// Number of leading varints to skip before the first row
    pub fn row_start(&self) -> usize {
        match self {
            Layout::RowMajor => 0,
            Layout::Columnar { row_start } => row_start.unwrap_or(0),
        }
    }
}

/// Classifies a content trunk from its decoded varints
#[derive(Debug, Clone)]
pub struct LayoutDetector {
    col_count: usize,
    id_column: Option<usize>,
    neighbor_column: Option<usize>,
}

impl LayoutDetector {
    /// Detector for a parsed header. The id column is the declared primary key,
    /// else a column named `Id`.
    pub fn new(header: &TableHeader) -> Self {
        let id_column = header
            .primary_key_column()
            .or_else(|| header.column_index("Id"));
        Self::with_columns(header.col_count(), id_column)
    }

    pub fn with_columns(col_count: usize, id_column: Option<usize>) -> Self {
        let id_column = id_column.filter(|&c| c < col_count);
        let neighbor_column = id_column.and_then(|c| {
            if c + 1 < col_count {
                Some(c + 1)
            } else {
                c.checked_sub(1)
            }
        });
        Self { col_count, id_column, neighbor_column }
    }

    /// Whether the first row's worth of varints looks like columnar metadata
    pub fn is_columnar(&self, values: &[Option<u64>]) -> bool {
        if self.col_count == 0 || values.len() < self.col_count {
            return false;
        }
        let large = values[..self.col_count]
            .iter()
            .filter(|v| v.is_some_and(|v| v >= LARGE_VALUE_THRESHOLD))
            .count();
        // A single-column table needs its one value to be large
        large >= (self.col_count - 1).max(1)
    }

    fn window_is_plausible(&self, window: &[Option<u64>]) -> bool {
        let Some(id_column) = self.id_column else {
            return false;
        };
        let id_ok = window[id_column].is_some_and(|id| ID_RANGE.contains(&id));
        let neighbor_ok = match self.neighbor_column {
            // An absent value is zero
            Some(n) => window[n].map_or(true, |v| v < LARGE_VALUE_THRESHOLD),
            None => true,
        };
        id_ok && neighbor_ok
    }

    /// Find the varint index where real rows begin in a columnar trunk
    pub fn find_row_start(&self, values: &[Option<u64>]) -> Option<usize> {
        self.id_column?;
        if self.col_count == 0 {
            return None;
        }

        let last_start = values.len().saturating_sub(self.col_count);
        (0..MAX_ROW_START_CANDIDATES)
            .map(|candidate| candidate * self.col_count)
            .take_while(|&start| start < last_start)
            .find(|&start| {
                (0..VALID_RUN_LENGTH).all(|i| {
                    let from = start + i * self.col_count;
                    values
                        .get(from..from + self.col_count)
                        .is_some_and(|window| self.window_is_plausible(window))
                })
            })
    }

    pub fn detect(&self, values: &[Option<u64>]) -> Layout {
        if !self.is_columnar(values) {
            debug!("content classified as row-major");
            return Layout::RowMajor;
        }

        let row_start = self.find_row_start(values);
        match row_start {
            Some(start) => debug!(start, "columnar content, rows start at varint {}", start),
            None => warn!("columnar content but no plausible row start found, decoding from 0"),
        }
        Layout::Columnar { row_start }
    }
}
