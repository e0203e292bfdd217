//! Deduplicated string pool
//!
//! Tables may move the strings of selected columns into a trailing pool. The
//! pool trunk starts right after the content trunk:
//!
//! ```text
//! u32     pool_header_len
//! varint  column_size          number of pooled columns
//! varint  string_pool_size     number of pooled strings
//! varint  column_len           byte length of the pooled-column list
//! varint  offset_trunk_len     byte length of the offset table
//! ... padding up to 4 + pool_header_len ...
//! varint[column_size]          pooled column indices (0-based)
//! varint[string_pool_size]     cumulative end offsets into the content area
//! bytes                        pool content
//! ```
//!
//! A pool whose sizes fail the sanity bounds is dropped. Columns that would have
//! used it are then read as inline strings.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::codec::{decode_utf8, ReadTableExt};
use crate::error::Error;

pub const MAX_POOL_HEADER_LEN: u32 = 10_000;
pub const MAX_POOL_COLUMNS: i64 = 100;
pub const MAX_POOL_STRINGS: i64 = 100_000;
pub const MAX_POOL_COLUMN_LEN: i64 = 10_000;
pub const MAX_POOL_OFFSET_TRUNK_LEN: i64 = 100_000;

/// Why a pool was not used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolDisabledReason {
    /// No bytes follow the content trunk
    Absent,
    HeaderLength(u32),
    ColumnSize(i64),
    StringCount(i64),
    ColumnLength(i64),
    OffsetTrunkLength(i64),
    /// The pool header itself ran past the buffer
    Truncated,
}

impl fmt::Display for PoolDisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolDisabledReason::Absent => write!(f, "no pool trunk"),
            PoolDisabledReason::HeaderLength(v) => write!(f, "pool header length {} out of bounds", v),
            PoolDisabledReason::ColumnSize(v) => write!(f, "pooled column count {} out of bounds", v),
            PoolDisabledReason::StringCount(v) => write!(f, "pooled string count {} out of bounds", v),
            PoolDisabledReason::ColumnLength(v) => write!(f, "column list length {} out of bounds", v),
            PoolDisabledReason::OffsetTrunkLength(v) => {
                write!(f, "offset trunk length {} out of bounds", v)
            }
            PoolDisabledReason::Truncated => write!(f, "pool header truncated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolStatus {
    Enabled,
    Disabled(PoolDisabledReason),
}

/// String pool owned by a single table decode
#[derive(Debug, Clone)]
pub struct StringPool {
    status: PoolStatus,
    /// 1-based column slots (pooled index + 1)
    pooled_columns: BTreeSet<usize>,
    /// Cumulative end offsets into `content`; `None` for a negative entry
    offsets: Vec<Option<usize>>,
    content: Vec<u8>,
}

fn bounded(value: i64, max: i64, reason: fn(i64) -> PoolDisabledReason) -> Result<usize, PoolDisabledReason> {
    if value < 0 || value > max {
        return Err(reason(value));
    }
    Ok(value as usize)
}

impl StringPool {
    pub fn disabled(reason: PoolDisabledReason) -> Self {
        StringPool {
            status: PoolStatus::Disabled(reason),
            pooled_columns: BTreeSet::new(),
            offsets: Vec::new(),
            content: Vec::new(),
        }
    }

    /// Read the pool trunk at `pool_start`. Never fails: an unusable pool is
    /// returned disabled.
    pub fn parse(data: &[u8], pool_start: usize) -> Self {
        match Self::try_parse(data, pool_start) {
            Ok(pool) => {
                debug!(
                    columns = pool.pooled_columns.len(),
                    strings = pool.offsets.len(),
                    "string pool enabled"
                );
                pool
            }
            Err(PoolDisabledReason::Absent) => Self::disabled(PoolDisabledReason::Absent),
            Err(reason) => {
                warn!("string pool disabled: {}", reason);
                Self::disabled(reason)
            }
        }
    }

    fn try_parse(data: &[u8], pool_start: usize) -> Result<Self, PoolDisabledReason> {
        if pool_start >= data.len() {
            return Err(PoolDisabledReason::Absent);
        }

        let mut cursor = Cursor::new(data);
        cursor.set_position(pool_start as u64);

        let truncated = |_: Error| PoolDisabledReason::Truncated;

        let header_len = cursor.read_u32_le().map_err(truncated)?;
        if header_len == 0 || header_len > MAX_POOL_HEADER_LEN {
            return Err(PoolDisabledReason::HeaderLength(header_len));
        }

        let column_size = cursor.read_sleb128().map_err(truncated)?.unwrap_or(0);
        if column_size <= 0 {
            return Err(PoolDisabledReason::ColumnSize(column_size));
        }
        let column_size = bounded(column_size, MAX_POOL_COLUMNS, PoolDisabledReason::ColumnSize)?;

        let string_count = cursor.read_sleb128().map_err(truncated)?.unwrap_or(0);
        let column_len = cursor.read_sleb128().map_err(truncated)?.unwrap_or(0);
        let offset_trunk_len = cursor.read_sleb128().map_err(truncated)?.unwrap_or(0);

        let string_count = bounded(string_count, MAX_POOL_STRINGS, PoolDisabledReason::StringCount)?;
        let column_len = bounded(column_len, MAX_POOL_COLUMN_LEN, PoolDisabledReason::ColumnLength)?;
        let offset_trunk_len = bounded(
            offset_trunk_len,
            MAX_POOL_OFFSET_TRUNK_LEN,
            PoolDisabledReason::OffsetTrunkLength,
        )?;

        let column_list_start = pool_start + 4 + header_len as usize;
        let offsets_start = column_list_start + column_len;
        let content_start = offsets_start + offset_trunk_len;

        cursor.set_position(column_list_start as u64);
        let mut pooled_columns = BTreeSet::new();
        for i in 0..column_size {
            match cursor.read_sleb128() {
                Ok(index) => {
                    let index = index.unwrap_or(0);
                    if let Ok(index) = usize::try_from(index) {
                        pooled_columns.insert(index + 1);
                    }
                }
                Err(_) => {
                    warn!("string pool column list ends after {} of {} entries", i, column_size);
                    break;
                }
            }
        }

        cursor.set_position(offsets_start as u64);
        let mut offsets = Vec::with_capacity(string_count);
        for i in 0..string_count {
            match cursor.read_sleb128() {
                Ok(offset) => {
                    let offset = offset.unwrap_or(0);
                    let end = usize::try_from(offset).ok();
                    if end.is_none() {
                        warn!("string pool offset {} is negative ({})", i, offset);
                    }
                    offsets.push(end);
                }
                Err(_) => {
                    warn!("string pool offset table ends after {} of {} entries", i, string_count);
                    break;
                }
            }
        }

        let content = data.get(content_start..).unwrap_or_default().to_vec();

        Ok(StringPool {
            status: PoolStatus::Enabled,
            pooled_columns,
            offsets,
            content,
        })
    }

    pub fn status(&self) -> &PoolStatus {
        &self.status
    }

    pub fn is_enabled(&self) -> bool {
        self.status == PoolStatus::Enabled
    }

    /// Whether the 1-based column slot reads its strings from the pool
    pub fn is_pooled_column(&self, column: usize) -> bool {
        self.is_enabled() && self.pooled_columns.contains(&column)
    }

    /// Pooled 1-based column slots, ascending
    pub fn pooled_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.pooled_columns.iter().copied()
    }

    /// Number of pooled strings
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Resolve a pooled string. The span `[offsets[i-1] or 0, offsets[i])` is cut
    /// at its first NUL. A span bounded by a negative offset resolves to `None`.
    pub fn resolve(&self, index: i64) -> Option<String> {
        let index = usize::try_from(index).ok()?;
        let end = (*self.offsets.get(index)?)?;
        let start = if index == 0 { 0 } else { self.offsets[index - 1]? };

        let bytes = self.content.get(start..end)?;
        let bytes = match bytes.iter().position(|&b| b == 0) {
            Some(nul) => &bytes[..nul],
            None => bytes,
        };
        Some(decode_utf8(bytes))
    }
}
