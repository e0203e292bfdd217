//! Table header parsing

use std::io::Cursor;
use std::ops::Range;
use tracing::debug;

use crate::codec::ReadTableExt;
use crate::error::{Error, Result};
use crate::table::types::ColumnType;

/// Size of the fixed `header_len` prefix
pub const HEADER_LENGTH_PREFIX: usize = 4;

/// Number of leading bytes checked when rejecting a zeroed file
const ZEROED_PROBE_LEN: usize = 100;

/// A declared column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub column_type: ColumnType,
    pub name: String,
}

impl Column {
    pub fn new(column_type: ColumnType, name: impl Into<String>) -> Self {
        Self { column_type, name: name.into() }
    }
}

/// Parsed table header plus the section lengths it declares
#[derive(Debug, Clone)]
pub struct TableHeader {
    /// Length of the header body following the `u32` prefix
    pub header_len: u32,
    pub columns: Vec<Column>,
    pub has_primary_key: bool,
    /// Declared primary key column index (0 when the varint was absent)
    pub primary_key_index: Option<usize>,
    /// Name of the primary key column, when the index resolves
    pub primary_key: Option<String>,
    pub primary_key_section_len: usize,
    pub row_index_section_len: usize,
    pub row_count: usize,
    pub content_section_len: usize,
    /// Opaque trailing value; captured as-is, never interpreted
    pub magic: Option<u32>,
}

fn read_length(cursor: &mut Cursor<&[u8]>, field: &str) -> Result<usize> {
    let value = cursor.read_sleb128()?.unwrap_or(0);
    usize::try_from(value)
        .map_err(|_| Error::InvalidHeader(format!("{} is negative ({})", field, value)))
}

impl TableHeader {
    /// Parse the header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() > ZEROED_PROBE_LEN && data[..ZEROED_PROBE_LEN].iter().all(|&b| b == 0) {
            return Err(Error::InvalidHeader("table is empty or zeroed".into()));
        }

        let mut cursor = Cursor::new(data);

        // The only fixed-width length in the header
        let header_len = cursor.read_u32_le()?;
        let header_end = HEADER_LENGTH_PREFIX as u64 + u64::from(header_len);
        if header_end > data.len() as u64 {
            return Err(Error::InvalidHeader(format!(
                "declared header length {} exceeds buffer of {} bytes",
                header_len,
                data.len()
            )));
        }

        let col_count = read_length(&mut cursor, "column count")?;
        let mut columns = Vec::with_capacity(col_count.min(data.len()));
        for i in 0..col_count {
            let type_id = cursor.read_sleb128()?.unwrap_or(0);
            let column_type = ColumnType::try_from(type_id).map_err(|_| {
                Error::InvalidHeader(format!("column {} declares unknown type id {}", i, type_id))
            })?;
            let name = cursor.read_cstring()?;
            columns.push(Column { column_type, name });
        }

        // Only an exact 1 marks a primary key
        let has_primary_key = cursor.read_byte()? == 1;

        let mut primary_key_index = None;
        let mut primary_key = None;
        let mut primary_key_section_len = 0;
        if has_primary_key {
            let index = cursor.read_sleb128()?.unwrap_or(0);
            match usize::try_from(index).ok().filter(|&i| i < columns.len()) {
                Some(i) => {
                    primary_key_index = Some(i);
                    primary_key = Some(columns[i].name.clone());
                }
                None => debug!("primary key index {} does not name a column", index),
            }
            primary_key_section_len = read_length(&mut cursor, "primary key section length")?;
        }

        let row_index_section_len = read_length(&mut cursor, "row section length")?;
        let row_count = read_length(&mut cursor, "row count")?;
        let content_section_len = read_length(&mut cursor, "content section length")?;

        let position = cursor.position();
        if position > header_end {
            return Err(Error::InvalidHeader(format!(
                "header fields end at {} past declared end {}",
                position, header_end
            )));
        }

        let magic = if header_end - position >= 4 {
            Some(cursor.read_u32_le()?)
        } else {
            None
        };

        let header = TableHeader {
            header_len,
            columns,
            has_primary_key,
            primary_key_index,
            primary_key,
            primary_key_section_len,
            row_index_section_len,
            row_count,
            content_section_len,
            magic,
        };

        debug!(
            columns = header.columns.len(),
            rows = header.row_count,
            content_len = header.content_section_len,
            has_pk = header.has_primary_key,
            "parsed table header"
        );

        Ok(header)
    }

    /// Header for a table that arrived already tab-separated
    pub(crate) fn tab_separated(columns: Vec<Column>, row_count: usize) -> Self {
        TableHeader {
            header_len: 0,
            columns,
            has_primary_key: false,
            primary_key_index: None,
            primary_key: None,
            primary_key_section_len: 0,
            row_index_section_len: 0,
            row_count,
            content_section_len: 0,
            magic: None,
        }
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of the declared primary key column, if it resolved
    pub fn primary_key_column(&self) -> Option<usize> {
        if self.has_primary_key {
            self.primary_key_index
        } else {
            None
        }
    }

    /// Start of the index trunk (end of the header)
    pub fn index_trunk_offset(&self) -> usize {
        HEADER_LENGTH_PREFIX + self.header_len as usize
    }

    pub fn after_primary_key_offset(&self) -> usize {
        let offset = self.index_trunk_offset();
        if self.has_primary_key {
            offset + self.primary_key_section_len
        } else {
            offset
        }
    }

    pub fn content_offset(&self) -> usize {
        self.after_primary_key_offset() + self.row_index_section_len
    }

    /// Start of the optional string pool trunk
    pub fn pool_offset(&self) -> usize {
        self.content_offset() + self.content_section_len
    }

    /// Byte range of the content trunk, clamped to `data_len`
    pub fn content_range(&self, data_len: usize) -> Range<usize> {
        let start = self.content_offset().min(data_len);
        let end = self.pool_offset().min(data_len);
        start..end
    }
}
