//! Tables shipped as already tab-separated text
//!
//! A few table files are plain TSV rather than the binary format. They are
//! recognised by their leading `Name\t` column heading.

use crate::codec::decode_utf8;
use crate::error::Result;
use crate::table::header::{Column, TableHeader};
use crate::table::types::{ColumnType, Row, Value};

/// Leading bytes of an already tab-separated table
pub const TAB_SEPARATED_PREFIX: &[u8] = b"Name\t";

pub fn is_tab_separated(data: &[u8]) -> bool {
    data.starts_with(TAB_SEPARATED_PREFIX)
}

/// Parse tab-separated text: the first record names the columns, every later
/// record is a row of string cells
pub fn parse_tab_separated(data: &[u8]) -> Result<(TableHeader, Vec<Row>)> {
    let text = decode_utf8(data);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let names: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Ok((TableHeader::tab_separated(Vec::new(), 0), Vec::new())),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        let row: Row = names
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.as_str(), Value::from(cell)))
            .collect();
        rows.push(row);
    }

    let columns = names
        .into_iter()
        .map(|name| Column::new(ColumnType::String, name))
        .collect();
    Ok((TableHeader::tab_separated(columns, rows.len()), rows))
}
