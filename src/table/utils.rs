//! Table file helpers
//!
//! Loading from disk and a human-readable summary of a decoded table.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

use super::{BinaryTable, DecodeOptions, Layout, PoolStatus, TableFormat};

/// Read and decode a table file with default options
pub fn load_table(path: &Path) -> Result<BinaryTable> {
    load_table_with_options(path, DecodeOptions::default())
}

pub fn load_table_with_options(path: &Path, options: DecodeOptions) -> Result<BinaryTable> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    BinaryTable::parse_with_options(&data, options)
        .with_context(|| format!("Failed to decode table {}", path.display()))
}

/// Describe a decoded table: format, header fields, columns, layout and pool
pub fn table_summary(table: &BinaryTable) -> String {
    TableSummary(table).to_string()
}

struct TableSummary<'a>(&'a BinaryTable);

impl fmt::Display for TableSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.0;
        let header = table.header();
        let binary = table.format() == TableFormat::Binary;

        writeln!(f, "Table Info:")?;
        writeln!(f, "  Format: {}", if binary { "binary" } else { "tab-separated" })?;

        if binary {
            writeln!(f, "  Header length: {} bytes", header.header_len)?;
            match &header.primary_key {
                Some(pk) => writeln!(f, "  Primary key: {}", pk)?,
                None if header.has_primary_key => writeln!(f, "  Primary key: <unresolved>")?,
                None => writeln!(f, "  Primary key: none")?,
            }
            if let Some(magic) = header.magic {
                writeln!(f, "  Magic: 0x{:08X}", magic)?;
            }
            writeln!(f, "  Content length: {} bytes", header.content_section_len)?;
        }

        writeln!(f, "  Columns ({}):", header.col_count())?;
        for (i, column) in table.columns().iter().enumerate() {
            writeln!(f, "    {:>3}. {} : {}", i + 1, column.name, column.column_type)?;
        }

        if binary {
            match table.layout() {
                Layout::RowMajor => writeln!(f, "  Layout: row-major")?,
                Layout::Columnar { row_start: Some(start) } => {
                    writeln!(f, "  Layout: columnar, rows start at varint {}", start)?
                }
                Layout::Columnar { row_start: None } => {
                    writeln!(f, "  Layout: columnar, no row start found")?
                }
            }

            let pool = table.pool();
            match pool.status() {
                PoolStatus::Enabled => {
                    let columns: Vec<String> = pool.pooled_columns().map(|c| c.to_string()).collect();
                    writeln!(
                        f,
                        "  String pool: {} strings, columns [{}]",
                        pool.len(),
                        columns.join(", ")
                    )?;
                }
                PoolStatus::Disabled(reason) => writeln!(f, "  String pool: disabled ({})", reason)?,
            }
        }

        writeln!(
            f,
            "  Rows: {} decoded / {} declared",
            table.rows().len(),
            header.row_count
        )
    }
}
