//! # untab
//!
//! A Rust library for decoding binary game tables (`.tab.bytes`) into rows of typed cells.
//!
//! ## Overview
//!
//! Table files store a self-describing header followed by LEB128-packed cell values.
//! This library provides:
//!
//! - Header parsing with derived section offsets
//! - Typed value decoding for the 21 column types (ints, scaled floats, decimal
//!   fixed-point, strings, lists, maps, vectors and quaternions)
//! - String pool resolution for deduplicated string columns
//! - Row-major / columnar content detection
//! - Pass-through of tables that are already tab-separated text
//!
//! Decoded rows implement `serde::Serialize` and `Display`, so they can be handed
//! straight to a JSON or TSV writer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use untab::BinaryTable;
//!
//! fn main() -> anyhow::Result<()> {
//!     let data = std::fs::read("Item.tab.bytes")?;
//!     let table = BinaryTable::parse(&data)?;
//!
//!     println!("{}", table.column_names().join("\t"));
//!     for row in table.rows() {
//!         let cells: Vec<String> = row.iter().map(|(_, v)| v.to_string()).collect();
//!         println!("{}", cells.join("\t"));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod table;

pub use codec::ReadTableExt;
pub use error::{Error, Result};
pub use table::{
    load_table, table_summary, BinaryTable, Column, ColumnType, DecodeOptions, Fixed, Layout,
    Row, TableFormat, TableHeader, Value,
};
