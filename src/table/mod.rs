//! Binary table (`.tab.bytes`) decoder
//!
//! Game tables ship as compact binary files that decode to plain rows of typed
//! cells. Some files are already tab-separated text and are passed through.
//!
//! ## Format Overview
//!
//! A binary table consists of:
//! - `u32` header length, then a header of varints: column types and names,
//!   primary key info, section lengths, row count and an optional opaque magic
//! - Primary key trunk (only when the header declares a primary key)
//! - Row index trunk
//! - Content trunk holding the cell values, row by row
//! - Optional string pool trunk that deduplicates the strings of some columns
//!
//! Variable-length integers are LEB128 where a decoded 0 means "absent". Some
//! content trunks open with a column-major metadata block; the real row start is
//! found heuristically (see [`LayoutDetector`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use untab::table::BinaryTable;
//!
//! let data = std::fs::read("Character.tab.bytes")?;
//! let table = BinaryTable::parse(&data)?;
//!
//! for row in table.rows() {
//!     println!("{:?}", row.get("Id"));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod header;
mod layout;
mod options;
mod pool;
mod reader;
mod tsv;
mod types;
pub mod utils;
mod values;

pub use header::{Column, TableHeader};
pub use layout::{Layout, LayoutDetector};
pub use options::DecodeOptions;
pub use pool::{PoolDisabledReason, PoolStatus, StringPool};
pub use reader::{BinaryTable, TableDecoder, TableFormat};
pub use tsv::{is_tab_separated, parse_tab_separated};
pub use types::*;
pub use utils::{load_table, load_table_with_options, table_summary};
pub use values::ValueReader;
