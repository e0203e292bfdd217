//! Table decoding: header, pool, layout, then rows

use std::io::Cursor;
use tracing::{debug, warn};

use crate::codec::{remap_signed, ReadTableExt};
use crate::error::{Error, Result};
use crate::table::header::{Column, TableHeader};
use crate::table::layout::{Layout, LayoutDetector};
use crate::table::options::DecodeOptions;
use crate::table::pool::{PoolDisabledReason, StringPool};
use crate::table::tsv::{is_tab_separated, parse_tab_separated};
use crate::table::types::{ColumnType, Row, Value};
use crate::table::values::ValueReader;

/// Name of the column checked for end-of-data padding
const ID_COLUMN: &str = "Id";

/// Source format of a decoded table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Binary,
    TabSeparated,
}

/// What the row loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Accepts or rejects decoded rows and decides when to stop
struct RowCollector<'o> {
    options: &'o DecodeOptions,
    limit: usize,
    check_id_padding: bool,
    rows: Vec<Row>,
    consecutive_failures: usize,
}

impl<'o> RowCollector<'o> {
    fn new(options: &'o DecodeOptions, header: &TableHeader) -> Self {
        let limit = options.row_limit(header.row_count);
        Self {
            options,
            limit,
            check_id_padding: header.has_primary_key && header.has_column(ID_COLUMN),
            rows: Vec::with_capacity(limit.min(4096)),
            consecutive_failures: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.rows.len() >= self.limit
    }

    fn accept(&mut self, row: Row) -> Flow {
        if self.check_id_padding
            && self.rows.len() >= self.options.padding_min_rows
            && row.get(ID_COLUMN).map_or(false, Value::is_null)
        {
            debug!(rows = self.rows.len(), "absent Id, treating the rest as padding");
            return Flow::Stop;
        }

        self.rows.push(row);
        self.consecutive_failures = 0;
        if self.is_full() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn reject(&mut self, err: &Error) -> Flow {
        self.consecutive_failures += 1;
        debug!(
            row = self.rows.len(),
            failures = self.consecutive_failures,
            "discarding undecodable row: {}",
            err
        );
        if self.consecutive_failures >= self.options.max_consecutive_failures {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn finish(self) -> Vec<Row> {
        self.rows
    }
}

/// Decodes one binary table buffer
///
/// The header and string pool are read on construction; rows are decoded by
/// [`TableDecoder::decode_rows`] or [`TableDecoder::finish`].
pub struct TableDecoder<'a> {
    data: &'a [u8],
    header: TableHeader,
    pool: StringPool,
    options: DecodeOptions,
}

impl<'a> TableDecoder<'a> {
    pub fn new(data: &'a [u8], options: DecodeOptions) -> Result<Self> {
        let header = TableHeader::parse(data)?;

        let content = header.content_offset() as u64 + header.content_section_len as u64;
        if content > data.len() as u64 {
            warn!(
                "content trunk ends at {} but buffer has {} bytes",
                content,
                data.len()
            );
        }

        let pool = StringPool::parse(data, header.pool_offset());
        Ok(Self { data, header, pool, options })
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    /// Content trunk bytes, clamped to the buffer
    pub fn content(&self) -> &'a [u8] {
        let data = self.data;
        &data[self.header.content_range(data.len())]
    }

    fn content_varints(&self) -> Vec<Option<u64>> {
        Cursor::new(self.content()).read_all_varints()
    }

    pub fn detect_layout(&self) -> Layout {
        LayoutDetector::new(&self.header).detect(&self.content_varints())
    }

    /// Every column is a plain `int` and no string pool is in play
    fn is_all_int(&self) -> bool {
        !self.pool.is_enabled()
            && self
                .header
                .columns
                .iter()
                .all(|c| c.column_type == ColumnType::Int)
    }

    /// Decode rows using a previously detected layout
    pub fn decode_rows(&self, layout: Layout) -> Vec<Row> {
        if self.header.columns.is_empty() {
            return Vec::new();
        }
        if self.is_all_int() {
            self.decode_int_rows(layout)
        } else {
            self.decode_typed_rows(layout)
        }
    }

    fn decode_row(&self, reader: &mut ValueReader<'_>) -> Result<Row> {
        let mut row = Row::with_capacity(self.header.columns.len());
        for (i, Column { column_type, name }) in self.header.columns.iter().enumerate() {
            reader.set_column(i + 1);
            let value = reader.read(*column_type)?;
            row.insert(name.as_str(), self.options.normalize_value(name, value));
        }
        Ok(row)
    }

    fn decode_typed_rows(&self, layout: Layout) -> Vec<Row> {
        let mut collector = RowCollector::new(&self.options, &self.header);
        let mut reader = ValueReader::new(self.content(), &self.pool);

        if let Err(err) = reader.skip_varints(layout.row_start()) {
            warn!("row start lies past the content trunk: {}", err);
            return Vec::new();
        }

        while !reader.is_empty() && !collector.is_full() {
            let flow = match self.decode_row(&mut reader) {
                Ok(row) => collector.accept(row),
                Err(err) => collector.reject(&err),
            };
            if flow == Flow::Stop {
                break;
            }
        }

        collector.finish()
    }

    /// Single varint pass for tables made only of `int` columns
    fn decode_int_rows(&self, layout: Layout) -> Vec<Row> {
        let values = self.content_varints();
        let start = layout.row_start().min(values.len());
        let col_count = self.header.columns.len();
        let mut collector = RowCollector::new(&self.options, &self.header);

        for chunk in values[start..].chunks(col_count) {
            if collector.is_full() {
                break;
            }
            let flow = if chunk.len() < col_count {
                let offset = self.content().len();
                collector.reject(&Error::Truncated { offset, needed: 1 })
            } else {
                let row = self
                    .header
                    .columns
                    .iter()
                    .zip(chunk)
                    .map(|(column, raw)| {
                        let value = Value::from(raw.map(remap_signed));
                        (column.name.as_str(), self.options.normalize_value(&column.name, value))
                    })
                    .collect();
                collector.accept(row)
            };
            if flow == Flow::Stop {
                break;
            }
        }

        collector.finish()
    }

    /// Detect the layout and decode every row
    pub fn finish(self) -> BinaryTable {
        let layout = self.detect_layout();
        let rows = self.decode_rows(layout);
        debug!(
            decoded = rows.len(),
            declared = self.header.row_count,
            "decoded table rows"
        );

        BinaryTable {
            header: self.header,
            pool: self.pool,
            layout,
            format: TableFormat::Binary,
            rows,
        }
    }
}

/// A fully decoded table
#[derive(Debug, Clone)]
pub struct BinaryTable {
    header: TableHeader,
    pool: StringPool,
    layout: Layout,
    format: TableFormat,
    rows: Vec<Row>,
}

impl BinaryTable {
    /// Check whether data is already tab-separated text
    pub fn is_tab_separated(data: &[u8]) -> bool {
        is_tab_separated(data)
    }

    /// Decode a table buffer with default options
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with_options(data, DecodeOptions::default())
    }

    pub fn parse_with_options(data: &[u8], options: DecodeOptions) -> Result<Self> {
        if options.detect_tab_separated && is_tab_separated(data) {
            let (header, rows) = parse_tab_separated(data)?;
            debug!(rows = rows.len(), "table is already tab-separated");
            return Ok(BinaryTable {
                header,
                pool: StringPool::disabled(PoolDisabledReason::Absent),
                layout: Layout::RowMajor,
                format: TableFormat::TabSeparated,
                rows,
            });
        }

        Ok(TableDecoder::new(data, options)?.finish())
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn columns(&self) -> &[Column] {
        &self.header.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.header.column_names().collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Whether every row the header declares was decoded
    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.header.row_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::{sleb, uleb};
    use crate::table::pool::tests::pool_trunk;
    use crate::table::pool::PoolStatus;
    use crate::table::types::Fixed;

    /// Assembles a binary table buffer
    struct TableBuilder {
        columns: Vec<(u64, String)>,
        primary_key: Option<u64>,
        row_count: u64,
        row_trunk: Vec<u8>,
        content: Vec<u8>,
        pool: Vec<u8>,
    }

    impl TableBuilder {
        fn new(columns: &[(u64, &str)]) -> Self {
            Self {
                columns: columns.iter().map(|(t, n)| (*t, n.to_string())).collect(),
                primary_key: None,
                row_count: 0,
                row_trunk: Vec::new(),
                content: Vec::new(),
                pool: Vec::new(),
            }
        }

        fn primary_key(mut self, index: u64) -> Self {
            self.primary_key = Some(index);
            self
        }

        fn rows(mut self, count: u64) -> Self {
            self.row_count = count;
            self
        }

        fn content(mut self, bytes: impl IntoIterator<Item = u8>) -> Self {
            self.content.extend(bytes);
            self
        }

        fn row_trunk(mut self, bytes: &[u8]) -> Self {
            self.row_trunk.extend_from_slice(bytes);
            self
        }

        fn pool(mut self, bytes: Vec<u8>) -> Self {
            self.pool = bytes;
            self
        }

        fn build(&self) -> Vec<u8> {
            let pk_trunk: &[u8] = if self.primary_key.is_some() { &[0xAA, 0xBB] } else { &[] };

            let mut body = uleb(self.columns.len() as u64);
            for (type_id, name) in &self.columns {
                body.extend(uleb(*type_id));
                body.extend(name.as_bytes());
                body.push(0);
            }
            match self.primary_key {
                Some(index) => {
                    body.push(1);
                    body.extend(uleb(index));
                    body.extend(uleb(pk_trunk.len() as u64));
                }
                None => body.push(0),
            }
            body.extend(uleb(self.row_trunk.len() as u64));
            body.extend(uleb(self.row_count));
            body.extend(uleb(self.content.len() as u64));

            let mut data = (body.len() as u32).to_le_bytes().to_vec();
            data.extend(body);
            data.extend_from_slice(pk_trunk);
            data.extend(&self.row_trunk);
            data.extend(&self.content);
            data.extend(&self.pool);
            data
        }
    }

    fn ints(rows: &[Row], column: &str) -> Vec<Option<i64>> {
        rows.iter()
            .map(|r| r.get(column).and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn test_single_int_column_round_trip() {
        let data = TableBuilder::new(&[(14, "Id")]).rows(2).content([5, 7]).build();
        let table = BinaryTable::parse(&data).unwrap();

        assert_eq!(table.format(), TableFormat::Binary);
        assert_eq!(table.layout(), Layout::RowMajor);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].get("Id"), Some(&Value::Int(5)));
        assert_eq!(table.rows()[1].get("Id"), Some(&Value::Int(7)));
        assert!(table.is_complete());
    }

    #[test]
    fn test_row_trunk_is_skipped() {
        let data = TableBuilder::new(&[(14, "Id"), (2, "Name")])
            .rows(1)
            .row_trunk(&[9, 9, 9])
            .content(uleb(3).into_iter().chain(*b"abc\0"))
            .build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].get("Name"), Some(&Value::from("abc")));
    }

    #[test]
    fn test_mixed_columns() {
        let mut content = Vec::new();
        for (id, name, rate) in [(1, "one", 12_500i64), (2, "two", -5_000)] {
            content.extend(sleb(id));
            content.extend(name.as_bytes());
            content.push(0);
            content.extend(sleb(rate));
            content.push(1);
        }
        let data = TableBuilder::new(&[(14, "Id"), (2, "Name"), (15, "Rate"), (1, "Enabled")])
            .primary_key(0)
            .rows(2)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();

        assert_eq!(table.header().primary_key.as_deref(), Some("Id"));
        assert_eq!(table.column_names(), ["Id", "Name", "Rate", "Enabled"]);
        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Rate"), Some(&Value::Float(1.25)));
        assert_eq!(rows[1].get("Rate"), Some(&Value::Float(-0.5)));
        assert_eq!(rows[1].get("Name"), Some(&Value::from("two")));
        assert_eq!(rows[1].get("Enabled"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_pool_disabled_falls_back_to_inline_strings() {
        let mut pool_header = uleb(500);
        pool_header.extend([1, 1, 1]);
        let mut pool = (pool_header.len() as u32).to_le_bytes().to_vec();
        pool.extend(pool_header);
        pool.extend([0x00, 0x01]);

        let data = TableBuilder::new(&[(2, "Name")])
            .rows(2)
            .content(*b"first\0second\0")
            .pool(pool)
            .build();
        let table = BinaryTable::parse(&data).unwrap();

        assert_eq!(
            table.pool().status(),
            &PoolStatus::Disabled(PoolDisabledReason::ColumnSize(500))
        );
        let names: Vec<_> = table.rows().iter().map(|r| r.get("Name").cloned()).collect();
        assert_eq!(names, [Some(Value::from("first")), Some(Value::from("second"))]);
    }

    #[test]
    fn test_pooled_string_column() {
        let data = TableBuilder::new(&[(14, "Id"), (2, "Name"), (2, "Note")])
            .rows(2)
            .content([0x01, 0x01, b'a', 0x00, 0x02, 0x00, b'b', 0x00])
            .pool(pool_trunk(&[1], &["Sword", "Shield"]))
            .build();
        let table = BinaryTable::parse(&data).unwrap();

        assert!(table.pool().is_enabled());
        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some(&Value::from("Shield")));
        assert_eq!(rows[0].get("Note"), Some(&Value::from("a")));
        assert_eq!(rows[1].get("Name"), Some(&Value::from("Sword")));
        assert_eq!(rows[1].get("Note"), Some(&Value::from("b")));
    }

    #[test]
    fn test_absent_id_ends_table_as_padding() {
        let mut content = Vec::new();
        for (id, level) in [(1, 10), (2, 20), (3, 30), (0, 40), (5, 50), (6, 60)] {
            content.extend(uleb(id));
            content.extend(uleb(level));
        }
        let data = TableBuilder::new(&[(14, "Id"), (14, "Level")])
            .primary_key(0)
            .rows(100)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();

        assert_eq!(ints(table.rows(), "Id"), [Some(1), Some(2), Some(3)]);
        assert!(!table.is_complete());
    }

    #[test]
    fn test_absent_id_ends_typed_table_as_padding() {
        let mut content = Vec::new();
        for (id, name) in [(1u64, "a"), (2, "b"), (3, "c"), (0, "pad"), (5, "e")] {
            content.extend(uleb(id));
            content.extend(name.as_bytes());
            content.push(0);
        }
        let data = TableBuilder::new(&[(14, "Id"), (2, "Name")])
            .primary_key(0)
            .rows(100)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(ints(table.rows(), "Id"), [Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_absent_id_early_is_kept() {
        let mut content = Vec::new();
        for id in [1u64, 0, 3] {
            content.extend(uleb(id));
            content.extend(uleb(9));
        }
        let data = TableBuilder::new(&[(14, "Id"), (14, "Level")])
            .primary_key(0)
            .rows(3)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(ints(table.rows(), "Id"), [Some(1), None, Some(3)]);
    }

    #[test]
    fn test_absent_id_without_primary_key_is_kept() {
        let mut content = Vec::new();
        for id in [1u64, 2, 3, 0, 5] {
            content.extend(uleb(id));
        }
        let data = TableBuilder::new(&[(14, "Id")]).rows(5).content(content).build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(table.rows().len(), 5);
    }

    #[test]
    fn test_hidden_flag_normalization() {
        let mut content = Vec::new();
        for (id, hidden) in [(1u64, 0u64), (2, 1)] {
            content.extend(uleb(id));
            content.extend(uleb(hidden));
            if hidden != 0 {
                content.push(0);
            }
        }
        let data = TableBuilder::new(&[(14, "Id"), (3, "IsHiddenMode")])
            .rows(2)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();

        assert_eq!(table.rows()[0].get("IsHiddenMode"), Some(&Value::from("")));
        assert_eq!(
            table.rows()[1].get("IsHiddenMode"),
            Some(&Value::Fixed(Fixed::new(1, 0, false)))
        );
        assert_eq!(table.rows()[1].get("IsHiddenMode").and_then(Value::as_i64), Some(1));
    }

    #[test]
    fn test_corrupt_tail_keeps_accepted_rows() {
        let mut content = Vec::new();
        for (id, name) in [(1u64, "a"), (2, "b")] {
            content.extend(uleb(id));
            content.extend(name.as_bytes());
            content.push(0);
        }
        // Third row has an id but its string never terminates
        content.extend(uleb(3));
        content.extend(b"broken");
        let data = TableBuilder::new(&[(14, "Id"), (2, "Name")])
            .rows(10)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(ints(table.rows(), "Id"), [Some(1), Some(2)]);
    }

    fn id_row(id: Option<i64>) -> Row {
        [("Id", Value::from(id))].into_iter().collect()
    }

    fn failure() -> Error {
        Error::Truncated { offset: 0, needed: 1 }
    }

    #[test]
    fn test_collector_stops_at_failure_limit() {
        let options = DecodeOptions::default();
        let header = TableHeader::tab_separated(vec![Column::new(ColumnType::Int, "Id")], 10);
        let mut collector = RowCollector::new(&options, &header);

        assert_eq!(collector.accept(id_row(Some(1))), Flow::Continue);
        assert_eq!(collector.reject(&failure()), Flow::Continue);
        assert_eq!(collector.reject(&failure()), Flow::Continue);
        assert_eq!(collector.reject(&failure()), Flow::Stop);
        assert_eq!(collector.finish().len(), 1);
    }

    #[test]
    fn test_collector_accept_resets_failures() {
        let options = DecodeOptions { max_consecutive_failures: 2, ..Default::default() };
        let header = TableHeader::tab_separated(vec![Column::new(ColumnType::Int, "Id")], 10);
        let mut collector = RowCollector::new(&options, &header);

        assert_eq!(collector.reject(&failure()), Flow::Continue);
        assert_eq!(collector.accept(id_row(Some(1))), Flow::Continue);
        assert_eq!(collector.reject(&failure()), Flow::Continue);
        assert_eq!(collector.accept(id_row(Some(2))), Flow::Continue);
        assert_eq!(collector.reject(&failure()), Flow::Continue);
        assert_eq!(collector.reject(&failure()), Flow::Stop);
        assert_eq!(ints(&collector.finish(), "Id"), [Some(1), Some(2)]);
    }

    #[test]
    fn test_collector_stops_when_full() {
        let options = DecodeOptions::default();
        let header = TableHeader::tab_separated(vec![Column::new(ColumnType::Int, "Id")], 2);
        let mut collector = RowCollector::new(&options, &header);

        assert_eq!(collector.accept(id_row(Some(1))), Flow::Continue);
        assert!(!collector.is_full());
        assert_eq!(collector.accept(id_row(None)), Flow::Stop);
        assert!(collector.is_full());
    }

    #[test]
    fn test_failed_typed_row_ends_the_table() {
        let mut content = Vec::new();
        for (id, name) in [(1u64, "a"), (2, "b")] {
            content.extend(uleb(id));
            content.extend(name.as_bytes());
            content.push(0);
        }
        content.extend(uleb(3));
        content.extend(b"broken");
        let data = TableBuilder::new(&[(14, "Id"), (2, "Name")])
            .rows(10)
            .content(content)
            .build();

        for limit in [1, 3, 100] {
            let options = DecodeOptions { max_consecutive_failures: limit, ..Default::default() };
            let table = BinaryTable::parse_with_options(&data, options).unwrap();
            assert_eq!(ints(table.rows(), "Id"), [Some(1), Some(2)]);
        }
    }

    #[test]
    fn test_int_table_partial_trailing_row() {
        let data = TableBuilder::new(&[(14, "A"), (14, "B")])
            .rows(0)
            .content([1, 2, 3, 4, 5])
            .build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(ints(table.rows(), "A"), [Some(1), Some(3)]);
        assert_eq!(ints(table.rows(), "B"), [Some(2), Some(4)]);
    }

    #[test]
    fn test_declared_row_count_caps_rows() {
        let data = TableBuilder::new(&[(14, "Id")]).rows(2).content([1, 2, 3, 4]).build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(ints(table.rows(), "Id"), [Some(1), Some(2)]);
    }

    #[test]
    fn test_negative_ints_in_fast_path() {
        let mut content = sleb(8);
        content.extend(sleb(-7));
        let data = TableBuilder::new(&[(14, "Id")]).rows(2).content(content).build();
        let table = BinaryTable::parse(&data).unwrap();
        assert_eq!(table.layout(), Layout::RowMajor);
        assert_eq!(ints(table.rows(), "Id"), [Some(8), Some(-7)]);
    }

    #[test]
    fn test_columnar_content_skips_metadata() {
        let mut values = vec![20_000_000u64, 40_000_000, 30_000_000, 50_000_000];
        for i in 0..12 {
            values.push(1_000_000 + i);
            values.push(i + 1);
        }
        let content: Vec<u8> = values.iter().flat_map(|&v| uleb(v)).collect();
        let data = TableBuilder::new(&[(14, "Id"), (14, "Count")])
            .primary_key(0)
            .rows(12)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();

        assert_eq!(table.layout(), Layout::Columnar { row_start: Some(4) });
        assert_eq!(table.rows().len(), 12);
        assert_eq!(table.rows()[0].get("Id"), Some(&Value::Int(1_000_000)));
        assert_eq!(table.rows()[11].get("Count"), Some(&Value::Int(12)));
    }

    #[test]
    fn test_columnar_typed_content_skips_metadata() {
        let mut content: Vec<u8> = [20_000_000u64, 40_000_000].iter().flat_map(|&v| uleb(v)).collect();
        for i in 0..10u64 {
            content.extend(uleb(2_000_000 + i));
            content.push(1);
        }
        let data = TableBuilder::new(&[(14, "Id"), (1, "Flag")])
            .primary_key(0)
            .rows(10)
            .content(content)
            .build();
        let table = BinaryTable::parse(&data).unwrap();

        assert_eq!(table.layout(), Layout::Columnar { row_start: Some(2) });
        assert_eq!(table.rows().len(), 10);
        assert_eq!(table.rows()[0].get("Id"), Some(&Value::Int(2_000_000)));
        assert_eq!(table.rows()[0].get("Flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_invalid_header_is_fatal() {
        let data = TableBuilder::new(&[(30, "Bad")]).rows(1).content([1]).build();
        assert!(matches!(BinaryTable::parse(&data), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_tab_separated_detection() {
        let table = BinaryTable::parse(b"Name\tValue\nfoo\t1\n").unwrap();
        assert_eq!(table.format(), TableFormat::TabSeparated);
        assert_eq!(table.column_names(), ["Name", "Value"]);
        assert_eq!(table.rows()[0].get("Value"), Some(&Value::from("1")));
        assert!(BinaryTable::is_tab_separated(b"Name\t"));

        let options = DecodeOptions { detect_tab_separated: false, ..Default::default() };
        assert!(BinaryTable::parse_with_options(b"Name\tValue\nfoo\t1\n", options).is_err());
    }

    #[test]
    fn test_zero_columns_yield_no_rows() {
        let data = TableBuilder::new(&[]).rows(3).content([1, 2, 3]).build();
        let table = BinaryTable::parse(&data).unwrap();
        assert!(table.rows().is_empty());
    }

    #[test]
    fn test_decoder_instances_are_independent() {
        fn assert_send<T: Send + Sync>() {}
        assert_send::<BinaryTable>();

        let handles: Vec<_> = (1..=4u8)
            .map(|n| {
                std::thread::spawn(move || {
                    let data = TableBuilder::new(&[(14, "Id")]).rows(1).content([n]).build();
                    BinaryTable::parse(&data).unwrap().into_rows()
                })
            })
            .collect();
        for (n, handle) in (1..=4i64).zip(handles) {
            assert_eq!(ints(&handle.join().unwrap(), "Id"), [Some(n)]);
        }
    }
}
