//! Typed value decoding for content trunks

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Cursor;

use crate::codec::ReadTableExt;
use crate::error::Result;
use crate::table::pool::StringPool;
use crate::table::types::{ColumnType, Fixed, Value};

const FIX_EXPONENT_MASK: u8 = 0x7F;
const FIX_SIGN_BIT: u8 = 0x80;

/// Divisor applied to `float` columns, which are stored as scaled integers
const FLOAT_SCALE: f64 = 10_000.0;

/// Reads cell values of declared types from a content trunk
pub struct ValueReader<'a> {
    cursor: Cursor<&'a [u8]>,
    pool: &'a StringPool,
    use_pool: bool,
}

impl<'a> ValueReader<'a> {
    pub fn new(content: &'a [u8], pool: &'a StringPool) -> Self {
        Self {
            cursor: Cursor::new(content),
            pool,
            use_pool: false,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn skip_varints(&mut self, count: usize) -> Result<()> {
        self.cursor.skip_varints(count)
    }

    /// Select the 1-based column slot being read, which decides pool use for strings
    pub fn set_column(&mut self, column: usize) {
        self.use_pool = self.pool.is_pooled_column(column);
    }

    /// Decode one value of `column_type`
    pub fn read(&mut self, column_type: ColumnType) -> Result<Value> {
        match column_type {
            ColumnType::Bool => self.read_bool(),
            ColumnType::String => self.read_string(),
            ColumnType::Fix => Ok(Value::Fixed(self.read_fix()?)),
            ColumnType::ListString => self.read_list(Self::read_string),
            ColumnType::ListBool => self.read_list(Self::read_bool),
            ColumnType::ListInt => self.read_list(Self::read_int_or_zero),
            ColumnType::ListFloat => self.read_list(Self::read_float_or_zero),
            ColumnType::ListFix => self.read_list(|r| Ok(Value::Fixed(r.read_fix()?))),
            ColumnType::MapStringString => self.read_map(Self::read_string, Self::read_string),
            ColumnType::MapIntInt => self.read_map(Self::read_int_or_zero, Self::read_int_or_zero),
            ColumnType::MapIntString => self.read_map(Self::read_int_or_zero, Self::read_string),
            ColumnType::MapStringInt => self.read_map(Self::read_string, Self::read_int),
            ColumnType::MapIntFloat => self.read_map(Self::read_int_or_zero, Self::read_float),
            ColumnType::Int => self.read_int(),
            ColumnType::Float => self.read_float(),
            ColumnType::Fix2 => self.read_fix2(),
            ColumnType::Fix3 => self.read_fix3(),
            ColumnType::FixQuaternion => self.read_fix_quaternion(),
            ColumnType::ListFix2 => self.read_list(Self::read_fix2),
            ColumnType::ListFix3 => self.read_list(Self::read_fix3),
            ColumnType::ListFixQuaternion => self.read_list(Self::read_fix_quaternion),
        }
    }

    /// Only a byte of exactly 1 is `true`; anything else is absent
    fn read_bool(&mut self) -> Result<Value> {
        Ok(match self.cursor.read_byte()? {
            1 => Value::Bool(true),
            _ => Value::Null,
        })
    }

    fn read_int(&mut self) -> Result<Value> {
        Ok(self.cursor.read_sleb128()?.into())
    }

    fn read_int_or_zero(&mut self) -> Result<Value> {
        Ok(Value::Int(self.cursor.read_sleb128()?.unwrap_or(0)))
    }

    fn read_float(&mut self) -> Result<Value> {
        Ok(match self.cursor.read_sleb128()? {
            Some(raw) => Value::Float(scaled_float(raw)),
            None => Value::Null,
        })
    }

    fn read_float_or_zero(&mut self) -> Result<Value> {
        let raw = self.cursor.read_sleb128()?.unwrap_or(0);
        Ok(Value::Float(scaled_float(raw)))
    }

    fn read_string(&mut self) -> Result<Value> {
        if self.use_pool {
            let index = self.cursor.read_sleb128()?.unwrap_or(0);
            return Ok(self.pool.resolve(index).map_or(Value::Null, Value::Str));
        }

        let s = self.cursor.read_cstring()?;
        Ok(if s.is_empty() { Value::Null } else { Value::Str(s) })
    }

    /// Mantissa varint, then (only when non-zero) an exponent byte whose high
    /// bit is the sign
    fn read_fix(&mut self) -> Result<Fixed> {
        let mantissa = self.cursor.read_uleb128_64()?.unwrap_or(0);
        if mantissa == 0 {
            return Ok(Fixed::ZERO);
        }
        let combined = self.cursor.read_byte()?;
        Ok(Fixed::new(
            mantissa,
            combined & FIX_EXPONENT_MASK,
            combined & FIX_SIGN_BIT != 0,
        ))
    }

    fn read_fix2(&mut self) -> Result<Value> {
        let x = self.read_fix()?;
        let y = self.read_fix()?;
        Ok(Value::Vector2 { x, y })
    }

    fn read_fix3(&mut self) -> Result<Value> {
        let x = self.read_fix()?;
        let y = self.read_fix()?;
        let z = self.read_fix()?;
        Ok(Value::Vector3 { x, y, z })
    }

    fn read_fix_quaternion(&mut self) -> Result<Value> {
        let x = self.read_fix()?;
        let y = self.read_fix()?;
        let z = self.read_fix()?;
        let w = self.read_fix()?;
        Ok(Value::Quaternion { x, y, z, w })
    }

    /// Length prefix for lists and maps; absent or non-positive means empty
    fn read_length(&mut self) -> Result<usize> {
        let len = self.cursor.read_sleb128()?.unwrap_or(0);
        Ok(usize::try_from(len).unwrap_or(0))
    }

    fn read_list<F>(&mut self, mut read_item: F) -> Result<Value>
    where
        F: FnMut(&mut Self) -> Result<Value>,
    {
        let len = self.read_length()?;
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(read_item(self)?);
        }
        Ok(Value::List(items))
    }

    fn read_map<K, V>(&mut self, mut read_key: K, mut read_value: V) -> Result<Value>
    where
        K: FnMut(&mut Self) -> Result<Value>,
        V: FnMut(&mut Self) -> Result<Value>,
    {
        let len = self.read_length()?;
        let capacity = len.min(self.remaining());
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(capacity);
        let mut positions: HashMap<MapKey, usize> = HashMap::with_capacity(capacity);
        for _ in 0..len {
            let key = read_key(self)?;
            let value = read_value(self)?;
            // Later duplicates win, keeping the first key position
            match positions.entry(MapKey::from(&key)) {
                Entry::Occupied(slot) => entries[*slot.get()].1 = value,
                Entry::Vacant(slot) => {
                    slot.insert(entries.len());
                    entries.push((key, value));
                }
            }
        }
        Ok(Value::Map(entries))
    }
}

/// Hashable identity of a map key. Keys are only ever ints, strings or absent.
#[derive(Debug, PartialEq, Eq, Hash)]
enum MapKey {
    Null,
    Int(i64),
    Str(String),
    /// Any other value, compared through its text form
    Other(String),
}

impl From<&Value> for MapKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => MapKey::Null,
            Value::Int(v) => MapKey::Int(*v),
            Value::Str(s) => MapKey::Str(s.clone()),
            other => MapKey::Other(other.to_string()),
        }
    }
}

/// Scale a stored float and fold integral results onto a clean integer value
fn scaled_float(raw: i64) -> f64 {
    let value = raw as f64 / FLOAT_SCALE;
    if value.fract() == 0.0 {
        value.trunc() + 0.0
    } else {
        value
    }
}
