//! Column types and decoded values

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use std::fmt;

use crate::error::Error;

/// Declared type of a column
///
/// The numeric tags are the ones written into the table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnType {
    Bool = 1,
    String = 2,
    Fix = 3,
    ListString = 4,
    ListBool = 5,
    ListInt = 6,
    ListFloat = 7,
    ListFix = 8,
    MapStringString = 9,
    MapIntInt = 10,
    MapIntString = 11,
    MapStringInt = 12,
    MapIntFloat = 13,
    Int = 14,
    Float = 15,
    Fix2 = 16,
    Fix3 = 17,
    FixQuaternion = 18,
    ListFix2 = 19,
    ListFix3 = 20,
    ListFixQuaternion = 21,
}

impl ColumnType {
    /// The tag as written in the header
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Short human-readable type name
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Bool => "bool",
            ColumnType::String => "string",
            ColumnType::Fix => "fix",
            ColumnType::ListString => "list<string>",
            ColumnType::ListBool => "list<bool>",
            ColumnType::ListInt => "list<int>",
            ColumnType::ListFloat => "list<float>",
            ColumnType::ListFix => "list<fix>",
            ColumnType::MapStringString => "dic<str,str>",
            ColumnType::MapIntInt => "dic<int,int>",
            ColumnType::MapIntString => "dic<int,str>",
            ColumnType::MapStringInt => "dic<str,int>",
            ColumnType::MapIntFloat => "dic<int,float>",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Fix2 => "fix2",
            ColumnType::Fix3 => "fix3",
            ColumnType::FixQuaternion => "fixquat",
            ColumnType::ListFix2 => "list<fix2>",
            ColumnType::ListFix3 => "list<fix3>",
            ColumnType::ListFixQuaternion => "list<fixquat>",
        }
    }
}

impl TryFrom<i64> for ColumnType {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => ColumnType::Bool,
            2 => ColumnType::String,
            3 => ColumnType::Fix,
            4 => ColumnType::ListString,
            5 => ColumnType::ListBool,
            6 => ColumnType::ListInt,
            7 => ColumnType::ListFloat,
            8 => ColumnType::ListFix,
            9 => ColumnType::MapStringString,
            10 => ColumnType::MapIntInt,
            11 => ColumnType::MapIntString,
            12 => ColumnType::MapStringInt,
            13 => ColumnType::MapIntFloat,
            14 => ColumnType::Int,
            15 => ColumnType::Float,
            16 => ColumnType::Fix2,
            17 => ColumnType::Fix3,
            18 => ColumnType::FixQuaternion,
            19 => ColumnType::ListFix2,
            20 => ColumnType::ListFix3,
            21 => ColumnType::ListFixQuaternion,
            other => {
                return Err(Error::InvalidHeader(format!("unknown column type id {}", other)))
            }
        })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decimal fixed-point number: `(negative ? -mantissa : mantissa) / 10^exponent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fixed {
    pub mantissa: u64,
    pub exponent: u8,
    pub negative: bool,
}

impl Fixed {
    pub const ZERO: Fixed = Fixed { mantissa: 0, exponent: 0, negative: false };

    pub fn new(mantissa: u64, exponent: u8, negative: bool) -> Self {
        Self { mantissa, exponent, negative }
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Exponent 0 means the value is a plain integer
    pub fn is_integer(&self) -> bool {
        self.exponent == 0
    }

    pub fn to_f64(&self) -> f64 {
        let magnitude = if self.exponent == 0 {
            self.mantissa as f64
        } else {
            self.mantissa as f64 / 10f64.powi(i32::from(self.exponent))
        };
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Integer value when the exponent is 0 and the magnitude fits
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        let magnitude = i64::try_from(self.mantissa).ok()?;
        Some(if self.negative { -magnitude } else { magnitude })
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative && !self.is_zero() { "-" } else { "" };
        if self.is_integer() {
            return write!(f, "{}{}", sign, self.mantissa);
        }

        let exponent = usize::from(self.exponent);
        let digits = format!("{:0>width$}", self.mantissa, width = exponent + 1);
        let (whole, fraction) = digits.split_at(digits.len() - exponent);
        let fraction = fraction.trim_end_matches('0');
        let fraction = if fraction.is_empty() { "0" } else { fraction };
        write!(f, "{}{}.{}", sign, whole, fraction)
    }
}

impl Serialize for Fixed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_i64() {
            Some(v) => serializer.serialize_i64(v),
            None => serializer.serialize_f64(self.to_f64()),
        }
    }
}

/// A decoded cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The "absent" sentinel (a zero varint, empty string, or non-1 bool byte)
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Fixed(Fixed),
    Str(String),
    List(Vec<Value>),
    /// Key/value pairs in first-insertion order; keys are unique
    Map(Vec<(Value, Value)>),
    Vector2 { x: Fixed, y: Fixed },
    Vector3 { x: Fixed, y: Fixed, z: Fixed },
    Quaternion { x: Fixed, y: Fixed, z: Fixed, w: Fixed },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value compares equal to integer zero
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Fixed(v) => v.is_zero(),
            Value::Bool(v) => !*v,
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Fixed(v) => v.to_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Fixed(v) => Some(v.to_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a map entry by key
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        v.map_or(Value::Null, Value::Int)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Fixed> for Value {
    fn from(v: Fixed) -> Self {
        Value::Fixed(v)
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = T>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    /// Cell text as a tab-separated writer would emit it; `Null` is empty
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{:.1}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Fixed(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                write_joined(f, entries.iter().map(|(k, v)| format!("{}: {}", k, v)))?;
                f.write_str("}")
            }
            Value::Vector2 { x, y } => write!(f, "{{x: {}, y: {}}}", x, y),
            Value::Vector3 { x, y, z } => write!(f, "{{x: {}, y: {}, z: {}}}", x, y, z),
            Value::Quaternion { x, y, z, w } => {
                write!(f, "{{x: {}, y: {}, z: {}, w: {}}}", x, y, z, w)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Fixed(v) => v.serialize(serializer),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                // JSON objects need string keys
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
            Value::Vector2 { x, y } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("x", x)?;
                map.serialize_entry("y", y)?;
                map.end()
            }
            Value::Vector3 { x, y, z } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("x", x)?;
                map.serialize_entry("y", y)?;
                map.serialize_entry("z", z)?;
                map.end()
            }
            Value::Quaternion { x, y, z, w } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("x", x)?;
                map.serialize_entry("y", y)?;
                map.serialize_entry("z", z)?;
                map.serialize_entry("w", w)?;
                map.end()
            }
        }
    }
}

/// One decoded row: column name to value, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { cells: Vec::with_capacity(capacity) }
    }

    /// Set a cell. A repeated column name overwrites the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.cells.iter_mut().find(|(n, _)| *n == name) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_cells(self) -> Vec<(String, Value)> {
        self.cells
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
