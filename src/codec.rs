//! Primitive readers for table files
//!
//! Almost every integer in a table file is a LEB128-style varint: 7 payload bits
//! per byte, low group first, high bit set on every byte but the last. The only
//! fixed-width fields are the little-endian `u32` length prefixes.
//!
//! A varint that decodes to zero is never reported as `0`. The format reuses zero
//! to mean "absent", so every varint reader here returns `Option` and yields
//! `None` for it.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};

const VARINT_CONTINUATION_BIT: u8 = 0x80;
const VARINT_DATA_MASK: u8 = 0x7F;

/// Largest value a signed varint carries before it wraps to negative
pub const MAX_INT32: u64 = i32::MAX as u64;

/// Reinterpret an unsigned varint payload as a signed 32-bit quantity.
///
/// Values above `i32::MAX` are mapped to `-(((!v) & i32::MAX) + 1)`.
pub fn remap_signed(value: u64) -> i64 {
    if value > MAX_INT32 {
        -(((!value) & MAX_INT32) as i64 + 1)
    } else {
        value as i64
    }
}

/// Decode UTF-8 text, dropping invalid or incomplete byte sequences
pub fn decode_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, invalid) = rest.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                // An incomplete sequence can only be at the end
                let skip = err.error_len().unwrap_or(invalid.len());
                rest = &invalid[skip..];
            }
        }
    }
}

/// Decode one varint at `pos`. Returns the raw value and the position after it.
fn decode_uleb128(data: &[u8], pos: usize) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    let mut pos = pos;

    loop {
        let byte = *data.get(pos).ok_or(Error::Truncated { offset: pos, needed: 1 })?;
        pos += 1;

        // Groups past 64 bits cannot be represented and are dropped
        if shift < u64::BITS {
            value |= u64::from(byte & VARINT_DATA_MASK) << shift;
        }
        if byte & VARINT_CONTINUATION_BIT == 0 {
            return Ok((value, pos));
        }
        shift += 7;
    }
}

/// Extension methods for reading table primitives from an in-memory cursor
pub trait ReadTableExt {
    /// Read an unsigned varint; `None` when it encodes zero
    fn read_uleb128(&mut self) -> Result<Option<u64>>;

    /// Read an unsigned varint used for 64-bit magnitudes (fixed-point mantissas)
    fn read_uleb128_64(&mut self) -> Result<Option<u64>>;

    /// Read a varint and apply the signed 32-bit remap
    fn read_sleb128(&mut self) -> Result<Option<i64>>;

    /// Drain every remaining varint. A truncated trailing varint is dropped.
    fn read_all_varints(&mut self) -> Vec<Option<u64>>;

    /// Skip `count` varints
    fn skip_varints(&mut self, count: usize) -> Result<()>;

    /// Read a single raw byte
    fn read_byte(&mut self) -> Result<u8>;

    /// Read a fixed-width little-endian `u32`
    fn read_u32_le(&mut self) -> Result<u32>;

    /// Read bytes up to (and consume) the next NUL
    fn read_cstring(&mut self) -> Result<String>;

    /// Bytes left between the cursor and the end of the buffer
    fn remaining(&self) -> usize;
}

impl<T: AsRef<[u8]>> ReadTableExt for Cursor<T> {
    fn read_uleb128(&mut self) -> Result<Option<u64>> {
        let start = self.position() as usize;
        let decoded = decode_uleb128(self.get_ref().as_ref(), start);
        match decoded {
            Ok((value, next)) => {
                self.set_position(next as u64);
                Ok((value != 0).then_some(value))
            }
            Err(err) => {
                // A truncated varint consumes the rest of the buffer
                let len = self.get_ref().as_ref().len();
                self.set_position(len.max(start) as u64);
                Err(err)
            }
        }
    }

    fn read_uleb128_64(&mut self) -> Result<Option<u64>> {
        self.read_uleb128()
    }

    fn read_sleb128(&mut self) -> Result<Option<i64>> {
        Ok(self.read_uleb128()?.map(remap_signed))
    }

    fn read_all_varints(&mut self) -> Vec<Option<u64>> {
        let mut values = Vec::new();
        while self.remaining() > 0 {
            match self.read_uleb128() {
                Ok(value) => values.push(value),
                Err(_) => break,
            }
        }
        values
    }

    fn skip_varints(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.read_uleb128()?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let offset = self.position() as usize;
        ReadBytesExt::read_u8(self).map_err(|e| Error::from_fixed_read(e, offset, 1))
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let offset = self.position() as usize;
        self.read_u32::<LittleEndian>()
            .map_err(|e| Error::from_fixed_read(e, offset, 4))
    }

    fn read_cstring(&mut self) -> Result<String> {
        let start = self.position() as usize;
        let data = self.get_ref().as_ref();
        let len = data.len();

        let terminator = data
            .get(start..)
            .and_then(|rest| rest.iter().position(|&b| b == 0));

        match terminator {
            Some(nul) => {
                let value = decode_utf8(&data[start..start + nul]);
                self.set_position((start + nul + 1) as u64);
                Ok(value)
            }
            None => {
                self.set_position(len.max(start) as u64);
                Err(Error::Truncated { offset: len.max(start), needed: 1 })
            }
        }
    }

    fn remaining(&self) -> usize {
        let len = self.get_ref().as_ref().len() as u64;
        len.saturating_sub(self.position()) as usize
    }
}
