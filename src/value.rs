//! Owned, fully-resolved data values
//!
//! [`DataValue`] is the allocating counterpart to the borrowed
//! [`DataRecord`](crate::decode::DataRecord): pointers are chased, strings
//! copied out, containers built into real maps and vectors. Convenient when
//! the result outlives the database handle or needs to be serialized.

use crate::decode::{Decoder, Field, MAX_RECURSION_DEPTH};
use crate::error::{MmdbError, Result};
use std::collections::HashMap;

/// A decoded MMDB value with owned storage
///
/// Serialization is untagged: every variant renders as its bare contents,
/// so a `Map` turns into a JSON object, an `Array` into a JSON array, and
/// scalars into plain JSON scalars. The variants track the format's type
/// codes one to one.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum DataValue {
    /// Text, guaranteed valid UTF-8
    String(String),
    /// Double-width float, 8 bytes on disk
    Double(f64),
    /// Opaque binary blob
    Bytes(Vec<u8>),
    /// Unsigned integer stored in up to 2 bytes
    Uint16(u16),
    /// Unsigned integer stored in up to 4 bytes
    Uint32(u32),
    /// String-keyed mapping of nested values
    Map(HashMap<String, DataValue>),
    /// Signed integer, always 4 bytes when negative
    Int32(i32),
    /// Unsigned integer stored in up to 8 bytes
    Uint64(u64),
    /// Unsigned integer stored in up to 16 bytes
    Uint128(u128),
    /// Ordered list of nested values
    Array(Vec<DataValue>),
    /// Flag carried in the element's size bits
    Bool(bool),
    /// Single-width float, 4 bytes on disk
    Float(f32),
}

impl<'a> Decoder<'a> {
    /// Decode the element at `offset` into an owned value, resolving every
    /// pointer along the way.
    pub fn decode_value(&self, offset: u32) -> Result<DataValue> {
        self.decode_value_at(offset, 0).map(|(value, _)| value)
    }

    /// Decode one value; returns it with the cursor past its encoding.
    ///
    /// For a pointer the cursor is past the pointer token, not the target.
    fn decode_value_at(&self, offset: u32, depth: usize) -> Result<(DataValue, u32)> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(MmdbError::CorruptDatabase(format!(
                "value recursion exceeded {} levels at offset {}",
                MAX_RECURSION_DEPTH, offset
            )));
        }

        let record = self.decode_one(offset)?;
        let value = match record.field {
            Field::Pointer(target) => {
                let (value, _) = self.decode_value_at(target, depth + 1)?;
                return Ok((value, record.offset_to_next));
            }
            Field::Map { entries } => {
                let mut map = HashMap::with_capacity(entries as usize);
                let mut cursor = record.offset_to_next;
                for _ in 0..entries {
                    let (key, after_key) = self.decode_value_at(cursor, depth + 1)?;
                    let key = match key {
                        DataValue::String(s) => s,
                        _ => {
                            return Err(MmdbError::CorruptDatabase(format!(
                                "map key at offset {} is not a string",
                                cursor
                            )))
                        }
                    };
                    let (value, after_value) = self.decode_value_at(after_key, depth + 1)?;
                    map.insert(key, value);
                    cursor = after_value;
                }
                return Ok((DataValue::Map(map), cursor));
            }
            Field::Array { entries } => {
                let mut array = Vec::with_capacity(entries as usize);
                let mut cursor = record.offset_to_next;
                for _ in 0..entries {
                    let (value, next) = self.decode_value_at(cursor, depth + 1)?;
                    array.push(value);
                    cursor = next;
                }
                return Ok((DataValue::Array(array), cursor));
            }
            Field::Utf8String(s) => DataValue::String(s.to_string()),
            Field::Double(d) => DataValue::Double(d),
            Field::Bytes(b) => DataValue::Bytes(b.to_vec()),
            Field::Uint16(n) => DataValue::Uint16(n),
            Field::Uint32(n) => DataValue::Uint32(n),
            Field::Int32(n) => DataValue::Int32(n),
            Field::Uint64(n) => DataValue::Uint64(n),
            Field::Uint128(n) => DataValue::Uint128(n),
            Field::Bool(b) => DataValue::Bool(b),
            Field::Float(f) => DataValue::Float(f),
        };

        Ok((value, record.offset_to_next))
    }
}
