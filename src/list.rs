//! Full record materialization and dumping
//!
//! [`Decoder::entry_data_list`] expands a record into a flat depth-first,
//! preorder sequence: a map header followed by key, value, key, value; an
//! array header followed by its elements. Pointers are followed
//! transparently but the first record emitted for a pointer keeps the
//! cursor *after the pointer token* as its `offset_to_next`, so a caller
//! iterating the original stream by offsets resumes past the pointer, not
//! past its target. Container headers carry the cursor past their entire
//! subtree.

use crate::decode::{DataRecord, Decoder, Field, MAX_RECURSION_DEPTH};
use crate::error::{MmdbError, Result};
use std::io;

impl<'a> Decoder<'a> {
    /// Expand the record at `offset` into its preorder element sequence.
    pub fn entry_data_list(&self, offset: u32) -> Result<Vec<DataRecord<'a>>> {
        let mut list = Vec::new();
        self.build_list(offset, &mut list, 0)?;
        Ok(list)
    }

    /// Append the subtree at `offset`; returns the cursor past it.
    fn build_list(
        &self,
        offset: u32,
        list: &mut Vec<DataRecord<'a>>,
        depth: usize,
    ) -> Result<u32> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(MmdbError::CorruptDatabase(format!(
                "materialization recursion exceeded {} levels at offset {}",
                MAX_RECURSION_DEPTH, offset
            )));
        }

        let record = self.decode_one(offset)?;
        match record.field {
            Field::Pointer(target) => {
                let resume = record.offset_to_next;
                let first = list.len();
                self.build_list(target, list, depth + 1)?;
                // Iteration continues after the pointer token in the
                // original stream, not after the pointed-to element.
                if let Some(head) = list.get_mut(first) {
                    head.offset_to_next = resume;
                }
                Ok(resume)
            }
            Field::Map { entries } => {
                let slot = list.len();
                let mut cursor = record.offset_to_next;
                list.push(record);
                for _ in 0..entries {
                    cursor = self.build_list(cursor, list, depth + 1)?; // key
                    cursor = self.build_list(cursor, list, depth + 1)?; // value
                }
                list[slot].offset_to_next = cursor;
                Ok(cursor)
            }
            Field::Array { entries } => {
                let slot = list.len();
                let mut cursor = record.offset_to_next;
                list.push(record);
                for _ in 0..entries {
                    cursor = self.build_list(cursor, list, depth + 1)?;
                }
                list[slot].offset_to_next = cursor;
                Ok(cursor)
            }
            _ => {
                let next = record.offset_to_next;
                list.push(record);
                Ok(next)
            }
        }
    }
}

/// Pretty-print a materialized sequence to `out`.
///
/// The rendering mirrors the classic dump format: container headers with
/// their cardinality, indented scalar leaves.
pub fn dump<W: io::Write>(list: &[DataRecord<'_>], out: &mut W) -> io::Result<()> {
    let mut index = 0;
    while index < list.len() {
        dump_from(list, &mut index, out, 0)?;
    }
    Ok(())
}

fn dump_from<W: io::Write>(
    list: &[DataRecord<'_>],
    index: &mut usize,
    out: &mut W,
    indent: usize,
) -> io::Result<()> {
    let Some(record) = list.get(*index) else {
        return Ok(());
    };
    *index += 1;

    let pad = " ".repeat(indent);
    match record.field {
        Field::Map { entries } => {
            writeln!(out, "{}map with {} pairs", pad, entries)?;
            for _ in 0..entries {
                dump_from(list, index, out, indent + 2)?;
                dump_from(list, index, out, indent + 2)?;
            }
        }
        Field::Array { entries } => {
            writeln!(out, "{}array with {} elements", pad, entries)?;
            for _ in 0..entries {
                dump_from(list, index, out, indent + 2)?;
            }
        }
        Field::Utf8String(s) => writeln!(out, "{}utf8_string = {}", pad, s)?,
        Field::Bytes(b) => {
            write!(out, "{}bytes = ", pad)?;
            for byte in b {
                write!(out, "{:02x}", byte)?;
            }
            writeln!(out)?;
        }
        Field::Double(d) => writeln!(out, "{}double = {}", pad, d)?,
        Field::Float(f) => writeln!(out, "{}float = {}", pad, f)?,
        Field::Uint16(n) => writeln!(out, "{}uint16 = {}", pad, n)?,
        Field::Uint32(n) => writeln!(out, "{}uint32 = {}", pad, n)?,
        Field::Uint64(n) => writeln!(out, "{}uint64 = {}", pad, n)?,
        Field::Uint128(n) => writeln!(out, "{}uint128 = {}", pad, n)?,
        Field::Int32(n) => writeln!(out, "{}int32 = {}", pad, n)?,
        Field::Bool(b) => writeln!(out, "{}boolean = {}", pad, b)?,
        // Never emitted by entry_data_list; printed for completeness.
        Field::Pointer(target) => writeln!(out, "{}pointer = {}", pad, target)?,
    }
    Ok(())
}
