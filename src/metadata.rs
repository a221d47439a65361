//! Metadata block parsing
//!
//! The last ~20KB of an MMDB file contain a marker followed by a metadata
//! map encoded with the ordinary data-section encoding. The marker is the
//! bootstrap: find it, hand the bytes after it to [`Decoder`](crate::decode::Decoder)
//! as their own little data section, and read the map. Every string the
//! handle exposes afterwards is copied out here, so the scratch buffer the
//! metadata was found in can be dropped.

use crate::decode::Decoder;
use crate::error::{MmdbError, Result};
use crate::value::DataValue;
use std::collections::HashMap;

/// MMDB metadata marker: `\xAB\xCD\xEF` followed by `MaxMind.com`
pub const METADATA_MARKER: &[u8] = b"\xAB\xCD\xEFMaxMind.com";

/// The marker is guaranteed to appear within this many bytes of the end of
/// the file.
pub(crate) const METADATA_BLOCK_MAX_SIZE: usize = 20000;

/// IP version the search tree was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 (IPv4 lookups go through the v4-mapped prefix)
    V6,
}

impl IpVersion {
    /// Tree depth in bits: 32 for v4, 128 for v6.
    pub fn depth(self) -> usize {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

/// Record size in bits per tree-record half
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSize {
    /// 24-bit records (6 bytes per node)
    Bits24,
    /// 28-bit records (7 bytes per node)
    Bits28,
    /// 32-bit records (8 bytes per node)
    Bits32,
}

impl RecordSize {
    /// Size of a full node (two records) in bytes.
    pub fn node_bytes(self) -> usize {
        match self {
            RecordSize::Bits24 => 6,
            RecordSize::Bits28 => 7,
            RecordSize::Bits32 => 8,
        }
    }

    /// The record width in bits.
    pub fn bits(self) -> u16 {
        match self {
            RecordSize::Bits24 => 24,
            RecordSize::Bits28 => 28,
            RecordSize::Bits32 => 32,
        }
    }

    pub(crate) fn from_bits(bits: u64) -> Result<Self> {
        match bits {
            24 => Ok(RecordSize::Bits24),
            28 => Ok(RecordSize::Bits28),
            32 => Ok(RecordSize::Bits32),
            other => Err(MmdbError::UnknownDatabaseFormat(format!(
                "record_size {} (expected 24, 28 or 32)",
                other
            ))),
        }
    }
}

/// Decoded database metadata
///
/// Strings are owned copies; the handle can outlive whatever buffer the
/// metadata block was read from.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Number of nodes in the search tree
    pub node_count: u32,
    /// Bits per tree-record half
    pub record_size: RecordSize,
    /// Address family of the search tree
    pub ip_version: IpVersion,
    /// Free-form database type, e.g. `GeoLite2-Country`
    pub database_type: String,
    /// Locale tags the record data is available in, in file order
    pub languages: Vec<String>,
    /// Binary format major version; always 2
    pub binary_format_major_version: u16,
    /// Binary format minor version
    pub binary_format_minor_version: u16,
    /// Build time, seconds since the epoch
    pub build_epoch: u64,
    /// Human descriptions keyed by language tag
    pub description: HashMap<String, String>,
}

impl Metadata {
    /// Parse the metadata map that starts at the beginning of `section`
    /// (the byte right after the marker).
    pub(crate) fn parse(section: &[u8]) -> Result<Self> {
        let root = Decoder::new(section).decode_value(0).map_err(|e| {
            MmdbError::InvalidDatabase(format!("undecodable metadata: {}", e))
        })?;
        let mut map = match root {
            DataValue::Map(m) => m,
            _ => {
                return Err(MmdbError::InvalidDatabase(
                    "metadata is not a map".to_string(),
                ))
            }
        };

        let node_count = require_uint(&map, "node_count")? as u32;
        let record_size = RecordSize::from_bits(require_uint(&map, "record_size")?)?;
        let ip_version = match require_uint(&map, "ip_version")? {
            4 => IpVersion::V4,
            6 => IpVersion::V6,
            other => {
                return Err(MmdbError::InvalidDatabase(format!(
                    "ip_version {} (expected 4 or 6)",
                    other
                )))
            }
        };

        let major = require_uint(&map, "binary_format_major_version")? as u16;
        let minor = require_uint(&map, "binary_format_minor_version")? as u16;
        if major != 2 {
            return Err(MmdbError::UnknownDatabaseFormat(format!(
                "binary format version {}.{} (expected major version 2)",
                major, minor
            )));
        }
        let build_epoch = require_uint(&map, "build_epoch")?;

        let database_type = match map.remove("database_type") {
            Some(DataValue::String(s)) => s,
            Some(_) => {
                return Err(MmdbError::InvalidDatabase(
                    "database_type is not a string".to_string(),
                ))
            }
            None => String::new(),
        };

        let languages = match map.remove("languages") {
            Some(DataValue::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    DataValue::String(s) => Ok(s),
                    _ => Err(MmdbError::InvalidDatabase(
                        "languages entry is not a string".to_string(),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(MmdbError::InvalidDatabase(
                    "languages is not an array".to_string(),
                ))
            }
            None => Vec::new(),
        };

        let description = match map.remove("description") {
            Some(DataValue::Map(entries)) => entries
                .into_iter()
                .map(|(language, text)| match text {
                    DataValue::String(s) => Ok((language, s)),
                    _ => Err(MmdbError::InvalidDatabase(
                        "description entry is not a string".to_string(),
                    )),
                })
                .collect::<Result<HashMap<_, _>>>()?,
            Some(_) => {
                return Err(MmdbError::InvalidDatabase(
                    "description is not a map".to_string(),
                ))
            }
            None => HashMap::new(),
        };

        Ok(Metadata {
            node_count,
            record_size,
            ip_version,
            database_type,
            languages,
            binary_format_major_version: major,
            binary_format_minor_version: minor,
            build_epoch,
            description,
        })
    }

    /// Bytes per tree node (`record_size * 2 / 8`).
    pub fn full_record_byte_size(&self) -> usize {
        self.record_size.node_bytes()
    }

    /// Total search tree size in bytes.
    pub fn tree_size(&self) -> usize {
        self.node_count as usize * self.full_record_byte_size()
    }
}

/// Find the first metadata marker within the tail window.
///
/// Returns the offset of the marker itself within `data`.
pub(crate) fn find_metadata_marker(data: &[u8]) -> Result<usize> {
    let window_start = data.len().saturating_sub(METADATA_BLOCK_MAX_SIZE);
    memchr::memmem::find(&data[window_start..], METADATA_MARKER)
        .map(|i| window_start + i)
        .ok_or_else(|| {
            MmdbError::InvalidDatabase("metadata marker not found".to_string())
        })
}

fn require_uint(map: &HashMap<String, DataValue>, key: &str) -> Result<u64> {
    match map.get(key) {
        Some(DataValue::Uint16(n)) => Ok(*n as u64),
        Some(DataValue::Uint32(n)) => Ok(*n as u64),
        Some(DataValue::Uint64(n)) => Ok(*n),
        Some(_) => Err(MmdbError::InvalidDatabase(format!(
            "metadata field '{}' is not an unsigned integer",
            key
        ))),
        None => Err(MmdbError::InvalidDatabase(format!(
            "metadata field '{}' missing",
            key
        ))),
    }
}
