//! mmdblite - Read-only MaxMind DB (MMDB) reader
//!
//! mmdblite opens MMDB files (GeoLite2, GeoIP2, or anything else speaking
//! binary format major version 2) and answers longest-prefix lookups for
//! IPv4 and IPv6 addresses with the structured record stored for the
//! matching network.
//!
//! # Quick Start
//!
//! ```no_run
//! use mmdblite::{Database, PathElement};
//!
//! let db = Database::open("GeoLite2-Country.mmdb")?;
//!
//! if let Some(entry) = db.lookup("1.1.1.1")? {
//!     // Navigate the record without materializing it
//!     let iso = db.get_value(
//!         &entry,
//!         &[PathElement::Key("country"), PathElement::Key("iso_code")],
//!     )?;
//!     println!("matched /{}: {:?}", entry.prefix_len, iso);
//!
//!     // Or decode the whole record into an owned value
//!     let record = db.entry_value(&entry)?;
//!     println!("{}", serde_json::to_string(&record)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  MMDB File Layout                       │
//! ├─────────────────────────────────────────┤
//! │  1. Search Tree (binary trie over bits) │
//! │  2. Separator (16 zero bytes)           │
//! │  3. Data Section (tagged elements, DAG) │
//! │  4. Metadata Marker + Metadata Map      │
//! └─────────────────────────────────────────┘
//!          ↓ mmap() syscall (~1ms)
//! ┌─────────────────────────────────────────┐
//! │  Memory (read-only, shared)             │
//! │  Lookups walk bits, then decode lazily  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! A lookup walks one tree bit per address bit until it lands on a data
//! offset, then the decoder reads the record straight out of the mapped
//! bytes: strings come back as borrowed slices, and nothing is copied
//! until you ask for an owned [`DataValue`].
//!
//! # Key Properties
//!
//! - **Zero-copy**: records borrow the file image; open is ~1ms at any size
//! - **Concurrent**: a handle is immutable and `Sync`, share it freely
//! - **Bounded**: malformed files surface as errors, never out-of-range reads
//! - **Two image modes**: mmap (default) or a private heap copy
//! - **Gzip aware**: `.mmdb.gz` files are inflated transparently

#![warn(missing_docs)]
#![warn(clippy::all)]

mod addr;
/// Database handle: open, lookup, lifecycle
pub mod database;
/// Data section decoding and path navigation
pub mod decode;
mod endian;
/// Error types and the stable error-code taxonomy
pub mod error;
mod image;
/// Record materialization and pretty-printing
pub mod list;
/// Metadata block parsing
pub mod metadata;
/// Search tree traversal
pub mod tree;
/// Owned, fully-resolved data values
pub mod value;

pub use crate::database::Database;
pub use crate::decode::{DataRecord, Decoder, Field, PathElement};
pub use crate::error::{strerror, AddressError, ErrorCode, LookupError, MmdbError};
pub use crate::image::Mode;
pub use crate::list::dump;
pub use crate::metadata::{IpVersion, Metadata, RecordSize, METADATA_MARKER};
pub use crate::tree::LookupResult;
pub use crate::value::DataValue;

/// Library version string.
pub fn lib_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
