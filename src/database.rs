//! Database handle: open, lookup, lifecycle
//!
//! Opening reads the metadata block from the tail of the file first, so a
//! file that is not an MMDB database fails fast before any mapping work.
//! Only then is the image acquired, either as a read-only shared mapping
//! (default) or a heap copy. The handle is immutable from that point on
//! and safe to share across threads; every lookup only reads the image and
//! writes into its own result values. Teardown is `Drop`: the map is
//! unmapped or the buffer freed according to how the image was acquired.

use crate::addr;
use crate::decode::{DataRecord, Decoder, PathElement, DATA_SECTION_SEPARATOR_SIZE};
use crate::error::{LookupError, MmdbError, Result};
use crate::image::{gunzip_file, is_gzip, FileImage, Mode};
use crate::metadata::{find_metadata_marker, Metadata, METADATA_BLOCK_MAX_SIZE, METADATA_MARKER};
use crate::tree::{LookupResult, SearchTree};
use crate::value::DataValue;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::net::IpAddr;
use std::path::Path;

/// An opened, immutable MMDB database
///
/// # Examples
///
/// ```no_run
/// use mmdblite::{Database, PathElement};
///
/// let db = Database::open("GeoLite2-Country.mmdb")?;
/// if let Some(entry) = db.lookup("1.1.1.1")? {
///     let iso = db.get_value(
///         &entry,
///         &[PathElement::Key("country"), PathElement::Key("iso_code")],
///     )?;
///     println!("/{} -> {:?}", entry.prefix_len, iso);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Thread safety
///
/// `Database` is `Send + Sync`. The image never changes after open, the
/// metadata is frozen, and lookups carry no shared mutable state, so any
/// number of threads may query one handle concurrently.
#[derive(Debug)]
pub struct Database {
    image: FileImage,
    metadata: Metadata,
    tree_size: usize,
    data_start: usize,
}

impl Database {
    /// Open a database file, memory-mapping it read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_mode(path, Mode::Mmap)
    }

    /// Open a database file with an explicit image mode.
    ///
    /// `Mode::MemoryCache` copies the whole file onto the heap instead of
    /// mapping it. A `.gz`-suffixed file is inflated and always held on
    /// the heap, whatever the mode says.
    pub fn open_with_mode<P: AsRef<Path>>(path: P, mode: Mode) -> Result<Self> {
        let path = path.as_ref();
        if is_gzip(path) {
            return Self::from_bytes(gunzip_file(path)?);
        }

        // Metadata comes out of the tail window before the image is
        // acquired; a non-database fails here without any mapping work.
        let mut file = File::open(path)
            .map_err(|e| MmdbError::FileOpen(format!("{}: {}", path.display(), e)))?;
        let file_size = file
            .metadata()
            .map_err(|e| MmdbError::Io(format!("stat {}: {}", path.display(), e)))?
            .len() as usize;

        let to_read = file_size.min(METADATA_BLOCK_MAX_SIZE);
        let mut tail = vec![0u8; to_read];
        file.seek(SeekFrom::End(-(to_read as i64)))
            .map_err(|e| MmdbError::Io(format!("seek {}: {}", path.display(), e)))?;
        file.read_exact(&mut tail)
            .map_err(|e| MmdbError::Io(format!("read {}: {}", path.display(), e)))?;
        drop(file);

        let metadata = parse_tail_metadata(&tail)?;
        let image = FileImage::load(path, mode)?;
        Self::from_parts(image, metadata)
    }

    /// Open a database already held in memory.
    ///
    /// The buffer becomes the image; nothing further is read from disk.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let metadata = parse_tail_metadata(&bytes)?;
        Self::from_parts(FileImage::Heap(bytes), metadata)
    }

    fn from_parts(image: FileImage, metadata: Metadata) -> Result<Self> {
        let tree_size = metadata.tree_size();
        let data_start = tree_size + DATA_SECTION_SEPARATOR_SIZE as usize;
        if data_start > image.len() {
            return Err(MmdbError::InvalidDatabase(format!(
                "search tree of {} nodes extends past the end of the file ({} bytes)",
                metadata.node_count,
                image.len()
            )));
        }

        Ok(Database {
            image,
            metadata,
            tree_size,
            data_start,
        })
    }

    /// The decoded database metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up an IP address given as a string.
    ///
    /// The string must be a numeric IPv4 or IPv6 address; resolution
    /// failures come back as [`LookupError::Address`], never as a database
    /// error. `Ok(None)` means the database holds no data for the address.
    pub fn lookup(&self, ipstr: &str) -> std::result::Result<Option<LookupResult>, LookupError> {
        let address = addr::resolve(ipstr, self.metadata.ip_version)?;
        self.lookup_bytes(address.as_slice()).map_err(LookupError::from)
    }

    /// Look up an already-parsed IP address.
    pub fn lookup_ip(&self, ip: IpAddr) -> std::result::Result<Option<LookupResult>, LookupError> {
        let address = addr::for_database(ip, self.metadata.ip_version)?;
        self.lookup_bytes(address.as_slice()).map_err(LookupError::from)
    }

    fn lookup_bytes(&self, address: &[u8]) -> Result<Option<LookupResult>> {
        let tree = SearchTree::new(
            &self.image.as_slice()[..self.tree_size],
            self.metadata.node_count,
            self.metadata.record_size,
        );
        match tree.lookup(address)? {
            Some(result) => {
                if result.data_offset as usize >= self.data_section().len() {
                    return Err(MmdbError::CorruptDatabase(format!(
                        "entry offset {} past end of data section ({} bytes)",
                        result.data_offset,
                        self.data_section().len()
                    )));
                }
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Navigate an entry's decoded tree by `path`.
    ///
    /// `Ok(None)` when the path names nothing; see
    /// [`Decoder::get_value`](crate::decode::Decoder::get_value).
    pub fn get_value(
        &self,
        entry: &LookupResult,
        path: &[PathElement<'_>],
    ) -> Result<Option<DataRecord<'_>>> {
        self.decoder().get_value(entry.data_offset, path)
    }

    /// Materialize an entry into its preorder element sequence.
    pub fn entry_data_list(&self, entry: &LookupResult) -> Result<Vec<DataRecord<'_>>> {
        self.decoder().entry_data_list(entry.data_offset)
    }

    /// Decode an entry into an owned [`DataValue`].
    pub fn entry_value(&self, entry: &LookupResult) -> Result<DataValue> {
        self.decoder().decode_value(entry.data_offset)
    }

    /// A decoder over this database's data section.
    ///
    /// Offsets handed to it are data-section-relative, exactly what
    /// [`LookupResult::data_offset`] and [`DataRecord::offset`] hold.
    pub fn decoder(&self) -> Decoder<'_> {
        Decoder::new(self.data_section())
    }

    fn data_section(&self) -> &[u8] {
        &self.image.as_slice()[self.data_start..]
    }
}

/// Locate the marker in a tail buffer and parse the metadata after it.
fn parse_tail_metadata(tail: &[u8]) -> Result<Metadata> {
    let marker_at = find_metadata_marker(tail)?;
    Metadata::parse(&tail[marker_at + METADATA_MARKER.len()..])
}
