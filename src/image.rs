//! File image ownership for opened databases
//!
//! An opened database holds its bytes one of two ways: a read-only shared
//! memory map (the default, loads in ~1ms regardless of file size) or a
//! heap copy (memory-cache mode, or forced when the file is gzip-compressed
//! and cannot be mapped). The sum type makes teardown dispatch on drop use
//! the matching release automatically.

use crate::error::MmdbError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How to load the database file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Memory-map the file read-only shared (default)
    #[default]
    Mmap,
    /// Read the whole file into a private heap buffer
    MemoryCache,
}

/// The bytes of an opened database
///
/// Either an OS mapping or a heap copy; immutable for its whole lifetime.
#[derive(Debug)]
pub(crate) enum FileImage {
    /// OS memory mapping, released by munmap on drop
    Mmap(Mmap),
    /// Heap copy, released by the allocator on drop
    Heap(Vec<u8>),
}

impl FileImage {
    /// Load the file at `path` according to `mode`.
    ///
    /// Gzip-compressed databases never come through here; they are inflated
    /// up front and arrive as a ready-made heap image.
    pub(crate) fn load(path: &Path, mode: Mode) -> Result<Self, MmdbError> {
        let mut file =
            File::open(path).map_err(|e| MmdbError::FileOpen(format!("{}: {}", path.display(), e)))?;

        match mode {
            Mode::MemoryCache => {
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)
                    .map_err(|e| MmdbError::Io(format!("read {}: {}", path.display(), e)))?;
                Ok(FileImage::Heap(buf))
            }
            Mode::Mmap => {
                let mmap = unsafe { Mmap::map(&file) }
                    .map_err(|e| MmdbError::Io(format!("mmap {}: {}", path.display(), e)))?;
                Ok(FileImage::Mmap(mmap))
            }
        }
    }

    /// The full image as a byte slice.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            FileImage::Mmap(m) => &m[..],
            FileImage::Heap(v) => v.as_slice(),
        }
    }

    /// Image length in bytes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// Inflate a gzip-compressed database into a heap buffer.
///
/// A compressed stream has no seekable tail and no mappable layout, so the
/// whole file is inflated and the result is treated as a memory-cache
/// image.
pub(crate) fn gunzip_file(path: &Path) -> Result<Vec<u8>, MmdbError> {
    let file =
        File::open(path).map_err(|e| MmdbError::FileOpen(format!("{}: {}", path.display(), e)))?;
    let mut buf = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut buf)
        .map_err(|e| MmdbError::Io(format!("gzip read {}: {}", path.display(), e)))?;
    Ok(buf)
}

/// Extension-based gzip sniff, case-insensitive.
pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
