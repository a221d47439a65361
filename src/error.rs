//! Error types for the mmdblite library
//!
//! Two families of failures exist. [`MmdbError`] covers everything the
//! library itself can get wrong: opening, format validation, and decoding.
//! [`AddressError`] covers the caller handing us a string that does not
//! resolve to an address the database can hold; it is deliberately a
//! separate type so callers can tell a bad input from a bad database.
//!
//! Every [`MmdbError`] maps onto a stable integer taxonomy via
//! [`MmdbError::code`], and [`strerror`] turns any code back into a fixed
//! English message.

use std::fmt;
use std::io;

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, MmdbError>;

/// Stable integer error taxonomy
///
/// The discriminants are part of the public contract and never change.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Operation completed
    Success = 0,
    /// The database file could not be opened
    FileOpenError = 1,
    /// The database content is structurally damaged
    CorruptDatabase = 2,
    /// The file is not an MMDB database
    InvalidDatabase = 3,
    /// Reading the file failed
    IoError = 4,
    /// An allocation failed
    OutOfMemory = 5,
    /// The database uses a format variant this library does not speak
    UnknownDatabaseFormat = 6,
}

impl ErrorCode {
    /// Fixed English message for this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::FileOpenError => "Error opening database file",
            ErrorCode::CorruptDatabase => "Corrupt database",
            ErrorCode::InvalidDatabase => "Invalid database",
            ErrorCode::IoError => "IO error",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::UnknownDatabaseFormat => "Unknown database format",
        }
    }
}

/// Static human-readable message for an integer error code.
///
/// Codes outside the taxonomy get a fixed fallback string.
pub fn strerror(code: i32) -> &'static str {
    match code {
        0 => ErrorCode::Success.message(),
        1 => ErrorCode::FileOpenError.message(),
        2 => ErrorCode::CorruptDatabase.message(),
        3 => ErrorCode::InvalidDatabase.message(),
        4 => ErrorCode::IoError.message(),
        5 => ErrorCode::OutOfMemory.message(),
        6 => ErrorCode::UnknownDatabaseFormat.message(),
        _ => "Unknown error",
    }
}

/// Main error type for database operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MmdbError {
    /// The database file could not be opened
    FileOpen(String),

    /// Structural damage detected while walking the tree or decoding data
    CorruptDatabase(String),

    /// The file is not an MMDB database (missing marker, bad metadata)
    InvalidDatabase(String),

    /// Read or mapping failure
    Io(String),

    /// Unsupported record size or binary format version
    UnknownDatabaseFormat(String),
}

impl MmdbError {
    /// The stable integer code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MmdbError::FileOpen(_) => ErrorCode::FileOpenError,
            MmdbError::CorruptDatabase(_) => ErrorCode::CorruptDatabase,
            MmdbError::InvalidDatabase(_) => ErrorCode::InvalidDatabase,
            MmdbError::Io(_) => ErrorCode::IoError,
            MmdbError::UnknownDatabaseFormat(_) => ErrorCode::UnknownDatabaseFormat,
        }
    }
}

impl fmt::Display for MmdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MmdbError::FileOpen(msg) => write!(f, "Error opening database file: {}", msg),
            MmdbError::CorruptDatabase(msg) => write!(f, "Corrupt database: {}", msg),
            MmdbError::InvalidDatabase(msg) => write!(f, "Invalid database: {}", msg),
            MmdbError::Io(msg) => write!(f, "IO error: {}", msg),
            MmdbError::UnknownDatabaseFormat(msg) => {
                write!(f, "Unknown database format: {}", msg)
            }
        }
    }
}

impl std::error::Error for MmdbError {}

impl From<io::Error> for MmdbError {
    fn from(err: io::Error) -> Self {
        MmdbError::Io(err.to_string())
    }
}

/// Address resolution failure
///
/// Produced when an IP string cannot be turned into lookup bytes for the
/// opened database. Kept apart from [`MmdbError`]: the database is fine,
/// the input is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The string is not a numeric IPv4 or IPv6 address
    Parse(String),

    /// The address family does not fit the database
    ///
    /// Looking up an IPv6 address in an IPv4-only database.
    Family(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::Parse(msg) => write!(f, "Invalid IP address: {}", msg),
            AddressError::Family(msg) => write!(f, "Address family mismatch: {}", msg),
        }
    }
}

impl std::error::Error for AddressError {}

/// Error from a string lookup: either the input or the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The IP string did not resolve (caller-side)
    Address(AddressError),

    /// The database misbehaved (library-side)
    Database(MmdbError),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Address(e) => write!(f, "{}", e),
            LookupError::Database(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Address(e) => Some(e),
            LookupError::Database(e) => Some(e),
        }
    }
}

impl From<AddressError> for LookupError {
    fn from(err: AddressError) -> Self {
        LookupError::Address(err)
    }
}

impl From<MmdbError> for LookupError {
    fn from(err: MmdbError) -> Self {
        LookupError::Database(err)
    }
}
