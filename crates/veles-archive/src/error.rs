//! Error types for the archive crate.

use thiserror::Error;

/// Errors that can occur when working with BSA/BA2 archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// First four bytes match neither BSA nor BA2.
    #[error("unrecognized archive magic: {0:?}")]
    UnrecognizedMagic([u8; 4]),

    /// Unsupported BSA version.
    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u32),

    /// Unsupported BA2 format tag (only general archives are handled).
    #[error("unsupported BA2 format: {}", String::from_utf8_lossy(.0))]
    UnsupportedFormat([u8; 4]),

    /// Stored data range lies outside the archive.
    #[error("entry data out of bounds: offset {offset} + {len} exceeds archive size {archive_len}")]
    DataOutOfBounds {
        offset: u64,
        len: u64,
        archive_len: u64,
    },

    /// Entry not found.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
