//! Custom error types for the bgl-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Only conditions that make the whole decode untrustworthy are errors.
/// Malformed entries and trailing fields are skipped and recorded in
/// [`Diagnostics`](crate::bgl::diagnostics::Diagnostics) instead.
#[derive(Debug, Error)]
pub enum BglError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The first four bytes are not one of the known BGL magic numbers.
    #[error("Invalid BGL signature: {0:02x?}")]
    InvalidSignature(Vec<u8>),

    /// The gzip offset stored in the signature points inside the signature.
    #[error("Invalid gzip header position: {0} (must be >= 6)")]
    InvalidGzipOffset(u16),

    /// The embedded gzip member does not start with a valid header.
    #[error("Invalid gzip header: {0}")]
    InvalidGzipHeader(String),

    /// The uncompressed size stored in the gzip footer does not match the data produced.
    #[error("Incorrect length of data produced: footer says {expected} bytes, inflated {found} bytes")]
    SizeMismatch { expected: u32, found: u32 },

    /// The deflate stream itself is corrupt.
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// An encoding override label could not be resolved.
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Neither the requested nor the fallback resource directory could be created.
    #[error("Cannot create resource directory {path}: {source}")]
    ResourceDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is structurally invalid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// A convenience `Result` type alias using the crate's `BglError` type.
pub type Result<T> = std::result::Result<T, BglError>;
