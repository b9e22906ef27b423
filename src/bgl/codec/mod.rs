//! Codec layer for byte sources, decompression and text decoding.
//!
//! # Submodules
//!
//! - [`offset_source`][]: Windowed file access starting at the gzip member
//! - [`gzip`][]: Inflation of the embedded gzip member with a relaxed CRC check
//! - [`charset`][]: Encoding label lookup and lossy/strict text decoding

pub mod charset;
pub mod gzip;
pub mod offset_source;
