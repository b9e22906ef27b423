//! Core data structures for BGL format components.
//!
//! This module defines the fundamental types used throughout the library:
//! - Blocks of the decompressed container stream
//! - Decoded entries and dictionary properties
//! - The resolved text encodings of a session

use std::fmt;

use encoding_rs::Encoding;
use time::PrimitiveDateTime;
use time::macros::format_description;

/// Block types that carry a dictionary entry.
pub const ENTRY_BLOCK_TYPES: [u8; 5] = [1, 7, 10, 11, 13];

/// One length-prefixed, type-tagged unit of the decompressed stream.
///
/// A single instance is refilled on every read, so `data` keeps its
/// allocation across the whole scan.
#[derive(Debug, Default, Clone)]
pub struct Block {
    /// Low four bits of the header byte (0-15).
    pub block_type: u8,
    pub data: Vec<u8>,
    /// Offset of the header byte in the decompressed stream, for diagnostics.
    pub offset: u64,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        BlockKind::from(self.block_type)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Block type={}, len(data)={}, offset={:#X}",
            self.block_type,
            self.data.len(),
            self.offset
        )
    }
}

/// Consumer path selected by a block's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Type 0: entry-count hint or default charset.
    Metadata,
    /// Types 1, 7, 10, 11, 13.
    Entry,
    /// Type 2: embedded file.
    Resource,
    /// Type 3: one dictionary property.
    Info,
    Unknown,
}

impl From<u8> for BlockKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Metadata,
            2 => Self::Resource,
            3 => Self::Info,
            t if ENTRY_BLOCK_TYPES.contains(&t) => Self::Entry,
            _ => Self::Unknown,
        }
    }
}

/// A decoded dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub word: String,
    /// Sorted, duplicate-free, never contains `word`.
    pub alternates: Vec<String>,
    /// Formatted HTML definition.
    pub definition: String,
}

/// Text encodings of a decoding session.
///
/// Resolved once after the first metadata pass and frozen afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encodings {
    pub source: &'static Encoding,
    pub target: &'static Encoding,
    pub default: &'static Encoding,
}

impl Default for Encodings {
    fn default() -> Self {
        Self {
            source: encoding_rs::WINDOWS_1252,
            target: encoding_rs::WINDOWS_1252,
            default: encoding_rs::WINDOWS_1252,
        }
    }
}

/// Value of a dictionary property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    Text(String),
    Integer(u64),
    Flag(bool),
    Date(PrimitiveDateTime),
    Bytes(Vec<u8>),
    /// Text property whose encoding is not known yet. Only present between
    /// the first metadata pass and encoding resolution.
    Undecoded(Vec<u8>),
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InfoValue::Text(s) => f.write_str(s),
            InfoValue::Integer(n) => write!(f, "{}", n),
            InfoValue::Flag(b) => write!(f, "{}", b),
            InfoValue::Date(d) => {
                let format = format_description!("[year]/[month]/[day], [hour]:[minute]");
                let text = d.format(&format).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
            InfoValue::Bytes(b) | InfoValue::Undecoded(b) => {
                f.write_str(&String::from_utf8_lossy(b))
            }
        }
    }
}

/// One element of a [`BlockSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRun {
    /// Consecutive entry or resource blocks of the same type.
    Run { block_type: u8, count: u64 },
    /// Any other block, with its payload length.
    Single { block_type: u8, len: usize },
}

/// Layout of the block stream, with entry and resource blocks collapsed into runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub gzip_offset: u16,
    pub num_blocks: u64,
    pub num_entries: u64,
    pub num_files: u64,
    pub blocks: Vec<BlockRun>,
}
