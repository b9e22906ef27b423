//! Babylon BGL dictionary decoder.
//!
//! # Layers
//! ```text
//! .bgl file
//! ┌──────────────────┐
//! │ signature (6 B)  │ ← format::header
//! ├──────────────────┤
//! │ gzip member      │ ← codec::offset_source + codec::gzip
//! │  └ block stream  │ ← format::blocks
//! │     ├ type 0, 3  │ ← format::metadata, format::info
//! │     ├ type 2     │ ← resources
//! │     └ entries    │ ← format::entry, format::fields, format::charset_tags
//! └──────────────────┘
//! ```
//! [`BglReader`](reader::BglReader) drives the layers; [`text`] holds the
//! cleanup routines shared by keys and definitions.

pub mod codec;
pub mod diagnostics;
pub mod format;
pub mod iter;
pub mod reader;
pub mod resources;
pub mod text;
pub mod types;
pub mod utils;

pub use reader::{BglReader, Glossary};
pub use types::error::{BglError, Result};
pub use types::models;
pub use types::options::BglOptions;
