//! Parsing of the BGL container and its block stream.
//!
//! # Module Organization
//!
//! - [`header`]: Container signature and gzip offset
//! - [`blocks`]: Framing of the decompressed stream into typed blocks
//! - [`metadata`], [`info`], [`language`]: Dictionary properties and resources
//! - [`resolver`]: Source/target/default encoding selection
//! - [`entry`], [`fields`], [`charset_tags`], [`pos`]: Entry blocks
//!
//! # Architecture
//!
//! ```text
//! blocks ──┬──► metadata (pass 1) ──► resolver ──► metadata (pass 2)
//!          │
//!          └──► entry ──► fields ──► charset_tags ──► text
//! ```

pub mod blocks;
pub mod charset_tags;
pub mod entry;
pub mod fields;
pub mod header;
pub mod info;
pub mod language;
pub mod metadata;
pub mod pos;
pub mod resolver;
