//! # bgl-reader
//!
//! A reader for Babylon glossary files (`.bgl`).
//!
//! Decodes the embedded gzip member, the dictionary properties, the
//! embedded resource files and the entries, with their part of speech,
//! titles and transcriptions formatted as HTML.
pub mod bgl;

// Re-export the main types for convenience
pub use bgl::{
    BglError, BglOptions, BglReader, Glossary, Result,
    diagnostics::{DefinitionStats, Diagnostics},
    format::metadata::MetaInfo,
    models::{BlockRun, BlockSummary, Encodings, Entry, InfoValue},
};
