//! Streaming access to decoded entries.
//!
//! # Example
//! ```no_run
//! # use bgl_reader::{BglOptions, BglReader};
//! let mut reader = BglReader::open("dict.bgl", BglOptions::default()).unwrap();
//! for entry in reader.entries().unwrap() {
//!     let entry = entry.unwrap();
//!     println!("{}: {}", entry.word, entry.definition);
//! }
//! ```

use log::debug;

use super::format::blocks::ReadStatus;
use super::format::entry::{EntryDecoder, EntryOutcome};
use super::reader::BglReader;
use super::types::error::Result;
use super::types::models::{Block, BlockKind, Entry};

/// Iterator over the entries of a [`BglReader`].
///
/// Malformed entry blocks are skipped and recorded in the reader's
/// diagnostics. `Err` is only yielded for failures of the gzip layer, after
/// which the iterator is exhausted.
///
/// Created by [`BglReader::entries()`](crate::BglReader::entries).
pub struct EntryIterator<'a> {
    reader: &'a mut BglReader,
    block: Block,
    done: bool,
}

impl<'a> EntryIterator<'a> {
    pub(super) fn new(reader: &'a mut BglReader) -> Self {
        Self {
            reader,
            block: Block::default(),
            done: false,
        }
    }
}

impl Iterator for EntryIterator<'_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (blocks, encodings, options, diagnostics) = self.reader.parts_mut();
        loop {
            match blocks.read_block(&mut self.block) {
                Ok(ReadStatus::Block) => {}
                Ok(status) => {
                    debug!("Entry scan finished: {:?}", status);
                    diagnostics.set_footer(blocks.footer());
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
            if self.block.data.is_empty() || self.block.kind() != BlockKind::Entry {
                continue;
            }
            match EntryDecoder::new(encodings, options, diagnostics).decode(&self.block) {
                EntryOutcome::Entry(entry) => return Some(Ok(entry)),
                EntryOutcome::Skip(_) => continue,
            }
        }
    }
}
