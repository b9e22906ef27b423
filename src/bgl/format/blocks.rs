//! Framing of the decompressed stream into blocks.
//!
//! # Block Header
//! ```text
//! byte 0: [ selector : 4 bits ][ type : 4 bits ]
//!
//! selector 0-3 → length in the next (selector + 1) bytes, big-endian
//! selector 4-15 → length = selector - 4, no extra bytes
//! ```
//! The payload of `length` bytes follows the header.

use std::io::{Read, Seek};

use log::{debug, error, trace};

use crate::bgl::codec::gzip::{FooterStatus, GzipMemberReader};
use crate::bgl::types::error::Result;
use crate::bgl::types::models::Block;
use crate::bgl::utils;

/// Result of one [`BlockReader::read_block`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The block was filled.
    Block,
    /// The gzip member has no more bytes.
    EndOfStream,
    /// The header or payload was cut short. The cursor can no longer be
    /// trusted, so the caller stops scanning.
    Truncated,
}

/// Reads length-prefixed, type-tagged blocks from the gzip member.
pub struct BlockReader<R = std::fs::File> {
    gzip: GzipMemberReader<R>,
    scratch: Vec<u8>,
}

impl<R: Read + Seek> BlockReader<R> {
    pub fn new(gzip: GzipMemberReader<R>) -> Self {
        Self {
            gzip,
            scratch: Vec::with_capacity(4),
        }
    }

    /// Refills `block` with the next block of the stream.
    ///
    /// `Err` is reserved for failures of the gzip layer itself (corrupt
    /// deflate data, wrong uncompressed size, I/O).
    pub fn read_block(&mut self, block: &mut Block) -> Result<ReadStatus> {
        block.data.clear();
        block.offset = self.gzip.tell();
        if self.gzip.is_end_of_member()? {
            return Ok(ReadStatus::EndOfStream);
        }

        let Some(header) = self.read_number(1)? else {
            debug!("readBlock: end of stream at {:#X}", block.offset);
            return Ok(ReadStatus::EndOfStream);
        };
        block.block_type = (header & 0x0F) as u8;
        let selector = header >> 4;
        let length = if selector < 4 {
            match self.read_number(selector as usize + 1)? {
                Some(len) => len,
                None => {
                    error!("readBlock[{:#X}]: truncated length field", block.offset);
                    return Ok(ReadStatus::Truncated);
                }
            }
        } else {
            selector - 4
        };
        let length = length as usize;

        if length > 0 {
            let read = self.gzip.read_into(&mut block.data, length)?;
            if read != length {
                error!(
                    "readBlock[{:#X}]: failed to read block data: length={}, read={}",
                    block.offset, length, read
                );
                block.data.clear();
                return Ok(ReadStatus::Truncated);
            }
        }
        trace!("{}", block);
        Ok(ReadStatus::Block)
    }

    /// Returns `true` once the gzip member is exhausted.
    pub fn is_end_of_stream(&mut self) -> Result<bool> {
        self.gzip.is_end_of_member()
    }

    /// Restarts the scan at the first block.
    pub fn rewind(&mut self) -> Result<()> {
        self.gzip.rewind()
    }

    pub fn tell(&self) -> u64 {
        self.gzip.tell()
    }

    pub fn footer(&self) -> Option<FooterStatus> {
        self.gzip.footer()
    }

    pub fn close(&mut self) {
        self.gzip.close();
    }

    /// Reads a big-endian number of `width` bytes, `None` on a short read.
    fn read_number(&mut self, width: usize) -> Result<Option<u64>> {
        self.scratch.clear();
        let read = self.gzip.read_into(&mut self.scratch, width)?;
        if read != width {
            if read > 0 {
                error!("readBytes: to read bytes = {}, actually read bytes = {}", width, read);
            }
            return Ok(None);
        }
        Ok(Some(utils::read_number(&self.scratch)))
    }
}
