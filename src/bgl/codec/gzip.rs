//! Decompression of the gzip member embedded in a BGL file.
//!
//! The member is inflated with `flate2`'s raw deflate decoder so the footer
//! can be verified by hand: some BGL producers write a zero CRC, so a CRC
//! mismatch is only a warning, while a wrong uncompressed size still means
//! the stream is corrupt.
//!
//! ```text
//! ┌──────────────┬─────────────────────┬───────────┬───────────┐
//! │ gzip header  │ deflate data        │ CRC32 LE  │ ISIZE LE  │
//! │ (10+ bytes)  │                     │ (4 bytes) │ (4 bytes) │
//! └──────────────┴─────────────────────┴───────────┴───────────┘
//! ```

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::Crc;
use flate2::bufread::DeflateDecoder;
use log::{debug, trace, warn};

use super::offset_source::OffsetSource;
use crate::bgl::types::error::{BglError, Result};

const GZ_MAGIC: [u8; 2] = [0x1F, 0x8B];
const GZ_METHOD_DEFLATE: u8 = 8;
const GZ_FHCRC: u8 = 0b0000_0010;
const GZ_FEXTRA: u8 = 0b0000_0100;
const GZ_FNAME: u8 = 0b0000_1000;
const GZ_FCOMMENT: u8 = 0b0001_0000;

const CHUNK_SIZE: usize = 32 * 1024;

/// Outcome of the footer check, available once the member has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterStatus {
    Verified,
    /// Stored CRC differs from the computed one. Decoding continued.
    CrcMismatch { stored: u32, computed: u32 },
    /// The source ended before the 8-byte footer.
    Missing,
}

/// Streaming reader over the decompressed bytes of one gzip member.
///
/// End of member is explicit: [`is_end_of_member`](Self::is_end_of_member)
/// probes the decoder instead of relying on a short read, and nothing past
/// the footer is ever consumed.
pub struct GzipMemberReader<R = std::fs::File> {
    decoder: Option<DeflateDecoder<BufReader<OffsetSource<R>>>>,
    crc: Crc,
    buf: Vec<u8>,
    pos: usize,
    /// Position in the decompressed stream.
    position: u64,
    footer: Option<FooterStatus>,
}

impl<R: Read + Seek> GzipMemberReader<R> {
    /// Parses the gzip header at position 0 of `source` and prepares inflation.
    pub fn new(source: OffsetSource<R>) -> Result<Self> {
        let mut input = BufReader::new(source);
        skip_header(&mut input)?;
        Ok(Self {
            decoder: Some(DeflateDecoder::new(input)),
            crc: Crc::new(),
            buf: Vec::with_capacity(CHUNK_SIZE),
            pos: 0,
            position: 0,
            footer: None,
        })
    }

    /// Position of the next byte in the decompressed stream.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Footer status, `None` while the member has not been read to its end.
    pub fn footer(&self) -> Option<FooterStatus> {
        self.footer
    }

    /// Returns `true` once every byte of the member has been consumed.
    ///
    /// May inflate the next chunk to find out, and verifies the footer when
    /// the deflate stream ends.
    pub fn is_end_of_member(&mut self) -> Result<bool> {
        Ok(!self.fill()?)
    }

    /// Appends up to `n` bytes to `out`, returning how many were appended.
    ///
    /// A count below `n` means the member ended.
    pub fn read_into(&mut self, out: &mut Vec<u8>, n: usize) -> Result<usize> {
        let mut remaining = n;
        while remaining > 0 && self.fill()? {
            let available = &self.buf[self.pos..];
            let count = available.len().min(remaining);
            out.extend_from_slice(&available[..count]);
            self.pos += count;
            self.position += count as u64;
            remaining -= count;
        }
        Ok(n - remaining)
    }

    /// Restarts decompression from the beginning of the member.
    pub fn rewind(&mut self) -> Result<()> {
        let decoder = self
            .decoder
            .take()
            .ok_or_else(|| BglError::InvalidFormat("Gzip reader is closed".to_string()))?;
        let mut input = decoder.into_inner();
        input.seek(SeekFrom::Start(0))?;
        skip_header(&mut input)?;
        self.decoder = Some(DeflateDecoder::new(input));
        self.crc.reset();
        self.buf.clear();
        self.pos = 0;
        self.position = 0;
        self.footer = None;
        trace!("Gzip member rewound");
        Ok(())
    }

    /// Releases the decoder and the underlying file. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.decoder.take().is_some() {
            debug!("Gzip member reader closed at position {}", self.position);
        }
        self.buf.clear();
        self.pos = 0;
    }

    /// Ensures unread bytes are buffered. Returns `false` at end of member.
    fn fill(&mut self) -> Result<bool> {
        if self.pos < self.buf.len() {
            return Ok(true);
        }
        if self.footer.is_some() {
            return Ok(false);
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(false);
        };

        self.buf.resize(CHUNK_SIZE, 0);
        let n = decoder.read(&mut self.buf).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => {
                BglError::Decompression(e.to_string())
            }
            _ => BglError::Io(e),
        })?;
        self.buf.truncate(n);
        self.pos = 0;

        if n == 0 {
            self.finish_member()?;
            return Ok(false);
        }
        self.crc.update(&self.buf);
        Ok(true)
    }

    /// Reads and checks the 8-byte footer after the deflate data.
    fn finish_member(&mut self) -> Result<()> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(());
        };
        let input = decoder.get_mut();
        let stored_crc = match input.read_u32::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!("Gzip member ended without footer at position {}", self.position);
                self.footer = Some(FooterStatus::Missing);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let stored_size = match input.read_u32::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!("Gzip footer truncated after CRC at position {}", self.position);
                self.footer = Some(FooterStatus::Missing);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let computed_crc = self.crc.sum();
        trace!(
            "Gzip footer: crc stored={:#010x} computed={:#010x}, size stored={} inflated={}",
            stored_crc, computed_crc, stored_size, self.position
        );

        let status = if stored_crc != computed_crc {
            warn!("CRC check failed {:#x} != {:#x}", stored_crc, computed_crc);
            FooterStatus::CrcMismatch {
                stored: stored_crc,
                computed: computed_crc,
            }
        } else if stored_size != self.position as u32 {
            return Err(BglError::SizeMismatch {
                expected: stored_size,
                found: self.position as u32,
            });
        } else {
            FooterStatus::Verified
        };
        self.footer = Some(status);
        Ok(())
    }
}

/// Skips the gzip member header, leaving `input` at the first deflate byte.
fn skip_header<B: BufRead>(input: &mut B) -> Result<()> {
    let mut fixed = [0u8; 10];
    input
        .read_exact(&mut fixed)
        .map_err(|e| BglError::InvalidGzipHeader(format!("truncated header: {}", e)))?;
    if fixed[0..2] != GZ_MAGIC {
        return Err(BglError::InvalidGzipHeader(format!(
            "bad magic {:02x} {:02x}",
            fixed[0], fixed[1]
        )));
    }
    if fixed[2] != GZ_METHOD_DEFLATE {
        return Err(BglError::InvalidGzipHeader(format!(
            "unknown compression method {}",
            fixed[2]
        )));
    }

    let flags = fixed[3];
    if flags & GZ_FEXTRA != 0 {
        let xlen = input.read_u16::<LittleEndian>()?;
        let skipped = io::copy(&mut input.by_ref().take(xlen as u64), &mut io::sink())?;
        if skipped != xlen as u64 {
            return Err(BglError::InvalidGzipHeader("truncated FEXTRA field".to_string()));
        }
    }
    if flags & GZ_FNAME != 0 {
        input.read_until(0, &mut Vec::new())?;
    }
    if flags & GZ_FCOMMENT != 0 {
        input.read_until(0, &mut Vec::new())?;
    }
    if flags & GZ_FHCRC != 0 {
        input.read_u16::<LittleEndian>()?;
    }
    trace!("Gzip header parsed, flags={:#04x}", flags);
    Ok(())
}
