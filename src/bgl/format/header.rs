//! BGL container signature.
//!
//! ```text
//! [4 bytes] Magic: 12 34 00 01 or 12 34 00 02
//! [2 bytes] Offset of the embedded gzip member (big-endian u16, >= 6)
//! ```

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, error};

use crate::bgl::types::error::{BglError, Result};

/// Recognised magic numbers.
pub const BGL_MAGICS: [[u8; 4]; 2] = [[0x12, 0x34, 0x00, 0x01], [0x12, 0x34, 0x00, 0x02]];

/// Size of the signature; the gzip member can never start before it.
pub const SIGNATURE_LEN: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BglSignature {
    pub magic: [u8; 4],
    pub gzip_offset: u16,
}

/// Reads and validates the 6-byte signature at the start of `file`.
pub fn parse<R: Read>(file: &mut R) -> Result<BglSignature> {
    let mut magic = [0u8; 4];
    if let Err(e) = file.read_exact(&mut magic) {
        error!("BGL signature truncated: {}", e);
        return Err(BglError::InvalidSignature(Vec::new()));
    }
    if !BGL_MAGICS.contains(&magic) {
        error!("invalid header: {:02x?}", magic);
        return Err(BglError::InvalidSignature(magic.to_vec()));
    }

    let gzip_offset = file
        .read_u16::<BigEndian>()
        .map_err(|_| BglError::InvalidSignature(magic.to_vec()))?;
    debug!("Position of gz header: {}", gzip_offset);
    if gzip_offset < SIGNATURE_LEN {
        error!("invalid gzip header position: {}", gzip_offset);
        return Err(BglError::InvalidGzipOffset(gzip_offset));
    }

    Ok(BglSignature { magic, gzip_offset })
}
