//! Low-level byte reading utilities

use byteorder::{BigEndian, ByteOrder};

/// Reads a big-endian unsigned number of 1 to 8 bytes.
///
/// Used for every length and code field in BGL blocks. Longer inputs keep
/// only their last 8 bytes, an empty input reads as zero.
pub fn read_number(bytes: &[u8]) -> u64 {
    match bytes.len() {
        0 => 0,
        n @ 1..=8 => BigEndian::read_uint(bytes, n),
        n => BigEndian::read_u64(&bytes[n - 8..]),
    }
}

/// Splits `n` bytes off the front of `reader` and advances it.
///
/// Returns `None` without advancing if fewer than `n` bytes remain.
pub fn take<'a>(reader: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if reader.len() < n {
        return None;
    }
    let (head, tail) = reader.split_at(n);
    *reader = tail;
    Some(head)
}

/// Reads a length prefix of `width` bytes followed by that many bytes.
pub fn take_prefixed<'a>(reader: &mut &'a [u8], width: usize) -> Option<&'a [u8]> {
    let mut probe = *reader;
    let len = read_number(take(&mut probe, width)?) as usize;
    let value = take(&mut probe, len)?;
    *reader = probe;
    Some(value)
}

/// Renders bytes as space-separated upper-case hex, for dumps.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
