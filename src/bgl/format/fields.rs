//! Trailing fields of a definition payload.
//!
//! # Layout
//! ```text
//! <main definition> [ 0x14 ( <tag> <value> )* ]
//! ```
//!
//! | tag       | value                                      |
//! |-----------|--------------------------------------------|
//! | 0x02      | part-of-speech code (1 byte)               |
//! | 0x06      | 1 opaque byte                              |
//! | 0x07      | 2 opaque bytes                             |
//! | 0x13      | u8 length + opaque bytes                   |
//! | 0x18      | u8 length + entry title                    |
//! | 0x1A      | u8 length + opaque text                    |
//! | 0x28      | u16 length + title with transcription      |
//! | 0x40-0x4F | 1 byte + (tag - 0x3F) opaque bytes         |
//! | 0x50      | sub-code + u8 length + transcription       |
//! | 0x60      | sub-code + u16 length + transcription      |
//!
//! A `0x14` followed by a space is treated as article text and the search
//! for the marker continues after it.

use log::debug;

use super::pos;
use crate::bgl::utils;

const FIELDS_MARKER: u8 = 0x14;

/// Why trailing-field parsing stopped before the end of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStop {
    UnknownTag(u8),
    UnknownPartOfSpeech(u8),
    /// The value of this tag runs past the end of the payload.
    Truncated(u8),
}

/// A transcription value and its sub-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transcription<'a> {
    pub code: u8,
    pub data: &'a [u8],
}

/// Pieces of one definition payload, borrowed from the block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionFields<'a> {
    /// Main definition, always present (may be empty).
    pub defi: &'a [u8],
    pub part_of_speech_code: Option<u8>,
    pub part_of_speech: Option<&'static str>,
    pub title: Option<&'a [u8]>,
    pub title_trans: Option<&'a [u8]>,
    pub transcription_50: Option<Transcription<'a>>,
    pub transcription_60: Option<Transcription<'a>>,
    pub field_06: Option<u8>,
    pub field_07: Option<&'a [u8]>,
    pub field_13: Option<&'a [u8]>,
    pub field_1a: Option<&'a [u8]>,
    /// Values of tags 0x40-0x4F, in payload order.
    pub numbered: Vec<(u8, &'a [u8])>,
    /// Every tag byte visited, in order.
    pub tags: Vec<u8>,
    pub stop: Option<FieldStop>,
}

/// Finds the `0x14` that starts the trailing fields.
pub fn find_trailing_fields(defi: &[u8]) -> Option<usize> {
    let mut from = 0;
    loop {
        let i = from + defi[from..].iter().position(|&b| b == FIELDS_MARKER)?;
        if defi.get(i + 1) == Some(&b' ') {
            from = i + 1;
            continue;
        }
        return Some(i);
    }
}

/// Splits `payload` into the main definition and its trailing fields.
///
/// With `scan_trailing` unset the whole payload is the definition.
pub fn parse(payload: &[u8], scan_trailing: bool) -> DefinitionFields<'_> {
    let marker = if scan_trailing {
        find_trailing_fields(payload)
    } else {
        None
    };
    match marker {
        Some(d0) => {
            let mut fields = DefinitionFields {
                defi: &payload[..d0],
                ..Default::default()
            };
            fields.stop = parse_trailing(&payload[d0 + 1..], &mut fields).err();
            fields
        }
        None => DefinitionFields {
            defi: payload,
            ..Default::default()
        },
    }
}

fn parse_trailing<'a>(mut rest: &'a [u8], fields: &mut DefinitionFields<'a>) -> Result<(), FieldStop> {
    while let Some((&tag, after)) = rest.split_first() {
        fields.tags.push(tag);
        rest = after;
        let truncated = FieldStop::Truncated(tag);
        match tag {
            0x02 => {
                let code = take_byte(&mut rest).ok_or(truncated)?;
                if fields.part_of_speech_code.is_some() {
                    debug!("duplicate part of speech item");
                }
                let label = pos::part_of_speech(code).ok_or(FieldStop::UnknownPartOfSpeech(code))?;
                fields.part_of_speech_code = Some(code);
                fields.part_of_speech = Some(label);
            }
            0x06 => {
                let value = take_byte(&mut rest).ok_or(truncated)?;
                if fields.field_06.is_some() {
                    debug!("duplicate type 6");
                }
                fields.field_06 = Some(value);
            }
            0x07 => {
                fields.field_07 = Some(utils::take(&mut rest, 2).ok_or(truncated)?);
            }
            0x13 | 0x18 | 0x1A => {
                let value = take_value(&mut rest, tag, 1)?;
                if value.is_empty() {
                    continue;
                }
                let slot = match tag {
                    0x13 => &mut fields.field_13,
                    0x18 => {
                        if fields.title.is_some() {
                            debug!("duplicate entry title item");
                        }
                        &mut fields.title
                    }
                    _ => &mut fields.field_1a,
                };
                *slot = Some(value);
            }
            0x28 => {
                let value = take_value(&mut rest, tag, 2)?;
                if !value.is_empty() {
                    fields.title_trans = Some(value);
                }
            }
            0x40..=0x4F => {
                let len = (tag - 0x3F) as usize;
                if rest.len() < 1 + len {
                    debug!("too few data after {:#04x}", tag);
                    return Err(truncated);
                }
                let (_, value) = rest[..1 + len].split_at(1);
                fields.numbered.push((tag, value));
                rest = &rest[1 + len..];
            }
            0x50 | 0x60 => {
                let code = take_byte(&mut rest).ok_or(truncated)?;
                let (width, slot) = match tag {
                    0x50 => (1, &mut fields.transcription_50),
                    _ => (2, &mut fields.transcription_60),
                };
                let data = take_value(&mut rest, tag, width)?;
                if !data.is_empty() {
                    *slot = Some(Transcription { code, data });
                }
            }
            _ => {
                debug!("unknown control char. Char code = {:#X}", tag);
                return Err(FieldStop::UnknownTag(tag));
            }
        }
    }
    Ok(())
}

fn take_byte(rest: &mut &[u8]) -> Option<u8> {
    let (&b, tail) = rest.split_first()?;
    *rest = tail;
    Some(b)
}

/// Reads a `width`-byte length and the value after it.
///
/// A zero length yields an empty value and is logged.
fn take_value<'a>(rest: &mut &'a [u8], tag: u8, width: usize) -> Result<&'a [u8], FieldStop> {
    let value = utils::take_prefixed(rest, width).ok_or_else(|| {
        debug!("too few data after {:#04x}", tag);
        FieldStop::Truncated(tag)
    })?;
    if value.is_empty() {
        debug!("blank data after {:#04x}", tag);
    }
    Ok(value)
}
