//! Inline `<charset c="X">…</charset>` spans.
//!
//! ```text
//! c=t  babylon character references: hex code points separated by ';'
//! c=u  UTF-8
//! c=k  source encoding
//! c=e  source encoding
//! c=g  GBK
//! ```
//! Spans nest. Text outside any span uses the caller's default encoding.

use std::sync::OnceLock;

use encoding_rs::Encoding;
use log::debug;
use regex::bytes::Regex;

use crate::bgl::codec::charset::{Lossy, decode_text};
use crate::bgl::diagnostics::DefinitionStats;
use crate::bgl::text;

static CHARSET_TAG: OnceLock<Regex> = OnceLock::new();

fn charset_tag_regex() -> &'static Regex {
    CHARSET_TAG.get_or_init(|| {
        Regex::new(r#"(?i-u)<charset\s+c=['"]?(\w)['"]?>|</charset>"#)
            .expect("Invalid charset tag regex pattern")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Text(&'static Encoding),
    BabylonRef,
}

/// Decodes text containing charset spans.
pub struct CharsetTagDecoder<'a> {
    source: &'static Encoding,
    strict: bool,
    stats: Option<&'a mut DefinitionStats>,
}

impl<'a> CharsetTagDecoder<'a> {
    pub fn new(source: &'static Encoding, strict: bool) -> Self {
        Self {
            source,
            strict,
            stats: None,
        }
    }

    /// Counts the `&#N;` references of every decoded segment into `stats`.
    pub fn with_stats(mut self, stats: Option<&'a mut DefinitionStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Returns the decoded text and whether only `default` was used.
    ///
    /// `c=t` spans do not count as a different encoding.
    pub fn decode(&mut self, text: &[u8], default: &'static Encoding) -> (String, bool) {
        let mut out = String::with_capacity(text.len());
        let mut stack: Vec<Frame> = Vec::new();
        let mut default_only = true;
        let mut last = 0;

        for caps in charset_tag_regex().captures_iter(text) {
            let Some(tag) = caps.get(0) else { continue };
            let frame = stack.last().copied().unwrap_or(Frame::Text(default));
            default_only &= self.decode_segment(&text[last..tag.start()], frame, default, &mut out);
            last = tag.end();

            match caps.get(1) {
                Some(code) => stack.push(self.frame_for(code.as_bytes(), default, text)),
                None => {
                    if stack.pop().is_none() {
                        debug!(
                            "decodeCharsetTags({})\nunbalanced </charset> tag",
                            String::from_utf8_lossy(text)
                        );
                    }
                }
            }
        }
        let frame = stack.last().copied().unwrap_or(Frame::Text(default));
        default_only &= self.decode_segment(&text[last..], frame, default, &mut out);

        if !stack.is_empty() {
            debug!(
                "decodeCharsetTags({})\nunclosed <charset...> tag",
                String::from_utf8_lossy(text)
            );
        }
        (out, default_only)
    }

    fn frame_for(&self, code: &[u8], default: &'static Encoding, text: &[u8]) -> Frame {
        match code.to_ascii_lowercase().as_slice() {
            b"t" => Frame::BabylonRef,
            b"u" => Frame::Text(encoding_rs::UTF_8),
            b"k" | b"e" => Frame::Text(self.source),
            b"g" => Frame::Text(encoding_rs::GBK),
            other => {
                debug!(
                    "decodeCharsetTags({})\nunknown charset code = {}",
                    String::from_utf8_lossy(text),
                    String::from_utf8_lossy(other)
                );
                Frame::Text(default)
            }
        }
    }

    /// Appends one segment to `out`. Returns `false` if it used a
    /// non-default encoding.
    fn decode_segment(
        &mut self,
        segment: &[u8],
        frame: Frame,
        default: &'static Encoding,
        out: &mut String,
    ) -> bool {
        let encoding = match frame {
            Frame::BabylonRef => {
                push_babylon_refs(segment, out);
                return true;
            }
            Frame::Text(encoding) => encoding,
        };

        if let Some(stats) = self.stats.as_deref_mut() {
            stats.record_char_refs(encoding, segment);
        }
        let bytes = if encoding == encoding_rs::WINDOWS_1252 {
            text::replace_ascii_char_refs(segment)
        } else {
            segment.into()
        };
        let (decoded, had_errors) = decode_text(&bytes, encoding, Lossy::Replace);
        if had_errors && self.strict {
            debug!(
                "decodeCharsetTags: fragment({}) conversion error with {}",
                String::from_utf8_lossy(segment),
                encoding.name()
            );
        }
        out.push_str(&decoded);
        encoding == default
    }
}

/// Convenience wrapper without statistics or strict logging.
pub fn decode_charset_tags(
    text: &[u8],
    default: &'static Encoding,
    source: &'static Encoding,
) -> (String, bool) {
    CharsetTagDecoder::new(source, false).decode(text, default)
}

/// `00E6;0101;` → `æā`. Anything but four hex digits is dropped.
fn push_babylon_refs(segment: &[u8], out: &mut String) {
    let refs: Vec<&[u8]> = segment.split(|&b| b == b';').collect();
    for (j, r) in refs.iter().enumerate() {
        if r.is_empty() {
            if j != refs.len() - 1 {
                debug!(
                    "decodeCharsetTags: blank <charset c=t> character reference ({})",
                    String::from_utf8_lossy(segment)
                );
            }
            continue;
        }
        let code = (r.len() == 4 && r.iter().all(u8::is_ascii_hexdigit))
            .then(|| std::str::from_utf8(r).ok())
            .flatten()
            .and_then(|s| u32::from_str_radix(s, 16).ok())
            .and_then(char::from_u32);
        match code {
            Some(c) => out.push(c),
            None => debug!(
                "decodeCharsetTags: invalid <charset c=t> character reference ({})",
                String::from_utf8_lossy(segment)
            ),
        }
    }
}
