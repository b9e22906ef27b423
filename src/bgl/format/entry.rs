//! Decoding of entry blocks (types 1, 7, 10, 11, 13).
//!
//! # Layout
//! ```text
//! type 11:
//!   [5 bytes BE] word length, word
//!   [4 bytes]    reserved
//!   [4 bytes BE] definition length, definition
//!   ([4 bytes BE] alternate length, alternate)*   zero length ends the list
//! other types:
//!   [1 byte]     word length, word
//!   [2 bytes BE] definition length, definition
//!   ([1 byte]    alternate length, alternate)*
//! ```

use std::collections::BTreeSet;

use encoding_rs::Encoding;
use log::{debug, error, warn};

use super::charset_tags::CharsetTagDecoder;
use super::fields::{self, DefinitionFields, Transcription};
use crate::bgl::codec::charset::{Lossy, decode_text};
use crate::bgl::diagnostics::Diagnostics;
use crate::bgl::text;
use crate::bgl::types::models::{Block, Encodings, Entry};
use crate::bgl::types::options::BglOptions;
use crate::bgl::utils;

/// Block type using the wide length fields.
const WIDE_ENTRY_TYPE: u8 = 11;

/// Result of decoding one entry block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Entry(Entry),
    /// The block was malformed; the message says where.
    Skip(String),
}

/// Field widths of an entry block.
#[derive(Debug, Clone, Copy)]
struct Layout {
    word_len: usize,
    defi_reserved: usize,
    defi_len: usize,
    alt_len: usize,
}

impl Layout {
    fn for_type(block_type: u8) -> Self {
        if block_type == WIDE_ENTRY_TYPE {
            Self {
                word_len: 5,
                defi_reserved: 4,
                defi_len: 4,
                alt_len: 4,
            }
        } else {
            Self {
                word_len: 1,
                defi_reserved: 0,
                defi_len: 2,
                alt_len: 1,
            }
        }
    }
}

/// Turns entry blocks into [`Entry`] values.
pub struct EntryDecoder<'a> {
    encodings: &'a Encodings,
    options: &'a BglOptions,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> EntryDecoder<'a> {
    pub fn new(encodings: &'a Encodings, options: &'a BglOptions, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            encodings,
            options,
            diagnostics,
        }
    }

    /// Decodes one entry block. Never fails: a malformed block is a skip.
    pub fn decode(&mut self, block: &Block) -> EntryOutcome {
        match self.read_entry(block) {
            Ok(entry) => EntryOutcome::Entry(entry),
            Err(message) => {
                error!("{}", message);
                self.diagnostics.entry_skipped(&message);
                EntryOutcome::Skip(message)
            }
        }
    }

    fn read_entry(&mut self, block: &Block) -> Result<Entry, String> {
        let layout = Layout::for_type(block.block_type);
        let mut data = block.data.as_slice();
        let at = |what: &str| format!("readEntry[{:#X}]: {}", block.offset, what);

        // word
        let raw_key = utils::take_prefixed(&mut data, layout.word_len)
            .ok_or_else(|| at("reading word: pos + Len > len(block.data)"))?;
        self.diagnostics
            .dump_raw(&format!("\n\nblock type = {}\nkey = ", block.block_type), raw_key);
        let word = self.process_key(raw_key);

        // definition
        utils::take(&mut data, layout.defi_reserved)
            .ok_or_else(|| at("reading defi size: pos + 8 > len(block.data)"))?;
        let raw_defi = utils::take_prefixed(&mut data, layout.defi_len)
            .ok_or_else(|| at("reading defi: pos + Len > len(block.data)"))?;
        self.diagnostics.dump_raw("\ndefi = ", raw_defi);
        let definition = self.process_definition(raw_defi, raw_key);

        // alternates
        let mut alternates = BTreeSet::new();
        while !data.is_empty() {
            let len = utils::take(&mut data, layout.alt_len)
                .map(utils::read_number)
                .ok_or_else(|| at("reading alt size: pos + Len > len(block.data)"))?;
            if len == 0 && block.block_type == WIDE_ENTRY_TYPE {
                if !data.is_empty() {
                    warn!(
                        "readEntry[{:#X}]: reading alt size: pos + Len != len(block.data)",
                        block.offset
                    );
                }
                break;
            }
            let raw_alt = utils::take(&mut data, len as usize)
                .ok_or_else(|| at("reading alt: pos + Len > len(block.data)"))?;
            self.diagnostics.dump_raw("\nalt = ", raw_alt);
            alternates.insert(self.process_alternate(raw_alt, raw_key));
        }
        alternates.remove(&word);

        Ok(Entry {
            word,
            alternates: alternates.into_iter().collect(),
            definition,
        })
    }

    /// Cleans an entry key.
    pub fn process_key(&mut self, raw: &[u8]) -> String {
        let (main, strip_cnt) = text::strip_dollar_indexes(raw);
        if strip_cnt > 1 {
            debug!(
                "processEntryKey({}):\nnumber of dollar indexes = {}",
                String::from_utf8_lossy(raw),
                strip_cnt
            );
        }
        let key = self.decode_key_bytes(&main, raw);
        self.diagnostics.dump_decoded(&format!("\n\nkey: {}", key));
        self.clean_key(key)
    }

    /// Cleans an alternate; also drops a `/` marking an optional form.
    pub fn process_alternate(&mut self, raw: &[u8], raw_key: &[u8]) -> String {
        let (main, _) = text::strip_dollar_indexes(raw);
        let alt = self.decode_key_bytes(&main, raw_key);
        let alt = text::strip_slash_alt(&alt).into_owned();
        self.diagnostics.dump_decoded(&format!("\nalt: {}", alt));
        self.clean_key(alt)
    }

    fn decode_key_bytes(&self, bytes: &[u8], raw_key: &[u8]) -> String {
        let (decoded, had_errors) = decode_text(bytes, self.encodings.source, Lossy::Drop);
        if had_errors && self.options.strict_string_conversion {
            debug!(
                "processEntryKey({}):\nconversion error with {}",
                String::from_utf8_lossy(raw_key),
                self.encodings.source.name()
            );
        }
        decoded
    }

    fn clean_key(&mut self, key: String) -> String {
        let mut key = key;
        if self.options.process_html_in_key {
            let stripped = text::strip_html_tags(&key).into_owned();
            key = text::replace_html_entries_in_keys(&stripped, |e| self.diagnostics.unknown_entity(e));
        }
        let key = text::remove_control_chars(&key);
        let key = text::replace_new_lines(&key);
        let key = key.trim_start();
        match self.options.key_rstrip_chars.as_deref() {
            Some(chars) => key.trim_end_matches(|c| chars.contains(c)).to_string(),
            None => key.trim_end().to_string(),
        }
    }

    /// Decodes and formats a definition payload.
    pub fn process_definition(&mut self, payload: &[u8], raw_key: &[u8]) -> String {
        let fields = fields::parse(payload, !self.options.no_control_sequence_in_defi);
        if let Some(stats) = self.diagnostics.stats_mut() {
            stats.record_trailing_tags(&fields.tags);
        }
        if let Some(stop) = fields.stop {
            debug!(
                "processEntryDefinitionTrailingFields key = ({}): stopped at {:?}",
                String::from_utf8_lossy(raw_key),
                stop
            );
        }

        let target = self.encodings.target;
        let (defi, single_encoding) = self.decode_tags(fields.defi, target);
        if !single_encoding {
            self.diagnostics.mixed_encoding();
        }
        let defi = text::fix_img_links(&defi);
        let defi = self.replace_entities(&defi);
        let defi = text::remove_control_chars(&defi);
        let defi = text::normalize_new_lines(&defi).trim().to_string();

        let title = fields.title.map(|t| self.decode_field(t));
        let title_trans = fields.title_trans.map(|t| self.decode_field(t));
        let transcription_50 = fields
            .transcription_50
            .and_then(|t| self.decode_transcription(t, 0x50, raw_key));
        let transcription_60 = fields
            .transcription_60
            .and_then(|t| self.decode_transcription(t, 0x60, raw_key));

        self.record_statistics(&fields, single_encoding, &defi, raw_key);
        self.dump_fields(&fields, title.as_deref(), title_trans.as_deref(), &defi);
        if let Some(s) = transcription_50.as_deref() {
            self.diagnostics.dump_decoded(&format!("\ndefi transcription_50: {}", s));
        }
        if let Some(s) = transcription_60.as_deref() {
            self.diagnostics.dump_decoded(&format!("\ndefi transcription_60: {}", s));
        }

        let mut out = String::with_capacity(defi.len() + 64);
        let pos = fields.part_of_speech.filter(|p| !p.is_empty());
        let title = title.filter(|t| !t.is_empty());
        if pos.is_some() || title.is_some() {
            if let Some(pos) = pos {
                out.push_str(&format!(
                    "<font color=\"#{}\">{}</font>",
                    self.options.part_of_speech_color,
                    text::xml_escape(pos)
                ));
            }
            if let Some(title) = title {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&title);
            }
            out.push_str("<br>\n");
        }
        for (value, wrap) in [
            (title_trans, false),
            (transcription_50, true),
            (transcription_60, true),
        ] {
            match value.filter(|v| !v.is_empty()) {
                Some(v) if wrap => out.push_str(&format!("[{}]<br>\n", v)),
                Some(v) => out.push_str(&format!("{}<br>\n", v)),
                None => {}
            }
        }
        out.push_str(&defi);
        out
    }

    fn decode_tags(&mut self, bytes: &[u8], default: &'static Encoding) -> (String, bool) {
        CharsetTagDecoder::new(self.encodings.source, self.options.strict_string_conversion)
            .with_stats(self.diagnostics.stats_mut())
            .decode(bytes, default)
    }

    fn replace_entities(&mut self, text: &str) -> String {
        text::replace_html_entries(text, |e| self.diagnostics.unknown_entity(e))
    }

    /// Title-like fields: source encoding, entities resolved, control chars removed.
    fn decode_field(&mut self, bytes: &[u8]) -> String {
        let (decoded, _) = self.decode_tags(bytes, self.encodings.source);
        let decoded = self.replace_entities(&decoded);
        text::remove_control_chars(&decoded).into_owned()
    }

    /// Only sub-code 0x1B carries readable text.
    fn decode_transcription(&mut self, t: Transcription, tag: u8, raw_key: &[u8]) -> Option<String> {
        match (tag, t.code) {
            (_, 0x1B) => Some(self.decode_field(t.data)),
            (0x50, 0x10 | 0x18) => None,
            _ => {
                debug!(
                    "processEntryDefinition key = ({}):\ndefi field {:x}, unknown code: {:#x}",
                    String::from_utf8_lossy(raw_key),
                    tag,
                    t.code
                );
                None
            }
        }
    }

    fn record_statistics(&mut self, fields: &DefinitionFields, single_encoding: bool, defi: &str, raw_key: &[u8]) {
        if single_encoding {
            let mut hint = b"defi, key = ".to_vec();
            hint.extend_from_slice(raw_key);
            self.diagnostics
                .search_char_samples(fields.defi, &hint, self.encodings.target);
            if let Some(stats) = self.diagnostics.stats_mut() {
                stats.record_single_encoding(fields.defi);
            }
        }
        if let Some(stats) = self.diagnostics.stats_mut() {
            stats.record_decoded(defi);
        }
    }

    fn dump_fields(&mut self, fields: &DefinitionFields, title: Option<&str>, title_trans: Option<&str>, defi: &str) {
        let d = &mut *self.diagnostics;
        if let Some(code) = fields.part_of_speech_code {
            d.dump_raw(&format!("\npart of speech: {:#x}", code), b"");
            d.dump_decoded(&format!("\npart of speech: {:#x}", code));
        }
        if let Some(t) = fields.title {
            d.dump_raw("\ndefi title: ", t);
        }
        if let Some(t) = title {
            d.dump_decoded(&format!("\ndefi title: {}", t));
        }
        if let Some(t) = fields.title_trans {
            d.dump_raw("\ndefi title trans: ", t);
        }
        if let Some(t) = title_trans {
            d.dump_decoded(&format!("\ndefi title trans: {}", t));
        }
        if let Some(t) = fields.transcription_50 {
            d.dump_raw(&format!("\ndefi transcription_50 ({:x}): ", t.code), t.data);
        }
        if let Some(t) = fields.transcription_60 {
            d.dump_raw(&format!("\ndefi transcription_60 ({:x}): ", t.code), t.data);
        }
        if !defi.is_empty() {
            d.dump_decoded(&format!("\ndefi: {}", defi));
        }
        if let Some(f) = fields.field_1a {
            d.dump_raw("\ndefi field_1a: ", f);
            let source = self.encodings.source;
            let (decoded, _) = CharsetTagDecoder::new(source, false).decode(f, source);
            d.dump_decoded(&format!("\ndefi field_1a: {}", decoded));
        }
        if let Some(f) = fields.field_13 {
            let bytes = utils::format_bytes(f);
            d.dump_raw(&format!("\ndefi field_13 bytes: {}", bytes), b"");
            d.dump_decoded(&format!("\ndefi field_13 bytes: {}", bytes));
        }
        if let Some(f) = fields.field_07 {
            d.dump_raw("\ndefi field_07: ", f);
            d.dump_decoded(&format!("\ndefi field_07 bytes: {}", utils::format_bytes(f)));
        }
        if let Some(f) = fields.field_06 {
            d.dump_raw(&format!("\ndefi field_06: {}", f), b"");
            d.dump_decoded(&format!("\ndefi field_06: {}", f));
        }
        for (tag, value) in &fields.numbered {
            d.dump_raw(&format!("\ndefi field {:x}: ", tag), value);
        }
    }
}
