//! Record of everything the decoder skipped or guessed.
//!
//! The `log` facade still receives every message; [`Diagnostics`] keeps the
//! parts a caller may want to inspect after decoding, and owns the optional
//! dump files.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use encoding_rs::Encoding;
use log::{debug, warn};

use crate::bgl::codec::gzip::FooterStatus;
use crate::bgl::text;
use crate::bgl::types::error::Result;
use crate::bgl::types::options::BglOptions;

const SAMPLE_MARKER: &[u8] = b"!!!--+!!!";

/// Per-definition statistics, collected with `collect_metadata2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionStats {
    /// How often each trailing-field tag byte was seen.
    pub defi_trailing_fields: Vec<u64>,
    pub defi_processed_count: u64,
    pub defi_utf8_count: u64,
    pub defi_ascii_count: u64,
    /// `true` while every decoded definition is pure ASCII.
    pub is_defi_ascii: bool,
    /// Histogram of `&#N;` code points per encoding; codes above 255 share slot 256.
    pub char_refs: BTreeMap<String, Vec<u64>>,
}

impl Default for DefinitionStats {
    fn default() -> Self {
        Self {
            defi_trailing_fields: vec![0; 256],
            defi_processed_count: 0,
            defi_utf8_count: 0,
            defi_ascii_count: 0,
            is_defi_ascii: true,
            char_refs: BTreeMap::new(),
        }
    }
}

impl DefinitionStats {
    pub fn record_char_refs(&mut self, encoding: &'static Encoding, segment: &[u8]) {
        let counts = self
            .char_refs
            .entry(encoding.name().to_string())
            .or_insert_with(|| vec![0; 257]);
        for code in text::char_ref_codes(segment) {
            counts[code.min(256) as usize] += 1;
        }
    }

    pub fn record_trailing_tags(&mut self, tags: &[u8]) {
        for &tag in tags {
            self.defi_trailing_fields[tag as usize] += 1;
        }
    }

    /// Counts a definition decoded with a single encoding.
    pub fn record_single_encoding(&mut self, raw_defi: &[u8]) {
        self.defi_processed_count += 1;
        if raw_defi.is_ascii() {
            self.defi_ascii_count += 1;
        }
        if std::str::from_utf8(raw_defi).is_ok() {
            self.defi_utf8_count += 1;
        }
    }

    pub fn record_decoded(&mut self, defi: &str) {
        if self.is_defi_ascii && !defi.is_ascii() {
            self.is_defi_ascii = false;
        }
    }
}

/// A text log whose records are prefixed with their byte offset, so the
/// file can be navigated side by side in a hex editor.
struct OffsetLog {
    writer: BufWriter<File>,
    written: u64,
}

impl OffsetLog {
    fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            written: 0,
        })
    }

    fn write_record(&mut self, text: &[u8]) -> std::io::Result<()> {
        let header = format!("\noffset = {:#X}\n", self.written);
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(text)?;
        self.writer.write_all(b"\n")?;
        self.written += (header.len() + text.len() + 1) as u64;
        Ok(())
    }
}

/// Finds the first occurrence of every byte >= 0x80 across definitions.
struct CharSamples {
    seen: [bool; 256],
    log: Option<OffsetLog>,
}

impl CharSamples {
    /// Offsets of bytes not seen in any earlier call.
    fn find_new(&mut self, data: &[u8]) -> Vec<usize> {
        let mut offsets = Vec::new();
        for (i, &b) in data.iter().enumerate() {
            if b >= 0x80 && !self.seen[b as usize] {
                self.seen[b as usize] = true;
                offsets.push(i);
            }
        }
        offsets
    }
}

/// Inserts the sample marker before every offset. For UTF-8 the marker is
/// moved back to the lead byte of the sequence.
fn mark_samples(data: &[u8], offsets: &[usize], utf8: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + offsets.len() * SAMPLE_MARKER.len());
    let mut i = 0;
    for &o in offsets {
        let mut j = o;
        if utf8 {
            while j > 0 && data[j] & 0xC0 == 0x80 {
                j -= 1;
            }
        }
        if j < i {
            continue;
        }
        out.extend_from_slice(&data[i..j]);
        out.extend_from_slice(SAMPLE_MARKER);
        i = j;
    }
    out.extend_from_slice(&data[i..]);
    out
}

/// Explicit sink for the decoder's warnings and counters.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
    entries_skipped: u64,
    unknown_blocks: u64,
    mixed_encoding_definitions: u64,
    footer: Option<FooterStatus>,
    warned_entities: HashSet<String>,
    stats: Option<DefinitionStats>,
    char_samples: Option<CharSamples>,
    raw_dump: Option<BufWriter<File>>,
    decoded_dump: Option<BufWriter<File>>,
    msg_log: Option<OffsetLog>,
}

impl Diagnostics {
    /// Opens the dump files requested in `options`.
    pub fn new(options: &BglOptions) -> Result<Self> {
        let open = |path: &Option<std::path::PathBuf>| -> Result<Option<BufWriter<File>>> {
            path.as_deref()
                .map(|p| File::create(p).map(BufWriter::new))
                .transpose()
                .map_err(Into::into)
        };
        let char_samples = if options.search_char_samples {
            Some(CharSamples {
                seen: [false; 256],
                log: options.char_samples_path.as_deref().map(OffsetLog::create).transpose()?,
            })
        } else {
            None
        };
        Ok(Self {
            stats: options.collect_metadata2.then(DefinitionStats::default),
            char_samples,
            raw_dump: open(&options.raw_dump_path)?,
            decoded_dump: open(&options.decoded_dump_path)?,
            msg_log: options.msg_log_path.as_deref().map(OffsetLog::create).transpose()?,
            ..Default::default()
        })
    }

    /// Logs a warning and keeps it.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Warns about an unknown HTML entity the first time it is seen.
    pub fn unknown_entity(&mut self, entity: &str) {
        if self.warned_entities.insert(entity.to_string()) {
            self.warn(format!("unknown html entity {}", entity));
        }
    }

    /// Records a skipped entry in the message log (or at debug level).
    pub fn entry_skipped(&mut self, message: &str) {
        self.entries_skipped += 1;
        self.log_message(message);
    }

    pub fn unknown_block(&mut self) {
        self.unknown_blocks += 1;
    }

    pub fn mixed_encoding(&mut self) {
        self.mixed_encoding_definitions += 1;
    }

    pub fn set_footer(&mut self, footer: Option<FooterStatus>) {
        if let Some(FooterStatus::CrcMismatch { stored, computed }) = footer {
            if self.footer != footer {
                self.warnings
                    .push(format!("CRC check failed {:#x} != {:#x}", stored, computed));
            }
        }
        self.footer = footer;
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn entries_skipped(&self) -> u64 {
        self.entries_skipped
    }

    pub fn unknown_blocks(&self) -> u64 {
        self.unknown_blocks
    }

    /// Definitions that mixed charset spans of different encodings.
    pub fn mixed_encoding_definitions(&self) -> u64 {
        self.mixed_encoding_definitions
    }

    /// Footer status of the gzip member, once it has been read to the end.
    pub fn footer(&self) -> Option<FooterStatus> {
        self.footer
    }

    pub fn definition_stats(&self) -> Option<&DefinitionStats> {
        self.stats.as_ref()
    }

    pub(crate) fn stats_mut(&mut self) -> Option<&mut DefinitionStats> {
        self.stats.as_mut()
    }

    /// Writes raw bytes to the raw dump.
    pub fn dump_raw(&mut self, label: &str, data: &[u8]) {
        if let Some(w) = self.raw_dump.as_mut() {
            let result = w
                .write_all(label.as_bytes())
                .and_then(|_| w.write_all(data));
            if let Err(e) = result {
                warn!("raw dump write failed, closing it: {}", e);
                self.raw_dump = None;
            }
        }
    }

    /// Writes decoded text to the decoded dump.
    pub fn dump_decoded(&mut self, text: &str) {
        if let Some(w) = self.decoded_dump.as_mut() {
            if let Err(e) = w.write_all(text.as_bytes()) {
                warn!("decoded dump write failed, closing it: {}", e);
                self.decoded_dump = None;
            }
        }
    }

    pub fn log_message(&mut self, message: &str) {
        match self.msg_log.as_mut() {
            Some(log) => {
                if let Err(e) = log.write_record(message.as_bytes()) {
                    warn!("message log write failed, closing it: {}", e);
                    self.msg_log = None;
                }
            }
            None => debug!("{}", message),
        }
    }

    /// Reports bytes >= 0x80 not seen in earlier definitions.
    pub fn search_char_samples(&mut self, data: &[u8], hint: &[u8], encoding: &'static Encoding) {
        let Some(samples) = self.char_samples.as_mut() else {
            return;
        };
        let offsets = samples.find_new(data);
        if offsets.is_empty() {
            return;
        }
        let marked = mark_samples(data, &offsets, encoding == encoding_rs::UTF_8);
        let offsets_str = offsets
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let mut record = Vec::new();
        record.extend_from_slice(b"charSample(");
        record.extend_from_slice(hint);
        record.extend_from_slice(format!(")\noffsets = {}\nmarked = ", offsets_str).as_bytes());
        record.extend_from_slice(&marked);
        record.extend_from_slice(b"\norig = ");
        record.extend_from_slice(data);
        record.push(b'\n');

        match samples.log.as_mut() {
            Some(log) => {
                if let Err(e) = log.write_record(&record) {
                    warn!("char samples write failed, closing it: {}", e);
                    samples.log = None;
                }
            }
            None => debug!("{}", String::from_utf8_lossy(&record)),
        }
    }

    /// Flushes and closes every dump file. Safe to call repeatedly.
    pub fn close(&mut self) {
        for w in [self.raw_dump.take(), self.decoded_dump.take()].into_iter().flatten() {
            flush(w);
        }
        if let Some(log) = self.msg_log.take() {
            flush(log.writer);
        }
        if let Some(log) = self.char_samples.as_mut().and_then(|s| s.log.take()) {
            flush(log.writer);
        }
    }
}

fn flush(mut w: BufWriter<File>) {
    if let Err(e) = w.flush() {
        warn!("failed to flush dump file: {}", e);
    }
}

