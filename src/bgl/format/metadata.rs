//! Metadata passes over the block stream.
//!
//! # Passes
//! ```text
//! pass 1: every block
//!   type 0            → entry-count hint / default charset
//!   type 1,7,10,11,13 → counted only
//!   type 2            → extracted if the name is ASCII, otherwise deferred
//!   type 3            → one dictionary property
//! (encodings resolved from the pass 1 result)
//! pass 2: only when something was deferred
//!   type 2            → remaining resources, names decoded with the source encoding
//! ```
//! Both passes leave the stream rewound to the first block.

use std::io::{Read, Seek};

use encoding_rs::Encoding;
use log::{debug, info, warn};

use super::blocks::{BlockReader, ReadStatus};
use super::info::{InfoItem, InfoKey};
use super::language::Language;
use crate::bgl::codec::charset::{Lossy, decode_text};
use crate::bgl::diagnostics::Diagnostics;
use crate::bgl::resources::{BOILERPLATE_RESOURCES, ResourceDir};
use crate::bgl::types::error::Result;
use crate::bgl::types::models::{Block, BlockKind, InfoValue};
use crate::bgl::utils;

/// Properties in insertion order. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    items: Vec<(String, InfoValue)>,
}

impl MetaInfo {
    pub fn insert(&mut self, key: impl Into<String>, value: InfoValue) {
        let key = key.into();
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.items.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Decodes the text properties held as raw bytes.
    ///
    /// Babylon stores them in UTF-8 when the `utf8Encoding` flag is set,
    /// otherwise in the target encoding.
    pub fn decoded(&self, utf8: bool, target: &'static Encoding) -> MetaInfo {
        let encoding = if utf8 { encoding_rs::UTF_8 } else { target };
        let items = self
            .items
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    InfoValue::Undecoded(bytes) => {
                        InfoValue::Text(decode_text(bytes, encoding, Lossy::Replace).0)
                    }
                    other => other.clone(),
                };
                (k.clone(), value)
            })
            .collect();
        MetaInfo { items }
    }
}

/// Everything the first pass learned. Never modified afterwards.
#[derive(Debug, Clone, Default)]
pub struct Pass1Result {
    pub num_blocks: u64,
    pub num_entries: u64,
    /// Entry count from a type-0 block. Close to, but not always, the real count.
    pub entry_count_hint: Option<u64>,
    pub bgl_num_entries: Option<u64>,
    pub default_charset: Option<&'static str>,
    pub source_charset: Option<&'static str>,
    pub target_charset: Option<&'static str>,
    pub source_lang: Option<&'static Language>,
    pub target_lang: Option<&'static Language>,
    pub utf8_encoding: bool,
    /// Properties, text values still undecoded.
    pub info: MetaInfo,
    /// Resources extracted in this pass.
    pub resources: Vec<String>,
    pub deferred_resources: u64,
}

/// What happened to one type-2 block.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResourceOutcome {
    Extracted(String),
    Deferred,
    Ignored,
}

/// Scans the block stream for dictionary properties and resources.
pub struct MetadataCollector<'a, R> {
    blocks: &'a mut BlockReader<R>,
    resources: &'a ResourceDir,
    diagnostics: &'a mut Diagnostics,
}

impl<'a, R: Read + Seek> MetadataCollector<'a, R> {
    pub fn new(
        blocks: &'a mut BlockReader<R>,
        resources: &'a ResourceDir,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            blocks,
            resources,
            diagnostics,
        }
    }

    pub fn first_pass(&mut self) -> Result<Pass1Result> {
        info!("Reading dictionary properties");
        let mut result = Pass1Result::default();
        let mut block = Block::default();
        while self.blocks.read_block(&mut block)? == ReadStatus::Block {
            result.num_blocks += 1;
            if block.data.is_empty() {
                continue;
            }
            match block.kind() {
                BlockKind::Metadata => self.read_type_0(&block, &mut result),
                BlockKind::Entry => result.num_entries += 1,
                BlockKind::Resource => match self.read_type_2(&block, None)? {
                    ResourceOutcome::Extracted(name) => result.resources.push(name),
                    ResourceOutcome::Deferred => result.deferred_resources += 1,
                    ResourceOutcome::Ignored => {}
                },
                BlockKind::Info => read_type_3(&block, &mut result),
                BlockKind::Unknown => {
                    debug!(
                        "Unknown Block type {}, data_length={}, number={}",
                        block.block_type,
                        block.data.len(),
                        result.num_blocks
                    );
                    self.diagnostics.unknown_block();
                }
            }
        }
        self.diagnostics.set_footer(self.blocks.footer());
        self.blocks.rewind()?;

        debug!("numEntries = {}", result.num_entries);
        if result.bgl_num_entries != Some(result.num_entries) {
            self.diagnostics.warn(format!(
                "bgl_numEntries = {:?}, numEntries = {}",
                result.bgl_num_entries, result.num_entries
            ));
        }
        Ok(result)
    }

    /// Extracts the resources deferred by the first pass.
    pub fn second_pass(&mut self, pass1: &Pass1Result, source: &'static Encoding) -> Result<Vec<String>> {
        let mut extracted = Vec::new();
        if pass1.deferred_resources == 0 {
            return Ok(extracted);
        }
        debug!("processing type 2 blocks, second pass");
        let mut block = Block::default();
        while self.blocks.read_block(&mut block)? == ReadStatus::Block {
            if block.data.is_empty() || block.kind() != BlockKind::Resource {
                continue;
            }
            if let ResourceOutcome::Extracted(name) = self.read_type_2(&block, Some(source))? {
                extracted.push(name);
            }
        }
        self.blocks.rewind()?;
        Ok(extracted)
    }

    fn read_type_0(&mut self, block: &Block, result: &mut Pass1Result) {
        let (code, value) = (block.data[0], &block.data[1..]);
        match code {
            2 => result.entry_count_hint = Some(utils::read_number(value)),
            8 => match super::info::decode_charset(value) {
                InfoItem::Charset(charset) => result.default_charset = Some(charset),
                _ => self.diagnostics.warn("defaultCharset is not valid"),
            },
            _ => {
                debug!(
                    "Unknown Block: type={}, code={}, data_length={}",
                    block.block_type,
                    code,
                    block.data.len()
                );
                self.diagnostics.unknown_block();
            }
        }
    }

    /// Handles one embedded file.
    ///
    /// `source` is `None` in the first pass: non-ASCII names are deferred
    /// because the source encoding is not known yet. In the second pass
    /// only those deferred names are handled.
    fn read_type_2(&mut self, block: &Block, source: Option<&'static Encoding>) -> Result<ResourceOutcome> {
        let mut data = block.data.as_slice();
        let Some(raw_name) = utils::take_prefixed(&mut data, 1) else {
            self.diagnostics.warn("read_type_2: name too long");
            return Ok(ResourceOutcome::Ignored);
        };
        if BOILERPLATE_RESOURCES.iter().any(|b| b.as_bytes() == raw_name) {
            if source.is_none() {
                info!("Skipping non-useful file {}", String::from_utf8_lossy(raw_name));
            }
            return Ok(ResourceOutcome::Ignored);
        }

        let name = match (raw_name.is_ascii(), source) {
            (true, None) => String::from_utf8_lossy(raw_name).into_owned(),
            (true, Some(_)) => return Ok(ResourceOutcome::Ignored),
            (false, None) => return Ok(ResourceOutcome::Deferred),
            (false, Some(encoding)) => decode_text(raw_name, encoding, Lossy::Replace).0,
        };
        if self.resources.write(&name, data)? {
            Ok(ResourceOutcome::Extracted(name))
        } else {
            self.diagnostics
                .warn(format!("read_type_2: unsafe resource name {:?}", name));
            Ok(ResourceOutcome::Ignored)
        }
    }
}

fn read_type_3(block: &Block, result: &mut Pass1Result) {
    if block.data.len() < 2 {
        debug!("read_type_3: block too short, len(block.data)={}", block.data.len());
        return;
    }
    let code = utils::read_number(&block.data[..2]) as u16;
    let value = &block.data[2..];
    let Some(key) = InfoKey::from_code(code) else {
        debug!(
            "Unknown info type keyCode={:#x}, block.type={}, len(block.data)={}",
            code,
            block.block_type,
            block.data.len()
        );
        return;
    };

    match key.decode(value) {
        InfoItem::Value(v) => {
            if is_blank(&v) {
                return;
            }
            if key == InfoKey::NumEntries {
                if let InfoValue::Integer(n) = v {
                    result.bgl_num_entries = Some(n);
                }
            }
            result.info.insert(key.name(), v);
        }
        InfoItem::Values(values) => {
            for (name, v) in values {
                if name == "utf8Encoding" {
                    result.utf8_encoding = v == InfoValue::Flag(true);
                }
                result.info.insert(name, v);
            }
        }
        InfoItem::Language(lang) => match key {
            InfoKey::SourceLang => result.source_lang = Some(lang),
            _ => result.target_lang = Some(lang),
        },
        InfoItem::Charset(charset) => match key {
            InfoKey::SourceCharset => result.source_charset = Some(charset),
            _ => result.target_charset = Some(charset),
        },
        InfoItem::Invalid => {
            warn!("decode func for info key {} ({:#x}) returned None", key.name(), code);
        }
    }
}

/// Empty text and byte values. Zero integers and `false` flags are kept.
fn is_blank(value: &InfoValue) -> bool {
    match value {
        InfoValue::Text(s) => s.is_empty(),
        InfoValue::Bytes(b) | InfoValue::Undecoded(b) => b.is_empty(),
        _ => false,
    }
}
