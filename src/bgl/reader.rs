use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::codec::charset::encoding_for_label;
use super::codec::gzip::GzipMemberReader;
use super::codec::offset_source::OffsetSource;
use super::diagnostics::{DefinitionStats, Diagnostics};
use super::format::blocks::{BlockReader, ReadStatus};
use super::format::header::{self, BglSignature};
use super::format::language::Language;
use super::format::metadata::{MetaInfo, MetadataCollector, Pass1Result};
use super::format::resolver;
use super::iter::EntryIterator;
use super::resources::ResourceDir;
use super::types::error::{BglError, Result};
use super::types::models::*;
use super::types::options::BglOptions;

/// Info keys renamed with a `bgl_` prefix when emitted.
const PREFIXED_INFO_KEYS: [&str; 3] = ["creationTime", "middleUpdated", "lastUpdated"];

/// Consumer of a decoded dictionary.
pub trait Glossary {
    fn set_info(&mut self, key: &str, value: &InfoValue);
    fn add_entry(&mut self, entry: Entry);
}

/// A decoding session over one Babylon `.bgl` file.
///
/// Opening the file reads the signature and runs the metadata passes, so
/// properties, encodings and resources are available right away. Entries
/// are then streamed with [`entries`](Self::entries).
pub struct BglReader {
    path: PathBuf,
    signature: BglSignature,
    blocks: BlockReader<File>,
    options: BglOptions,
    encodings: Encodings,
    source_lang: Option<&'static Language>,
    target_lang: Option<&'static Language>,
    info: MetaInfo,
    resources: Vec<String>,
    resource_dir: Option<PathBuf>,
    num_entries: u64,
    num_blocks: u64,
    diagnostics: Diagnostics,
    closed: bool,
}

impl BglReader {
    /// Opens a BGL file and reads its metadata.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The signature or gzip offset is invalid
    /// - The embedded gzip member is corrupt or has the wrong size
    /// - An encoding override names an unknown encoding
    /// - No resource directory can be created
    pub fn open(path: impl AsRef<Path>, options: BglOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening BGL file: {}", path.display());
        let signature = header::parse(&mut File::open(path)?)?;
        for label in [
            &options.default_encoding,
            &options.source_encoding,
            &options.target_encoding,
        ]
        .into_iter()
        .flatten()
        {
            encoding_for_label(label).ok_or_else(|| BglError::UnknownEncoding(label.clone()))?;
        }

        let mut diagnostics = Diagnostics::new(&options)?;
        let res_dir = ResourceDir::create(path, options.res_path.as_deref())?;
        let metadata = read_metadata(path, signature.gzip_offset, &options, &res_dir, &mut diagnostics);
        let (blocks, pass1, encodings, deferred) = match metadata {
            Ok(parts) => parts,
            Err(e) => {
                res_dir.remove_if_empty();
                return Err(e);
            }
        };

        let mut resources = pass1.resources.clone();
        resources.extend(deferred);
        let resource_dir = if res_dir.remove_if_empty() {
            None
        } else {
            Some(res_dir.path().to_path_buf())
        };

        let decoded = pass1.info.decoded(pass1.utf8_encoding, encodings.target);
        let info = glossary_info(&decoded, &pass1, &encodings);
        info!(
            "BGL metadata read: {} entries, {} blocks, {} resources",
            pass1.num_entries,
            pass1.num_blocks,
            resources.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            signature,
            blocks,
            options,
            encodings,
            source_lang: pass1.source_lang,
            target_lang: pass1.target_lang,
            info,
            resources,
            resource_dir,
            num_entries: pass1.num_entries,
            num_blocks: pass1.num_blocks,
            diagnostics,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn signature(&self) -> &BglSignature {
        &self.signature
    }

    /// Number of entry blocks counted by the metadata pass.
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    pub fn num_blocks(&self) -> u64 {
        self.num_blocks
    }

    /// Dictionary properties in the order they are emitted to a [`Glossary`].
    pub fn info(&self) -> &MetaInfo {
        &self.info
    }

    pub fn source_lang(&self) -> Option<&'static Language> {
        self.source_lang
    }

    pub fn target_lang(&self) -> Option<&'static Language> {
        self.target_lang
    }

    pub fn encodings(&self) -> &Encodings {
        &self.encodings
    }

    /// Names of the extracted resource files.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Directory holding the extracted resources, `None` if nothing was extracted.
    pub fn resource_dir(&self) -> Option<&Path> {
        self.resource_dir.as_deref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Statistics gathered with `collect_metadata2`, so far.
    pub fn definition_stats(&self) -> Option<&DefinitionStats> {
        self.diagnostics.definition_stats()
    }

    /// Streams the entries from the first block.
    ///
    /// Each call restarts the scan.
    pub fn entries(&mut self) -> Result<EntryIterator<'_>> {
        self.ensure_open()?;
        self.blocks.rewind()?;
        Ok(EntryIterator::new(self))
    }

    /// Emits every property and then every entry to `glossary`.
    ///
    /// Returns the number of entries emitted.
    pub fn read_into(&mut self, glossary: &mut impl Glossary) -> Result<u64> {
        for (key, value) in self.info.iter() {
            glossary.set_info(key, value);
        }
        let mut count = 0;
        for entry in self.entries()? {
            glossary.add_entry(entry?);
            count += 1;
        }
        debug!("{} entries emitted", count);
        Ok(count)
    }

    /// Rescans the stream and returns its block layout.
    pub fn block_summary(&mut self) -> Result<BlockSummary> {
        self.ensure_open()?;
        self.blocks.rewind()?;
        let mut summary = BlockSummary {
            gzip_offset: self.signature.gzip_offset,
            ..Default::default()
        };
        let mut block = Block::default();
        while self.blocks.read_block(&mut block)? == ReadStatus::Block {
            summary.num_blocks += 1;
            match block.kind() {
                BlockKind::Entry => summary.num_entries += 1,
                BlockKind::Resource => summary.num_files += 1,
                _ => {
                    summary.blocks.push(BlockRun::Single {
                        block_type: block.block_type,
                        len: block.data.len(),
                    });
                    continue;
                }
            }
            if let Some(BlockRun::Run { block_type, count }) = summary.blocks.last_mut() {
                if *block_type == block.block_type {
                    *count += 1;
                    continue;
                }
            }
            summary.blocks.push(BlockRun::Run {
                block_type: block.block_type,
                count: 1,
            });
        }
        self.blocks.rewind()?;
        Ok(summary)
    }

    /// Releases the gzip stream and the dump files. Safe to call repeatedly.
    pub fn close(&mut self) {
        if !self.closed {
            debug!("Closing BGL file: {}", self.path.display());
        }
        self.blocks.close();
        self.diagnostics.close();
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(BglError::InvalidFormat("BGL reader is closed".to_string()));
        }
        Ok(())
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut BlockReader<File>, &Encodings, &BglOptions, &mut Diagnostics) {
        (
            &mut self.blocks,
            &self.encodings,
            &self.options,
            &mut self.diagnostics,
        )
    }
}

impl Drop for BglReader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Runs both metadata passes and resolves the encodings in between.
fn read_metadata(
    path: &Path,
    gzip_offset: u16,
    options: &BglOptions,
    res_dir: &ResourceDir,
    diagnostics: &mut Diagnostics,
) -> Result<(BlockReader<File>, Pass1Result, Encodings, Vec<String>)> {
    let source = OffsetSource::open(path, gzip_offset as u64)?;
    let mut blocks = BlockReader::new(GzipMemberReader::new(source)?);

    let mut collector = MetadataCollector::new(&mut blocks, res_dir, diagnostics);
    let pass1 = collector.first_pass()?;
    let encodings = resolver::resolve(options, &pass1)?;
    let deferred = collector.second_pass(&pass1, encodings.source)?;
    Ok((blocks, pass1, encodings, deferred))
}

/// Builds the property table handed to the glossary.
fn glossary_info(
    decoded: &MetaInfo,
    pass1: &Pass1Result,
    encodings: &Encodings,
) -> MetaInfo {
    let mut info = MetaInfo::default();
    if let Some(lang) = pass1.source_lang {
        info.insert("sourceLang", InfoValue::Text(lang.name.to_string()));
    }
    if let Some(lang) = pass1.target_lang {
        info.insert("targetLang", InfoValue::Text(lang.name.to_string()));
    }
    info.insert("sourceCharset", InfoValue::Text("UTF-8".to_string()));
    info.insert("targetCharset", InfoValue::Text("UTF-8".to_string()));
    for (key, value) in decoded.iter() {
        if PREFIXED_INFO_KEYS.contains(&key) {
            info.insert(format!("bgl_{}", key), value.clone());
        } else {
            info.insert(key, value.clone());
        }
    }
    let charsets = [
        ("bgl_defaultCharset", pass1.default_charset),
        ("bgl_sourceCharset", pass1.source_charset),
        ("bgl_targetCharset", pass1.target_charset),
    ];
    for (key, charset) in charsets {
        if let Some(charset) = charset {
            info.insert(key, InfoValue::Text(charset.to_string()));
        }
    }
    info.insert("bgl_defaultEncoding", InfoValue::Text(encodings.default.name().to_string()));
    info.insert("bgl_sourceEncoding", InfoValue::Text(encodings.source.name().to_string()));
    info.insert("bgl_targetEncoding", InfoValue::Text(encodings.target.name().to_string()));
    info
}
