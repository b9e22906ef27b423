#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bgl_reader::{Entry, Glossary, InfoValue};
use byteorder::{BigEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::GzEncoder;

pub const MAGIC: [u8; 4] = [0x12, 0x34, 0x00, 0x01];

/// Frames `data` as one block of `block_type`.
pub fn encode_block(block_type: u8, data: &[u8]) -> Vec<u8> {
    let len = data.len();
    let mut out = Vec::with_capacity(len + 5);
    if len < 12 {
        out.push((((len + 4) as u8) << 4) | block_type);
    } else {
        let width = match len {
            0..=0xFF => 1,
            0x100..=0xFFFF => 2,
            0x1_0000..=0xFF_FFFF => 3,
            _ => 4,
        };
        out.push((((width - 1) as u8) << 4) | block_type);
        out.write_uint::<BigEndian>(len as u64, width).unwrap();
    }
    out.extend_from_slice(data);
    out
}

pub fn block_stream(blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    blocks
        .iter()
        .flat_map(|(t, data)| encode_block(*t, data))
        .collect()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Signature + gzip member starting at `gzip_offset`.
pub fn container_at(blocks: &[(u8, Vec<u8>)], gzip_offset: u16) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.write_u16::<BigEndian>(gzip_offset).unwrap();
    out.resize(gzip_offset as usize, 0);
    out.extend(gzip(&block_stream(blocks)));
    out
}

pub fn container(blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    container_at(blocks, 6)
}

/// Payload of a type-1 entry block.
pub fn entry(word: &[u8], defi: &[u8], alts: &[&[u8]]) -> Vec<u8> {
    let mut out = vec![word.len() as u8];
    out.extend_from_slice(word);
    out.write_u16::<BigEndian>(defi.len() as u16).unwrap();
    out.extend_from_slice(defi);
    for alt in alts {
        out.push(alt.len() as u8);
        out.extend_from_slice(alt);
    }
    out
}

/// Payload of a type-11 entry block, alternates terminated by a zero length.
pub fn wide_entry(word: &[u8], defi: &[u8], alts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_uint::<BigEndian>(word.len() as u64, 5).unwrap();
    out.extend_from_slice(word);
    out.extend_from_slice(&[0, 0, 0, 1]);
    out.write_u32::<BigEndian>(defi.len() as u32).unwrap();
    out.extend_from_slice(defi);
    for alt in alts {
        out.write_u32::<BigEndian>(alt.len() as u32).unwrap();
        out.extend_from_slice(alt);
    }
    out.write_u32::<BigEndian>(0).unwrap();
    out
}

/// Payload of a type-3 property block.
pub fn info(code: u16, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u16::<BigEndian>(code).unwrap();
    out.extend_from_slice(value);
    out
}

/// Payload of a type-2 resource block.
pub fn resource(name: &[u8], data: &[u8]) -> Vec<u8> {
    let mut out = vec![name.len() as u8];
    out.extend_from_slice(name);
    out.extend_from_slice(data);
    out
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[derive(Default)]
pub struct MemoryGlossary {
    pub info: Vec<(String, InfoValue)>,
    pub entries: Vec<Entry>,
}

impl Glossary for MemoryGlossary {
    fn set_info(&mut self, key: &str, value: &InfoValue) {
        self.info.push((key.to_string(), value.clone()));
    }

    fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }
}
