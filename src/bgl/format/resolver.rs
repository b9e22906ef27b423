//! Choice of the source, target and default encodings.
//!
//! For source and target, highest priority first:
//! 1. Override from [`BglOptions`]
//! 2. `utf8Encoding` flag in the properties
//! 3. Declared charset (`sourceCharset` / `targetCharset`)
//! 4. Default code page of the declared language
//! 5. cp1252
//!
//! The default encoding is the override, then `defaultCharset`, then cp1252.

use encoding_rs::Encoding;
use log::info;

use super::metadata::Pass1Result;
use crate::bgl::codec::charset::encoding_for_label;
use crate::bgl::types::error::{BglError, Result};
use crate::bgl::types::models::Encodings;
use crate::bgl::types::options::BglOptions;

const FALLBACK_CHARSET: &str = "cp1252";

pub fn resolve(options: &BglOptions, pass1: &Pass1Result) -> Result<Encodings> {
    let source = pick(
        options.source_encoding.as_deref(),
        pass1.utf8_encoding,
        pass1.source_charset,
        pass1.source_lang.map(|l| l.encoding),
    )?;
    let target = pick(
        options.target_encoding.as_deref(),
        pass1.utf8_encoding,
        pass1.target_charset,
        pass1.target_lang.map(|l| l.encoding),
    )?;
    let default = match options.default_encoding.as_deref() {
        Some(label) => lookup(label)?,
        None => lookup(pass1.default_charset.unwrap_or(FALLBACK_CHARSET))?,
    };
    let encodings = Encodings {
        source,
        target,
        default,
    };
    info!(
        "Encodings: source={}, target={}, default={}",
        source.name(),
        target.name(),
        default.name()
    );
    Ok(encodings)
}

fn pick(
    override_label: Option<&str>,
    utf8_flag: bool,
    charset: Option<&str>,
    language_default: Option<&str>,
) -> Result<&'static Encoding> {
    if let Some(label) = override_label {
        return lookup(label);
    }
    if utf8_flag {
        return Ok(encoding_rs::UTF_8);
    }
    lookup(charset.or(language_default).unwrap_or(FALLBACK_CHARSET))
}

fn lookup(label: &str) -> Result<&'static Encoding> {
    encoding_for_label(label).ok_or_else(|| BglError::UnknownEncoding(label.to_string()))
}
