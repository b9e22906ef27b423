//! Dictionary properties stored in type-3 blocks.
//!
//! A type-3 block is a 2-byte big-endian property code followed by the
//! value. Each known code maps to an [`InfoKey`] variant, and each variant
//! has exactly one decode function.

use encoding_rs::UTF_16LE;
use log::warn;
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};

use super::language::{self, Language};
use crate::bgl::types::models::InfoValue;
use crate::bgl::utils;

/// Known property codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKey {
    Title,
    Author,
    Email,
    Copyright,
    SourceLang,
    TargetLang,
    Description,
    BrowsingEnabled,
    IconData,
    NumEntries,
    Flags,
    CreationTime,
    SourceCharset,
    TargetCharset,
    MiddleUpdated,
    CaseSensitive,
    Icon2,
    PurchaseLicenseMsg,
    LicenseExpiredMsg,
    PurchaseAddress,
    TitleWide,
    AuthorWide,
    LastUpdated,
    Contractions,
    FontName,
    About,
    Length,
}

/// What a property value turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoItem {
    /// Stored under the key's own name.
    Value(InfoValue),
    /// Several named values (flags, about).
    Values(Vec<(&'static str, InfoValue)>),
    Language(&'static Language),
    /// A code page label such as `cp1251`.
    Charset(&'static str),
    /// The value could not be decoded.
    Invalid,
}

impl InfoKey {
    pub fn from_code(code: u16) -> Option<Self> {
        let key = match code {
            0x01 => Self::Title,
            0x02 => Self::Author,
            0x03 => Self::Email,
            0x04 => Self::Copyright,
            0x07 => Self::SourceLang,
            0x08 => Self::TargetLang,
            0x09 => Self::Description,
            0x0A => Self::BrowsingEnabled,
            0x0B => Self::IconData,
            0x0C => Self::NumEntries,
            0x11 => Self::Flags,
            0x14 => Self::CreationTime,
            0x1A => Self::SourceCharset,
            0x1B => Self::TargetCharset,
            0x1C => Self::MiddleUpdated,
            0x20 => Self::CaseSensitive,
            0x24 => Self::Icon2,
            0x2C => Self::PurchaseLicenseMsg,
            0x2D => Self::LicenseExpiredMsg,
            0x2E => Self::PurchaseAddress,
            0x30 => Self::TitleWide,
            0x31 => Self::AuthorWide,
            0x33 => Self::LastUpdated,
            0x3B => Self::Contractions,
            0x3D => Self::FontName,
            0x41 => Self::About,
            0x43 => Self::Length,
            _ => return None,
        };
        Some(key)
    }

    /// Property name as emitted to the glossary.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Email => "email",
            Self::Copyright => "copyright",
            Self::SourceLang => "sourceLang",
            Self::TargetLang => "targetLang",
            Self::Description => "description",
            Self::BrowsingEnabled => "browsingEnabled",
            Self::IconData => "iconData",
            Self::NumEntries => "bgl_numEntries",
            Self::Flags => "flags",
            Self::CreationTime => "creationTime",
            Self::SourceCharset => "sourceCharset",
            Self::TargetCharset => "targetCharset",
            Self::MiddleUpdated => "middleUpdated",
            Self::CaseSensitive => "caseSensitive",
            Self::Icon2 => "icon2",
            Self::PurchaseLicenseMsg => "purchaseLicenseMsg",
            Self::LicenseExpiredMsg => "licenseExpiredMsg",
            Self::PurchaseAddress => "purchaseAddress",
            Self::TitleWide => "titleWide",
            Self::AuthorWide => "authorWide",
            Self::LastUpdated => "lastUpdated",
            Self::Contractions => "contractions",
            Self::FontName => "fontName",
            Self::About => "about",
            Self::Length => "length",
        }
    }

    pub fn decode(&self, value: &[u8]) -> InfoItem {
        match self {
            Self::Title
            | Self::Author
            | Self::Email
            | Self::Copyright
            | Self::Description
            | Self::PurchaseLicenseMsg
            | Self::LicenseExpiredMsg
            | Self::PurchaseAddress
            | Self::Contractions
            | Self::FontName => InfoItem::Value(InfoValue::Undecoded(value.to_vec())),
            Self::SourceLang | Self::TargetLang => decode_language(value),
            Self::BrowsingEnabled => match value.first() {
                Some(&b) => InfoItem::Value(InfoValue::Flag(b != 0)),
                None => InfoItem::Invalid,
            },
            Self::IconData | Self::Icon2 => InfoItem::Value(InfoValue::Bytes(value.to_vec())),
            Self::NumEntries | Self::Length => {
                InfoItem::Value(InfoValue::Integer(utils::read_number(value)))
            }
            Self::Flags => decode_flags(value),
            Self::CreationTime | Self::MiddleUpdated | Self::LastUpdated => decode_date(value),
            Self::SourceCharset | Self::TargetCharset => decode_charset(value),
            Self::CaseSensitive => InfoItem::Value(InfoValue::Flag(value == b"1")),
            Self::TitleWide | Self::AuthorWide => decode_utf16_info(value),
            Self::About => decode_about(value),
        }
    }
}

fn decode_language(value: &[u8]) -> InfoItem {
    let code = utils::read_number(value) as u32;
    match language::language_by_code(code) {
        Some(lang) => InfoItem::Language(lang),
        None => {
            warn!("read_type_3: unknown language code = {:#x}", code);
            InfoItem::Invalid
        }
    }
}

/// Decodes a charset code byte.
pub fn decode_charset(value: &[u8]) -> InfoItem {
    match value.first().copied().and_then(language::charset_by_code) {
        Some(charset) => InfoItem::Charset(charset),
        None => {
            warn!("read_type_3: unknown charset {:02x?}", value.first());
            InfoItem::Invalid
        }
    }
}

fn decode_flags(value: &[u8]) -> InfoItem {
    let flags = utils::read_number(value);
    InfoItem::Values(vec![
        ("utf8Encoding", InfoValue::Flag(flags & 0x8000 != 0)),
        ("spellingAlternatives", InfoValue::Flag(flags & 0x10000 == 0)),
        ("caseSensitive", InfoValue::Flag(flags & 0x1000 != 0)),
    ])
}

/// Decodes a timestamp stored as minutes since 1970-01-01 00:00.
fn decode_date(value: &[u8]) -> InfoItem {
    const EPOCH: PrimitiveDateTime = datetime!(1970-01-01 0:00);
    let minutes = utils::read_number(value);
    i64::try_from(minutes)
        .ok()
        .and_then(|m| EPOCH.checked_add(Duration::minutes(m)))
        .map(|d| InfoItem::Value(InfoValue::Date(d)))
        .unwrap_or(InfoItem::Invalid)
}

/// Decodes a wide-string property.
///
/// ```text
/// 00 00                      → empty
/// 00 01 <u32 len> 00 00 <len UTF-16LE units>
/// ```
fn decode_utf16_info(value: &[u8]) -> InfoItem {
    match value {
        [0, 0, rest @ ..] => {
            if !rest.is_empty() {
                warn!("utf16InfoDecode: unexpected data after empty marker");
            }
            InfoItem::Invalid
        }
        [0, 1, rest @ ..] if rest.len() >= 6 => {
            let units = utils::read_number(&rest[..4]) as usize;
            if rest[4..6] != [0, 0] {
                warn!("utf16InfoDecode: unexpected padding {:02x?}", &rest[4..6]);
            }
            let text = &rest[6..];
            if text.len() != units * 2 {
                warn!(
                    "utf16InfoDecode: declared {} units, found {} bytes",
                    units,
                    text.len()
                );
            }
            let (decoded, _) = UTF_16LE.decode_without_bom_handling(text);
            InfoItem::Value(InfoValue::Text(decoded.into_owned()))
        }
        _ => {
            warn!("utf16InfoDecode: unrecognized prefix {:02x?}", &value[..value.len().min(2)]);
            InfoItem::Invalid
        }
    }
}

/// Splits `extension\0contents`.
fn decode_about(value: &[u8]) -> InfoItem {
    let mut parts = value.splitn(2, |&b| b == 0);
    let extension = parts.next().unwrap_or_default();
    let contents = parts.next().unwrap_or_default();
    if extension.is_empty() {
        warn!("aboutInfoDecode: no extension");
        return InfoItem::Invalid;
    }
    InfoItem::Values(vec![
        (
            "about_extension",
            InfoValue::Text(String::from_utf8_lossy(extension).into_owned()),
        ),
        ("about", InfoValue::Bytes(contents.to_vec())),
    ])
}
