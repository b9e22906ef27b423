//! Encoding lookup and byte-to-text conversion.

use encoding_rs::Encoding;

/// How undecodable bytes are handled by [`decode_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lossy {
    /// Drop them. Used for keys and alternates.
    Drop,
    /// Emit U+FFFD. Used for definitions.
    Replace,
}

/// Resolves an encoding label, accepting the Windows code-page names used
/// by Babylon metadata (`cp1252`, `cp936`, ...) as well as WHATWG labels.
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
    let encoding = match normalized.as_str() {
        "cp1250" => encoding_rs::WINDOWS_1250,
        "cp1251" => encoding_rs::WINDOWS_1251,
        "cp1252" => encoding_rs::WINDOWS_1252,
        "cp1253" => encoding_rs::WINDOWS_1253,
        "cp1254" => encoding_rs::WINDOWS_1254,
        "cp1255" => encoding_rs::WINDOWS_1255,
        "cp1256" => encoding_rs::WINDOWS_1256,
        "cp1257" => encoding_rs::WINDOWS_1257,
        "cp874" => encoding_rs::WINDOWS_874,
        "cp932" => encoding_rs::SHIFT_JIS,
        "cp936" | "gbk" => encoding_rs::GBK,
        "cp949" => encoding_rs::EUC_KR,
        "cp950" => encoding_rs::BIG5,
        "utf8" | "utf-8" => encoding_rs::UTF_8,
        other => return Encoding::for_label(other.as_bytes()),
    };
    Some(encoding)
}

/// Decodes `bytes` without BOM sniffing.
///
/// Returns the text and whether any malformed sequence was found. With
/// [`Lossy::Drop`] malformed sequences vanish from the output.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding, lossy: Lossy) -> (String, bool) {
    if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        return (text.into_owned(), false);
    }
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    let text = match lossy {
        Lossy::Drop => text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect(),
        Lossy::Replace => text.into_owned(),
    };
    (text, true)
}
