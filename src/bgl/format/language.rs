//! Babylon language codes and their default code pages.

/// A language as declared in the `sourceLang` / `targetLang` properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: u32,
    pub name: &'static str,
    /// Code page Babylon uses for this language when no charset is declared.
    pub encoding: &'static str,
}

const fn lang(code: u32, name: &'static str, encoding: &'static str) -> Language {
    Language { code, name, encoding }
}

static LANGUAGES: [Language; 62] = [
    lang(0x00, "English", "cp1252"),
    lang(0x01, "French", "cp1252"),
    lang(0x02, "Italian", "cp1252"),
    lang(0x03, "Spanish", "cp1252"),
    lang(0x04, "Dutch", "cp1252"),
    lang(0x05, "Portuguese", "cp1252"),
    lang(0x06, "German", "cp1252"),
    lang(0x07, "Russian", "cp1251"),
    lang(0x08, "Japanese", "cp932"),
    lang(0x09, "Chinese (Traditional)", "cp950"),
    lang(0x0A, "Chinese (Simplified)", "cp936"),
    lang(0x0B, "Greek", "cp1253"),
    lang(0x0C, "Korean", "cp949"),
    lang(0x0D, "Turkish", "cp1254"),
    lang(0x0E, "Hebrew", "cp1255"),
    lang(0x0F, "Arabic", "cp1256"),
    lang(0x10, "Thai", "cp874"),
    lang(0x11, "Other", "cp1252"),
    lang(0x12, "Other Simplified Chinese dialects", "cp936"),
    lang(0x13, "Other Traditional Chinese dialects", "cp950"),
    lang(0x14, "Other Eastern-European languages", "cp1250"),
    lang(0x15, "Other Western-European languages", "cp1252"),
    lang(0x16, "Other Russian languages", "cp1251"),
    lang(0x17, "Other Japanese languages", "cp932"),
    lang(0x18, "Other Baltic languages", "cp1257"),
    lang(0x19, "Other Greek languages", "cp1253"),
    lang(0x1A, "Other Korean dialects", "cp949"),
    lang(0x1B, "Other Turkish dialects", "cp1254"),
    lang(0x1C, "Other Thai dialects", "cp874"),
    lang(0x1D, "Polish", "cp1250"),
    lang(0x1E, "Hungarian", "cp1250"),
    lang(0x1F, "Czech", "cp1250"),
    lang(0x20, "Lithuanian", "cp1257"),
    lang(0x21, "Latvian", "cp1257"),
    lang(0x22, "Catalan", "cp1252"),
    lang(0x23, "Croatian", "cp1250"),
    lang(0x24, "Serbian", "cp1250"),
    lang(0x25, "Slovak", "cp1250"),
    lang(0x26, "Albanian", "cp1252"),
    lang(0x27, "Urdu", "cp1256"),
    lang(0x28, "Slovenian", "cp1250"),
    lang(0x29, "Estonian", "cp1252"),
    lang(0x2A, "Bulgarian", "cp1250"),
    lang(0x2B, "Danish", "cp1252"),
    lang(0x2C, "Finnish", "cp1252"),
    lang(0x2D, "Icelandic", "cp1252"),
    lang(0x2E, "Norwegian", "cp1252"),
    lang(0x2F, "Romanian", "cp1252"),
    lang(0x30, "Swedish", "cp1252"),
    lang(0x31, "Ukrainian", "cp1251"),
    lang(0x32, "Belarusian", "cp1251"),
    lang(0x33, "Persian", "cp1256"),
    lang(0x34, "Basque", "cp1252"),
    lang(0x35, "Macedonian", "cp1250"),
    lang(0x36, "Afrikaans", "cp1252"),
    lang(0x37, "Faeroese", "cp1252"),
    lang(0x38, "Latin", "cp1252"),
    lang(0x39, "Esperanto", "cp1254"),
    lang(0x3A, "Tamazight", "cp1252"),
    lang(0x3B, "Armenian", "cp1252"),
    lang(0x3C, "Hindi", "cp1252"),
    lang(0x3D, "Somali", "cp1252"),
];

/// Looks up a language by its Babylon code.
pub fn language_by_code(code: u32) -> Option<&'static Language> {
    LANGUAGES.get(code as usize).filter(|l| l.code == code)
}

/// Maps the charset byte of type-0 and type-3 blocks to a code page.
pub fn charset_by_code(code: u8) -> Option<&'static str> {
    let charset = match code {
        0x41 | 0x42 => "cp1252",
        0x43 => "cp1250",
        0x44 => "cp1251",
        0x45 => "cp932",
        0x46 => "cp950",
        0x47 => "cp936",
        0x48 => "cp1257",
        0x49 => "cp1253",
        0x4A => "cp949",
        0x4B => "cp1254",
        0x4C => "cp1255",
        0x4D => "cp1256",
        0x4E => "cp874",
        _ => return None,
    };
    Some(charset)
}
