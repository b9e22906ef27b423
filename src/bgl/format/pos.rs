//! Part-of-speech codes of the `0x02` trailing field.

/// Label for a part-of-speech code, `None` if the code is unknown.
///
/// Some codes are known to occur but carry no usable label; they map to an
/// empty string.
pub fn part_of_speech(code: u8) -> Option<&'static str> {
    let label = match code {
        0x30 => "noun",
        0x31 => "adjective",
        0x32 => "verb",
        0x33 => "adverb",
        0x34 => "interjection",
        0x35 => "pronoun",
        0x36 => "preposition",
        0x37 => "conjunction",
        0x38 => "suffix",
        0x39 => "prefix",
        0x3A => "article",
        // Italian-English, Spanish-English and Chinese-English glossaries
        0x3B => "",
        0x3C => "abbreviation",
        0x3D => "masculine noun and adjective",
        0x3E => "feminine noun and adjective",
        0x3F => "masculine and feminine noun and adjective",
        0x40 => "feminine noun",
        0x41 => "masculine and feminine noun",
        0x42 => "masculine noun",
        0x43 => "numeral",
        0x44 => "participle",
        0x45..=0x47 => "",
        _ => return None,
    };
    Some(label)
}
