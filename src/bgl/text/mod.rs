//! Text cleanup shared by keys, alternates and definitions.
//!
//! Keys and alternates are cleaned on raw bytes first (dollar indexes),
//! everything else works on decoded text.

pub mod entities;

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use regex::bytes::{Captures as ByteCaptures, Regex as BytesRegex};

pub use entities::{replace_html_entries, replace_html_entries_in_keys};

static CONTROL_CHARS: OnceLock<Regex> = OnceLock::new();
static NEW_LINES: OnceLock<Regex> = OnceLock::new();
static HTML_TAGS: OnceLock<Regex> = OnceLock::new();
static SLASH_ALT: OnceLock<Regex> = OnceLock::new();
static CHAR_REF: OnceLock<BytesRegex> = OnceLock::new();

fn control_chars_regex() -> &'static Regex {
    CONTROL_CHARS.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0c\x0e-\x1f]").expect("Invalid control chars regex pattern")
    })
}

fn new_lines_regex() -> &'static Regex {
    NEW_LINES.get_or_init(|| Regex::new(r"[\r\n]+").expect("Invalid new lines regex pattern"))
}

fn html_tags_regex() -> &'static Regex {
    HTML_TAGS.get_or_init(|| {
        Regex::new(r"(?:<[/a-zA-Z].*?(?:>|$))+").expect("Invalid html tags regex pattern")
    })
}

fn slash_alt_regex() -> &'static Regex {
    SLASH_ALT.get_or_init(|| Regex::new(r"(^|\s)/(\w)").expect("Invalid slash regex pattern"))
}

/// `&#NNN;` / `&#xHH;` on raw bytes, ASCII word characters only.
fn char_ref_regex() -> &'static BytesRegex {
    CHAR_REF.get_or_init(|| BytesRegex::new(r"(?i-u)&#(x?)(\w+);").expect("Invalid char ref regex pattern"))
}

/// Removes `$<digits>$` index markers and runs of two or more `$`.
///
/// Returns the stripped bytes and the number of index markers removed.
/// A `$` pair enclosing anything but digits is kept literally.
///
/// ```text
/// abc$12$def → abcdef
/// abc$$def   → abcdef
/// abc$x$def  → abc$x$def
/// ```
pub fn strip_dollar_indexes(word: &[u8]) -> (Vec<u8>, usize) {
    let find = |from: usize| word[from..].iter().position(|&b| b == b'$').map(|p| p + from);
    let mut out = Vec::with_capacity(word.len());
    let mut strip_cnt = 0;
    let mut i = 0;
    loop {
        let Some(d0) = find(i) else {
            out.extend_from_slice(&word[i..]);
            break;
        };
        let Some(d1) = find(d0 + 1) else {
            out.extend_from_slice(&word[i..]);
            break;
        };
        if d1 == d0 + 1 {
            out.extend_from_slice(&word[i..d0]);
            i = d1 + 1;
            while i < word.len() && word[i] == b'$' {
                i += 1;
            }
            if i >= word.len() {
                break;
            }
            continue;
        }
        if !word[d0 + 1..d1].iter().all(u8::is_ascii_digit) {
            out.extend_from_slice(&word[i..d1]);
            i = d1;
            continue;
        }
        out.extend_from_slice(&word[i..d0]);
        i = d1 + 1;
        strip_cnt += 1;
    }
    (out, strip_cnt)
}

/// Removes C0 control characters except tab, line feed, vertical tab and carriage return.
pub fn remove_control_chars(text: &str) -> Cow<'_, str> {
    control_chars_regex().replace_all(text, "")
}

/// Collapses line breaks into a single space.
pub fn replace_new_lines(text: &str) -> Cow<'_, str> {
    new_lines_regex().replace_all(text, " ")
}

/// Collapses runs of `\r` / `\n` into one `\n`.
pub fn normalize_new_lines(text: &str) -> Cow<'_, str> {
    new_lines_regex().replace_all(text, "\n")
}

/// Drops the `\x1e` / `\x1f` markers that wrap resource names in `src` attributes.
pub fn fix_img_links(text: &str) -> String {
    text.replace(['\x1e', '\x1f'], "")
}

pub fn strip_html_tags(text: &str) -> Cow<'_, str> {
    html_tags_regex().replace_all(text, " ")
}

/// Drops a `/` that marks an optional form at the start of a word.
pub fn strip_slash_alt(text: &str) -> Cow<'_, str> {
    slash_alt_regex().replace_all(text, "${1}${2}")
}

/// Escapes `&`, `<` and `>`.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn char_ref_code(caps: &ByteCaptures) -> Option<u32> {
    let digits = std::str::from_utf8(&caps[2]).ok()?;
    let code = if caps[1].is_empty() {
        digits.parse::<u32>().ok()?
    } else {
        u32::from_str_radix(digits, 16).ok()?
    };
    (code > 0).then_some(code)
}

/// Replaces references to code points 128-255 with the raw byte.
///
/// Some cp1252 dictionaries store their upper half as `&#150;`-style
/// references; turning them back into bytes lets the code page decode them.
pub fn replace_ascii_char_refs(text: &[u8]) -> Cow<'_, [u8]> {
    char_ref_regex().replace_all(text, |caps: &ByteCaptures| match char_ref_code(caps) {
        Some(code @ 128..=255) => vec![code as u8],
        _ => caps[0].to_vec(),
    })
}

/// Code points of the valid character references in `text`.
pub fn char_ref_codes(text: &[u8]) -> impl Iterator<Item = u32> + '_ {
    char_ref_regex()
        .captures_iter(text)
        .filter_map(|caps| char_ref_code(&caps))
}
