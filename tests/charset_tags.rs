use bgl_reader::bgl::codec::charset::{Lossy, decode_text, encoding_for_label};
use bgl_reader::bgl::diagnostics::DefinitionStats;
use bgl_reader::bgl::format::charset_tags::{CharsetTagDecoder, decode_charset_tags};
use encoding_rs::{GBK, UTF_8, WINDOWS_1251, WINDOWS_1252};

#[test]
fn test_text_outside_spans_uses_default() {
    assert_eq!(
        decode_charset_tags(b"caf\xe9", WINDOWS_1252, WINDOWS_1251),
        ("café".to_string(), true)
    );
}

#[test]
fn test_utf8_span() {
    assert_eq!(
        decode_charset_tags(b"<charset c=u>41</charset>", WINDOWS_1252, WINDOWS_1252),
        ("41".to_string(), false)
    );
    assert_eq!(
        decode_charset_tags("a<charset c=\"U\">é</charset>b".as_bytes(), WINDOWS_1252, WINDOWS_1252),
        ("aéb".to_string(), false)
    );
}

#[test]
fn test_babylon_reference_span() {
    assert_eq!(
        decode_charset_tags(b"<charset c=t>00E6;0101;</charset>", WINDOWS_1252, WINDOWS_1252),
        ("æā".to_string(), true)
    );
    // malformed references are dropped
    assert_eq!(
        decode_charset_tags(b"<charset c=t>00E6;zz;0041</charset>", WINDOWS_1252, WINDOWS_1252),
        ("æA".to_string(), true)
    );
}

#[test]
fn test_source_encoding_span() {
    assert_eq!(
        decode_charset_tags(b"<charset c=k>\xe9</charset>", WINDOWS_1252, WINDOWS_1251),
        ("й".to_string(), false)
    );
    assert_eq!(
        decode_charset_tags(b"<charset c='e'>\xe9</charset>", WINDOWS_1251, WINDOWS_1251),
        ("й".to_string(), true)
    );
}

#[test]
fn test_gbk_span() {
    assert_eq!(
        decode_charset_tags(b"<charset c=g>\xc4\xe3</charset>", WINDOWS_1252, WINDOWS_1252),
        ("你".to_string(), false)
    );
}

#[test]
fn test_nested_spans() {
    let text = b"<charset c=k>\xe9<charset c=t>0101;</charset>\xe9</charset>";
    assert_eq!(
        decode_charset_tags(text, WINDOWS_1252, WINDOWS_1251),
        ("йāй".to_string(), false)
    );
}

#[test]
fn test_cp1252_char_refs_become_bytes() {
    assert_eq!(
        decode_charset_tags(b"a&#150;b", WINDOWS_1252, WINDOWS_1252),
        ("a\u{2013}b".to_string(), true)
    );
    // outside cp1252 the reference is left for entity replacement
    assert_eq!(
        decode_charset_tags(b"a&#150;b", WINDOWS_1251, WINDOWS_1251),
        ("a&#150;b".to_string(), true)
    );
}

#[test]
fn test_unbalanced_close_tag() {
    assert_eq!(
        decode_charset_tags(b"a</charset>b", WINDOWS_1252, WINDOWS_1252),
        ("ab".to_string(), true)
    );
}

#[test]
fn test_unknown_code_uses_default() {
    assert_eq!(
        decode_charset_tags(b"<charset c=z>x</charset>", WINDOWS_1252, WINDOWS_1251),
        ("x".to_string(), true)
    );
}

#[test]
fn test_unclosed_span_runs_to_end() {
    assert_eq!(
        decode_charset_tags(b"x<charset c=k>\xe9", WINDOWS_1252, WINDOWS_1251),
        ("xй".to_string(), false)
    );
}

#[test]
fn test_stats_count_char_refs() {
    let mut stats = DefinitionStats::default();
    let (text, _) = CharsetTagDecoder::new(WINDOWS_1251, true)
        .with_stats(Some(&mut stats))
        .decode(b"&#1072;<charset c=u>&#1072;</charset>", WINDOWS_1251);
    assert_eq!(text, "&#1072;&#1072;");
    let counts = stats.char_refs.get(WINDOWS_1251.name()).expect("windows-1251 counted");
    assert_eq!(counts.iter().sum::<u64>(), 1);
    let counts = stats.char_refs.get(UTF_8.name()).expect("utf-8 counted");
    assert_eq!(counts.iter().sum::<u64>(), 1);
}

#[test]
fn test_encoding_labels() {
    assert_eq!(encoding_for_label("cp1251"), Some(WINDOWS_1251));
    assert_eq!(encoding_for_label(" CP1252 "), Some(WINDOWS_1252));
    assert_eq!(encoding_for_label("gbk"), Some(GBK));
    assert_eq!(encoding_for_label("utf_8"), Some(UTF_8));
    assert_eq!(encoding_for_label("latin1"), Some(WINDOWS_1252));
    assert_eq!(encoding_for_label("no-such-charset"), None);
}

#[test]
fn test_decode_text_lossy_modes() {
    assert_eq!(decode_text(b"ok", UTF_8, Lossy::Drop), ("ok".to_string(), false));
    assert_eq!(decode_text(b"a\xffb", UTF_8, Lossy::Drop), ("ab".to_string(), true));
    assert_eq!(
        decode_text(b"a\xffb", UTF_8, Lossy::Replace),
        ("a\u{FFFD}b".to_string(), true)
    );
}
