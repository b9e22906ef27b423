mod common;

use std::fs;

use bgl_reader::bgl::codec::gzip::FooterStatus;
use bgl_reader::{BglError, BglOptions, BglReader, BlockRun, Entry, InfoValue};
use common::{MemoryGlossary, container, entry, info, resource, wide_entry};
use encoding_rs::{UTF_8, WINDOWS_1251, WINDOWS_1252};
use tempfile::TempDir;

const DICT_NAME: &str = "dict.bgl";

fn open_with(blocks: &[(u8, Vec<u8>)], options: BglOptions) -> (TempDir, BglReader) {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), DICT_NAME, &container(blocks));
    let reader = BglReader::open(&path, options).unwrap();
    (dir, reader)
}

fn open(blocks: &[(u8, Vec<u8>)]) -> (TempDir, BglReader) {
    open_with(blocks, BglOptions::default())
}

fn open_err(bytes: &[u8], options: BglOptions) -> BglError {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), DICT_NAME, bytes);
    BglReader::open(&path, options).err().unwrap()
}

fn all_entries(reader: &mut BglReader) -> Vec<Entry> {
    reader.entries().unwrap().map(|e| e.unwrap()).collect()
}

fn single_definition(defi: &[u8]) -> String {
    let (_dir, mut reader) = open(&[(1, entry(b"w", defi, &[]))]);
    all_entries(&mut reader).remove(0).definition
}

fn has_warning(reader: &BglReader, needle: &str) -> bool {
    reader.diagnostics().warnings().iter().any(|w| w.contains(needle))
}

#[test]
fn test_minimal_dictionary() {
    let (_dir, mut reader) = open(&[(1, entry(b"hello", b"world", &[]))]);
    assert_eq!(reader.num_entries(), 1);
    assert_eq!(reader.num_blocks(), 1);
    assert_eq!(
        all_entries(&mut reader),
        vec![Entry {
            word: "hello".to_string(),
            alternates: vec![],
            definition: "world".to_string(),
        }]
    );
    assert_eq!(reader.diagnostics().footer(), Some(FooterStatus::Verified));
}

#[test]
fn test_entries_restart_on_each_call() {
    let (_dir, mut reader) = open(&[
        (1, entry(b"one", b"1", &[])),
        (1, entry(b"two", b"2", &[])),
    ]);
    let first: Vec<String> = all_entries(&mut reader).into_iter().map(|e| e.word).collect();
    let second: Vec<String> = all_entries(&mut reader).into_iter().map(|e| e.word).collect();
    assert_eq!(first, vec!["one", "two"]);
    assert_eq!(first, second);
}

#[test]
fn test_crc_mismatch_keeps_entries() {
    let mut bytes = container(&[(1, entry(b"hello", b"world", &[]))]);
    let crc_at = bytes.len() - 8;
    bytes[crc_at..crc_at + 4].fill(0);

    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), DICT_NAME, &bytes);
    let mut reader = BglReader::open(&path, BglOptions::default()).unwrap();
    assert_eq!(all_entries(&mut reader).len(), 1);
    assert!(matches!(
        reader.diagnostics().footer(),
        Some(FooterStatus::CrcMismatch { stored: 0, .. })
    ));
    let crc_warnings = reader
        .diagnostics()
        .warnings()
        .iter()
        .filter(|w| w.starts_with("CRC check failed"))
        .count();
    assert_eq!(crc_warnings, 1);
}

#[test]
fn test_size_mismatch_is_fatal() {
    let mut bytes = container(&[(1, entry(b"hello", b"world", &[]))]);
    let size_at = bytes.len() - 4;
    bytes[size_at..].fill(0);
    let err = open_err(&bytes, BglOptions::default());
    assert!(matches!(err, BglError::SizeMismatch { expected: 0, .. }), "got {:?}", err);
}

#[test]
fn test_failed_open_removes_resource_dir() {
    let mut bytes = container(&[(1, entry(b"hello", b"world", &[]))]);
    let size_at = bytes.len() - 4;
    bytes[size_at] ^= 0xFF;

    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), DICT_NAME, &bytes);
    let err = BglReader::open(&path, BglOptions::default()).err().unwrap();
    assert!(matches!(err, BglError::SizeMismatch { .. }), "got {:?}", err);
    assert!(!dir.path().join(format!("{}_files", DICT_NAME)).exists());
}

#[test]
fn test_bad_dump_path_creates_no_resource_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), DICT_NAME, &container(&[(1, entry(b"a", b"b", &[]))]));
    let options = BglOptions {
        raw_dump_path: Some(dir.path().join("missing").join("raw.dump")),
        ..Default::default()
    };
    let err = BglReader::open(&path, options).err().unwrap();
    assert!(matches!(err, BglError::Io(_)), "got {:?}", err);
    assert!(!dir.path().join(format!("{}_files", DICT_NAME)).exists());
}

#[test]
fn test_missing_footer() {
    let mut bytes = container(&[(1, entry(b"hello", b"world", &[]))]);
    bytes.truncate(bytes.len() - 8);
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), DICT_NAME, &bytes);
    let mut reader = BglReader::open(&path, BglOptions::default()).unwrap();
    assert_eq!(all_entries(&mut reader).len(), 1);
    assert_eq!(reader.diagnostics().footer(), Some(FooterStatus::Missing));
}

#[test]
fn test_invalid_signature() {
    let err = open_err(b"\x00\x00\x00\x00\x00\x06garbage", BglOptions::default());
    assert!(matches!(err, BglError::InvalidSignature(_)), "got {:?}", err);

    let err = open_err(b"\x12\x34", BglOptions::default());
    assert!(matches!(err, BglError::InvalidSignature(_)), "got {:?}", err);
}

#[test]
fn test_invalid_gzip_offset() {
    let mut bytes = common::MAGIC.to_vec();
    bytes.extend_from_slice(&[0x00, 0x05]);
    bytes.extend(common::gzip(&[]));
    let err = open_err(&bytes, BglOptions::default());
    assert!(matches!(err, BglError::InvalidGzipOffset(5)), "got {:?}", err);
}

#[test]
fn test_gzip_member_after_padding() {
    let bytes = common::container_at(&[(1, entry(b"hello", b"world", &[]))], 64);
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), DICT_NAME, &bytes);
    let mut reader = BglReader::open(&path, BglOptions::default()).unwrap();
    assert_eq!(reader.signature().gzip_offset, 64);
    assert_eq!(all_entries(&mut reader)[0].word, "hello");
}

#[test]
fn test_properties() {
    let (_dir, reader) = open(&[
        (3, info(0x01, b"My Dict")),
        (3, info(0x07, &[0x00, 0x00, 0x00, 0x07])),
        (3, info(0x14, &1440u32.to_be_bytes())),
        (3, info(0x0C, &[0x00, 0x00, 0x00, 0x01])),
        (1, entry(b"hello", b"world", &[])),
    ]);

    assert_eq!(reader.source_lang().map(|l| l.name), Some("Russian"));
    assert_eq!(reader.target_lang(), None);
    assert_eq!(reader.encodings().source, WINDOWS_1251);
    assert_eq!(reader.encodings().target, WINDOWS_1252);
    assert_eq!(reader.encodings().default, WINDOWS_1252);

    let info = reader.info();
    assert_eq!(info.get("title"), Some(&InfoValue::Text("My Dict".to_string())));
    assert_eq!(info.get("bgl_numEntries"), Some(&InfoValue::Integer(1)));
    assert_eq!(
        info.get("bgl_creationTime").map(|v| v.to_string()),
        Some("1970/01/02, 00:00".to_string())
    );
    assert_eq!(info.get("creationTime"), None);
    assert_eq!(
        info.get("bgl_sourceEncoding"),
        Some(&InfoValue::Text("windows-1251".to_string()))
    );

    let keys: Vec<&str> = info.iter().map(|(k, _)| k).take(4).collect();
    assert_eq!(keys, vec!["sourceLang", "sourceCharset", "targetCharset", "title"]);
    assert!(reader.diagnostics().warnings().is_empty());
}

#[test]
fn test_entry_count_mismatch_warns() {
    let (_dir, reader) = open(&[
        (3, info(0x0C, &[0x05])),
        (1, entry(b"hello", b"world", &[])),
    ]);
    assert!(has_warning(&reader, "numEntries = 1"));
}

#[test]
fn test_utf8_flag_selects_utf8() {
    let (_dir, mut reader) = open(&[
        (3, info(0x11, &[0x00, 0x00, 0x80, 0x00])),
        (3, info(0x08, &[0x00, 0x00, 0x00, 0x07])),
        (1, entry("café".as_bytes(), "crème".as_bytes(), &[])),
    ]);
    assert_eq!(reader.encodings().source, UTF_8);
    assert_eq!(reader.encodings().target, UTF_8);
    assert_eq!(reader.info().get("utf8Encoding"), Some(&InfoValue::Flag(true)));
    let entries = all_entries(&mut reader);
    assert_eq!(entries[0].word, "café");
    assert_eq!(entries[0].definition, "crème");
}

#[test]
fn test_declared_charset_wins_over_language() {
    // sourceCharset 0x44 (cp1251) with an English source language
    let (_dir, reader) = open(&[
        (3, info(0x07, &[0x00, 0x00, 0x00, 0x00])),
        (3, info(0x1A, &[0x44])),
        (1, entry(b"a", b"b", &[])),
    ]);
    assert_eq!(reader.encodings().source, WINDOWS_1251);
    assert_eq!(
        reader.info().get("bgl_sourceCharset"),
        Some(&InfoValue::Text("cp1251".to_string()))
    );
}

#[test]
fn test_resources_extracted() {
    let (dir, reader) = open(&[
        (2, resource(b"a.png", b"PNG")),
        (2, resource(b"caf\xe9.txt", b"text")),
        (2, resource(b"C2EEF3F6.html", b"junk")),
        (2, resource(b"../x", b"bad")),
        (1, entry(b"hello", b"world", &[])),
    ]);
    let res_dir = dir.path().join(format!("{}_files", DICT_NAME));
    assert_eq!(reader.resources(), ["a.png".to_string(), "café.txt".to_string()]);
    assert_eq!(reader.resource_dir(), Some(res_dir.as_path()));
    assert_eq!(fs::read(res_dir.join("a.png")).unwrap(), b"PNG");
    assert_eq!(fs::read(res_dir.join("café.txt")).unwrap(), b"text");
    assert!(!res_dir.join("C2EEF3F6.html").exists());
    assert!(!dir.path().join("x").exists());
    let unsafe_warnings = reader
        .diagnostics()
        .warnings()
        .iter()
        .filter(|w| w.contains("unsafe resource name"))
        .count();
    assert_eq!(unsafe_warnings, 1);
}

#[test]
fn test_empty_resource_dir_removed() {
    let (dir, reader) = open(&[(1, entry(b"hello", b"world", &[]))]);
    assert_eq!(reader.resource_dir(), None);
    assert!(!dir.path().join(format!("{}_files", DICT_NAME)).exists());
}

#[test]
fn test_requested_resource_dir() {
    let dir = tempfile::tempdir().unwrap();
    let res_dir = dir.path().join("media");
    let path = common::write_file(
        dir.path(),
        DICT_NAME,
        &container(&[(2, resource(b"a.png", b"PNG")), (1, entry(b"a", b"b", &[]))]),
    );
    let options = BglOptions {
        res_path: Some(res_dir.clone()),
        ..Default::default()
    };
    let reader = BglReader::open(&path, options).unwrap();
    assert_eq!(reader.resource_dir(), Some(res_dir.as_path()));
    assert!(res_dir.join("a.png").is_file());
}

#[test]
fn test_wide_entry() {
    let (_dir, mut reader) = open(&[(11, wide_entry(b"test", b"a check", &[b"tests"]))]);
    let entries = all_entries(&mut reader);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].word, "test");
    assert_eq!(entries[0].definition, "a check");
    assert_eq!(entries[0].alternates, vec!["tests"]);
}

#[test]
fn test_alternates_sorted_and_deduplicated() {
    let (_dir, mut reader) = open(&[(
        1,
        entry(b"run", b"x", &[b"runs", b"ran", b"/running", b"ran", b"run"]),
    )]);
    let entries = all_entries(&mut reader);
    assert_eq!(entries[0].alternates, vec!["ran", "running", "runs"]);
}

#[test]
fn test_key_cleanup() {
    let (_dir, mut reader) = open(&[
        (1, entry(b"  word$1$\x01  ", b"x", &[])),
        (1, entry(b"two\r\nlines", b"x", &[])),
    ]);
    let words: Vec<String> = all_entries(&mut reader).into_iter().map(|e| e.word).collect();
    assert_eq!(words, vec!["word", "two lines"]);
}

#[test]
fn test_malformed_entry_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("messages.log");
    let path = common::write_file(
        dir.path(),
        DICT_NAME,
        &container(&[
            (1, vec![10, b'a']),
            (1, entry(b"good", b"ok", &[])),
        ]),
    );
    let options = BglOptions {
        msg_log_path: Some(log_path.clone()),
        ..Default::default()
    };
    let mut reader = BglReader::open(&path, options).unwrap();
    assert_eq!(reader.num_entries(), 2);
    let entries = all_entries(&mut reader);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].word, "good");
    assert_eq!(reader.diagnostics().entries_skipped(), 1);

    reader.close();
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("offset = 0x0"));
    assert!(log.contains("reading word"));
}

#[test]
fn test_encoding_override() {
    let options = BglOptions {
        source_encoding: Some("cp1251".to_string()),
        ..Default::default()
    };
    let (_dir, mut reader) = open_with(&[(1, entry(b"\xef\xf0\xe8\xe2\xe5\xf2", b"hi", &[]))], options);
    assert_eq!(reader.encodings().source, WINDOWS_1251);
    assert_eq!(all_entries(&mut reader)[0].word, "привет");
}

#[test]
fn test_unknown_encoding_override() {
    let options = BglOptions {
        target_encoding: Some("bogus-enc".to_string()),
        ..Default::default()
    };
    let err = open_err(&container(&[(1, entry(b"a", b"b", &[]))]), options);
    assert!(matches!(err, BglError::UnknownEncoding(ref l) if l == "bogus-enc"), "got {:?}", err);
}

#[test]
fn test_key_rstrip_chars() {
    let options = BglOptions {
        key_rstrip_chars: Some(",;".to_string()),
        ..Default::default()
    };
    let (_dir, mut reader) = open_with(&[(1, entry(b"word;,", b"x", &[]))], options);
    assert_eq!(all_entries(&mut reader)[0].word, "word");
}

#[test]
fn test_process_html_in_key() {
    let blocks = [(1, entry(b"<b>bold</b>&amp;x", b"x", &[]))];

    let (_dir, mut reader) = open(&blocks);
    assert_eq!(all_entries(&mut reader)[0].word, "<b>bold</b>&amp;x");

    let options = BglOptions {
        process_html_in_key: true,
        ..Default::default()
    };
    let (_dir, mut reader) = open_with(&blocks, options);
    assert_eq!(all_entries(&mut reader)[0].word, "bold &x");
}

#[test]
fn test_part_of_speech_prefix() {
    assert_eq!(
        single_definition(b"main\x14\x02\x42"),
        "<font color=\"#007000\">masculine noun</font><br>\nmain"
    );
}

#[test]
fn test_part_of_speech_color_option() {
    let options = BglOptions {
        part_of_speech_color: "ff0000".to_string(),
        ..Default::default()
    };
    let (_dir, mut reader) = open_with(&[(1, entry(b"w", b"main\x14\x02\x30", &[]))], options);
    assert_eq!(
        all_entries(&mut reader)[0].definition,
        "<font color=\"#ff0000\">noun</font><br>\nmain"
    );
}

#[test]
fn test_title_line() {
    assert_eq!(single_definition(b"text\x14\x18\x05Title"), "Title<br>\ntext");
}

#[test]
fn test_transcription_line() {
    assert_eq!(single_definition(b"d\x14\x50\x1B\x03abc"), "[abc]<br>\nd");
    // sub-code 0x18 carries no text
    assert_eq!(single_definition(b"d\x14\x50\x18\x03abc"), "d");
}

#[test]
fn test_trailing_fields_disabled() {
    let options = BglOptions {
        no_control_sequence_in_defi: true,
        ..Default::default()
    };
    let (_dir, mut reader) = open_with(&[(1, entry(b"w", b"main\x14\x02\x42", &[]))], options);
    // the marker and tag bytes are control characters and get removed
    assert_eq!(all_entries(&mut reader)[0].definition, "mainB");
}

#[test]
fn test_definition_entities() {
    let (_dir, mut reader) = open(&[(1, entry(b"w", b"a &amp; b &eacute; &#65; &bogus;", &[]))]);
    assert_eq!(all_entries(&mut reader)[0].definition, "a &amp; b \u{e9} A &bogus;");
    assert!(has_warning(&reader, "unknown html entity &bogus;"));
}

#[test]
fn test_unknown_entity_warned_once() {
    let (_dir, mut reader) = open(&[
        (1, entry(b"a", b"x &bogus; y", &[])),
        (1, entry(b"b", b"&bogus; again &bogus;", &[])),
    ]);
    let entries = all_entries(&mut reader);
    assert_eq!(entries[1].definition, "&bogus; again &bogus;");
    let count = reader
        .diagnostics()
        .warnings()
        .iter()
        .filter(|w| *w == "unknown html entity &bogus;")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_malformed_bytes_with_and_without_strict_conversion() {
    let blocks = [(1, entry(b"ca\xfffe", b"d\xffx", &[]))];
    for strict in [true, false] {
        let options = BglOptions {
            source_encoding: Some("utf8".to_string()),
            target_encoding: Some("utf8".to_string()),
            strict_string_conversion: strict,
            ..Default::default()
        };
        let (_dir, mut reader) = open_with(&blocks, options);
        let entries = all_entries(&mut reader);
        assert_eq!(entries[0].word, "cafe", "strict = {}", strict);
        assert_eq!(entries[0].definition, "d\u{FFFD}x", "strict = {}", strict);
    }
}

#[test]
fn test_definition_line_breaks() {
    assert_eq!(single_definition(b"  line1\r\n\r\nline2\x01  "), "line1\nline2");
}

#[test]
fn test_definition_charset_spans() {
    let (_dir, mut reader) = open(&[(1, entry(b"w", b"a<charset c=u>\xc3\xa9</charset>b", &[]))]);
    assert_eq!(all_entries(&mut reader)[0].definition, "a\u{e9}b");
    assert_eq!(reader.diagnostics().mixed_encoding_definitions(), 1);
}

#[test]
fn test_image_link_markers_removed() {
    assert_eq!(
        single_definition(b"<img src=\"\x1ea.png\x1f\">"),
        "<img src=\"a.png\">"
    );
}

#[test]
fn test_read_into_glossary() {
    let (_dir, mut reader) = open(&[
        (3, info(0x01, b"Glossary")),
        (1, entry(b"one", b"1", &[])),
        (1, entry(b"two", b"2", &[b"deux"])),
    ]);
    let mut glossary = MemoryGlossary::default();
    assert_eq!(reader.read_into(&mut glossary).unwrap(), 2);

    assert_eq!(glossary.info.len(), reader.info().len());
    assert_eq!(glossary.info[0].0, "sourceCharset");
    assert!(glossary
        .info
        .contains(&("title".to_string(), InfoValue::Text("Glossary".to_string()))));
    assert_eq!(glossary.entries.len(), 2);
    assert_eq!(glossary.entries[1].alternates, vec!["deux"]);
}

#[test]
fn test_block_summary() {
    let (_dir, mut reader) = open(&[
        (3, info(0x01, b"T")),
        (1, entry(b"a", b"1", &[])),
        (1, entry(b"b", b"2", &[])),
        (1, entry(b"c", b"3", &[])),
        (2, resource(b"r.txt", b"x")),
        (1, entry(b"d", b"4", &[])),
    ]);
    let summary = reader.block_summary().unwrap();
    assert_eq!(summary.gzip_offset, 6);
    assert_eq!(summary.num_blocks, 6);
    assert_eq!(summary.num_entries, 4);
    assert_eq!(summary.num_files, 1);
    assert_eq!(
        summary.blocks,
        vec![
            BlockRun::Single { block_type: 3, len: 3 },
            BlockRun::Run { block_type: 1, count: 3 },
            BlockRun::Run { block_type: 2, count: 1 },
            BlockRun::Run { block_type: 1, count: 1 },
        ]
    );
    // the summary leaves the stream usable
    assert_eq!(all_entries(&mut reader).len(), 4);
}

#[test]
fn test_close_is_idempotent() {
    let (_dir, mut reader) = open(&[(1, entry(b"hello", b"world", &[]))]);
    reader.close();
    reader.close();
    assert!(reader.entries().is_err());
    assert!(reader.block_summary().is_err());
}

#[test]
fn test_definition_statistics() {
    let options = BglOptions {
        collect_metadata2: true,
        ..Default::default()
    };
    let (_dir, mut reader) = open_with(
        &[
            (1, entry(b"a", b"plain", &[])),
            (1, entry(b"b", b"x\x14\x02\x30", &[])),
            (1, entry(b"c", b"<charset c=u>\xc3\xa9</charset>", &[])),
        ],
        options,
    );
    assert_eq!(all_entries(&mut reader).len(), 3);

    let stats = reader.definition_stats().unwrap();
    assert_eq!(stats.defi_processed_count, 2);
    assert_eq!(stats.defi_ascii_count, 2);
    assert_eq!(stats.defi_utf8_count, 2);
    assert_eq!(stats.defi_trailing_fields[0x02], 1);
    assert!(!stats.is_defi_ascii);
}

#[test]
fn test_statistics_off_by_default() {
    let (_dir, mut reader) = open(&[(1, entry(b"a", b"plain", &[]))]);
    all_entries(&mut reader);
    assert!(reader.definition_stats().is_none());
}

#[test]
fn test_dumps() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw.dump");
    let decoded_path = dir.path().join("decoded.dump");
    let path = common::write_file(
        dir.path(),
        DICT_NAME,
        &container(&[(1, entry(b"hello", b"world", &[b"hi"]))]),
    );
    let options = BglOptions {
        raw_dump_path: Some(raw_path.clone()),
        decoded_dump_path: Some(decoded_path.clone()),
        ..Default::default()
    };
    let mut reader = BglReader::open(&path, options).unwrap();
    all_entries(&mut reader);
    reader.close();

    let raw = fs::read_to_string(&raw_path).unwrap();
    assert!(raw.contains("block type = 1\nkey = hello"));
    assert!(raw.contains("\ndefi = world"));
    assert!(raw.contains("\nalt = hi"));
    let decoded = fs::read_to_string(&decoded_path).unwrap();
    assert!(decoded.contains("\n\nkey: hello"));
    assert!(decoded.contains("\ndefi: world"));
    assert!(decoded.contains("\nalt: hi"));
}

#[test]
fn test_char_samples() {
    let dir = tempfile::tempdir().unwrap();
    let samples_path = dir.path().join("samples.log");
    let path = common::write_file(
        dir.path(),
        DICT_NAME,
        &container(&[
            (1, entry(b"w", b"caf\xe9", &[])),
            (1, entry(b"v", b"d\xe9j\xe0", &[])),
        ]),
    );
    let options = BglOptions {
        search_char_samples: true,
        char_samples_path: Some(samples_path.clone()),
        ..Default::default()
    };
    let mut reader = BglReader::open(&path, options).unwrap();
    all_entries(&mut reader);
    reader.close();

    let log = String::from_utf8_lossy(&fs::read(&samples_path).unwrap()).into_owned();
    assert!(log.contains("charSample(defi, key = w)"));
    assert!(log.contains("offsets = 3\n"));
    assert!(log.contains("marked = caf!!!--+!!!"));
    // 0xE9 was already sampled, only 0xE0 is new
    assert!(log.contains("charSample(defi, key = v)"));
    assert!(log.contains("offsets = 3\nmarked = d\u{fffd}j!!!--+!!!"));
}
