//! Options recognised when opening a BGL file.

use std::path::PathBuf;

/// Default color of the part-of-speech label, `RRGGBB`.
pub const DEFAULT_PART_OF_SPEECH_COLOR: &str = "007000";

/// Read options consumed at session-open time.
///
/// Every field has a neutral default; `BglOptions::default()` decodes a
/// dictionary the way Babylon itself displays it.
#[derive(Debug, Clone)]
pub struct BglOptions {
    /// Overrides for the default/source/target encodings (e.g. `"cp1251"`, `"utf-8"`).
    pub default_encoding: Option<String>,
    pub source_encoding: Option<String>,
    pub target_encoding: Option<String>,

    /// Directory for extracted resource files. Derived from the file name when unset.
    pub res_path: Option<PathBuf>,

    /// Try a strict decode first and log failures before falling back to lossy decoding.
    pub strict_string_conversion: bool,
    /// Strip HTML tags and resolve character references in keys and alternates.
    pub process_html_in_key: bool,
    /// Treat the whole definition payload as text; never look for trailing fields.
    pub no_control_sequence_in_defi: bool,
    /// Characters stripped from the right of keys and alternates. Whitespace when unset.
    pub key_rstrip_chars: Option<String>,

    /// Diagnostic sinks. Not needed for correct decoding.
    pub raw_dump_path: Option<PathBuf>,
    pub decoded_dump_path: Option<PathBuf>,
    pub msg_log_path: Option<PathBuf>,
    pub search_char_samples: bool,
    pub char_samples_path: Option<PathBuf>,

    /// Collect per-definition statistics while reading entries.
    pub collect_metadata2: bool,

    pub part_of_speech_color: String,
}

impl Default for BglOptions {
    fn default() -> Self {
        Self {
            default_encoding: None,
            source_encoding: None,
            target_encoding: None,
            res_path: None,
            strict_string_conversion: false,
            process_html_in_key: false,
            no_control_sequence_in_defi: false,
            key_rstrip_chars: None,
            raw_dump_path: None,
            decoded_dump_path: None,
            msg_log_path: None,
            search_char_samples: false,
            char_samples_path: None,
            collect_metadata2: false,
            part_of_speech_color: DEFAULT_PART_OF_SPEECH_COLOR.to_string(),
        }
    }
}
