use std::collections::BTreeMap;
use std::path::Path;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::file_utils::FileManager;
use crate::tei::Header;

// @module: Document-level metadata extraction

// @const: Separator followed by the character to upper-case
static KEY_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-_](.)").unwrap()
});

/// Metadata of one interview
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    /// Display name
    pub name: String,
    /// Audio reference, with the configured extension applied
    pub audio: String,
    /// Header notes plus `name` and `audio`
    pub fields: BTreeMap<String, String>,
}

/// Lower-camel-case key: `recording-date` becomes `recordingDate`
pub fn camel_case_key(raw: &str) -> String {
    KEY_SEPARATOR_REGEX
        .replace_all(raw.trim(), |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

/// Collect header metadata for a document
///
/// `source_dir` is the directory holding the document; when given, a missing audio
/// file is reported (the reference is kept either way).
pub fn extract(
    header: &Header,
    filename: &str,
    source_dir: Option<&Path>,
    audio_format: Option<&str>,
) -> DocumentMetadata {
    let mut fields = BTreeMap::new();
    for (raw_key, raw_value) in &header.notes {
        let key = camel_case_key(raw_key);
        let value = raw_value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        fields.insert(key, value.to_string());
    }

    let name = header
        .title
        .clone()
        .unwrap_or_else(|| filename.to_string());

    let mut audio = header.media_url.clone();
    if let Some(dir) = source_dir {
        if !FileManager::file_exists(dir.join(&audio)) {
            warn!("Could not find audio file {} in {}", audio, dir.display());
        }
    }
    if let Some(format) = audio_format {
        audio = FileManager::with_extension(&audio, format);
    }

    fields.insert("name".to_string(), name.clone());
    fields.insert("audio".to_string(), audio.clone());

    DocumentMetadata {
        name,
        audio,
        fields,
    }
}
