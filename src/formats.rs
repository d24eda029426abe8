//! Accepted input formats
//!
//! The list below is what the tool advertises to callers (upload dialogs,
//! directory scans). Acceptance is advisory: the decoder has the final say,
//! so an unlisted extension is logged and still handed to it.

use std::path::Path;

/// Container/codec extensions advertised as accepted
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "m4a", "aac", "flac", "ogg", "opus", "webm", "mp4", "mov", "aiff", "aif", "caf",
    "wma",
];

/// Suffix used for the scratch copy when the name carries no extension
const FALLBACK_SUFFIX: &str = ".dat";

/// Lowercased extension of a declared file name, if any
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// True when the path's extension is one we advertise
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(is_supported_extension)
        .unwrap_or(false)
}

/// Suffix (with leading dot) for the scratch copy of an upload.
///
/// Only used as a hint for the decoder; never trusted as the real format.
pub fn temp_suffix(file_name: &str) -> String {
    match extension_of(file_name) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!(".{}", ext),
        _ => FALLBACK_SUFFIX.to_string(),
    }
}

/// Log when a caller hands us something we don't advertise
pub fn check_advertised(file_name: &str) {
    match extension_of(file_name) {
        Some(ext) if is_supported_extension(&ext) => {}
        Some(ext) => tracing::warn!(
            "'{}' has unadvertised extension .{}; passing it to the decoder anyway",
            file_name,
            ext
        ),
        None => tracing::warn!("'{}' has no extension; the decoder will probe it", file_name),
    }
}
