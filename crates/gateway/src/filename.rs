//! Reduce a client-supplied file name to something safe to join onto a directory.

use unicode_normalization::UnicodeNormalization;

const WINDOWS_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitise an uploaded file name.
///
/// Accented letters are decomposed (NFKD) and lose their marks; any other
/// non-ASCII character is dropped. Path separators become word breaks,
/// whitespace runs become `_`, and only `[A-Za-z0-9_.-]` survives. Leading and
/// trailing dots and underscores are stripped, so the result never names a
/// parent or hidden file. May return an empty string, which callers must reject.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_ascii_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    let stem = trimmed.split('.').next().unwrap_or_default();
    if !trimmed.is_empty() && WINDOWS_DEVICE_NAMES.contains(&stem.to_ascii_uppercase().as_str()) {
        return format!("_{trimmed}");
    }

    trimmed.to_string()
}
