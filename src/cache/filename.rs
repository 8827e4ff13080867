use std::path::Path;

/// Longest file name (in bytes) the cache will create.
pub const MAX_FILE_NAME_BYTES: usize = 200;

/// Name used when nothing usable survives sanitizing.
pub const FALLBACK_FILE_NAME: &str = "file";

/// Make `name` safe as the last component of a cache path.
///
/// The stem keeps alphanumerics and `._- `; the extension is preserved; the stem is shortened
/// until the whole name fits in [`MAX_FILE_NAME_BYTES`]. Returns an empty string when nothing is
/// left, callers substitute [`FALLBACK_FILE_NAME`].
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = split_extension(base);

    let mut stem: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect();
    let ext: String = ext
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    while stem.len() + ext.len() > MAX_FILE_NAME_BYTES && !stem.is_empty() {
        stem.pop();
    }
    let out = format!("{stem}{ext}");
    if out.trim_matches('.').is_empty() {
        return String::new();
    }
    out
}

/// Sanitized name, or `fallback` when sanitizing leaves nothing.
pub fn sanitize_or(name: Option<&str>, fallback: &str) -> String {
    match name.map(sanitize_file_name) {
        Some(s) if !s.is_empty() => s,
        _ => fallback.to_string(),
    }
}

/// Split `name` into stem and `.ext`, treating leading dots as part of the stem.
pub(crate) fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(i) => name.split_at(leading + i),
        None => (name, ""),
    }
}

/// Lower-cased extension of `name` without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = split_extension(name.rsplit(['/', '\\']).next().unwrap_or(name));
    let ext = ext.trim_start_matches('.');
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Guess a MIME type from a file name or path.
pub fn mime_for_path(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    match extension_of(&path.to_string_lossy()).as_deref() {
        Some("vtt") => return Some("text/vtt".to_string()),
        Some("webp") => return Some("image/webp".to_string()),
        _ => {}
    }
    mime_guess::from_path(path).first().map(|m| m.to_string())
}

/// Preferred file extension for a MIME type.
pub fn extension_for_mime(mime: &str) -> Option<String> {
    let mime = mime.trim().to_ascii_lowercase();
    let preferred = match mime.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        "image/svg+xml" => Some("svg"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/ogg" => Some("ogg"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/ogg" => Some("ogv"),
        "text/plain" => Some("txt"),
        "text/csv" => Some("csv"),
        "application/json" => Some("json"),
        "application/pdf" => Some("pdf"),
        _ => None,
    };
    if let Some(ext) = preferred {
        return Some(ext.to_string());
    }
    mime_guess::get_mime_extensions_str(&mime)
        .and_then(|exts| exts.first())
        .map(|e| e.to_string())
}

/// Return `true` when the MIME type belongs to `category` (`image`, `audio`, `video`, ...).
pub fn is_mime_category(mime: Option<&str>, category: &str) -> bool {
    mime.and_then(|m| m.split('/').next())
        .is_some_and(|top| top.eq_ignore_ascii_case(category))
}

#[cfg(test)]
#[path = "../../tests/unit/cache/filename.rs"]
mod tests;
