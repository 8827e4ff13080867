use base64::{Engine as _, engine::general_purpose};

use crate::cache::filename::extension_for_mime;
use crate::foundation::error::{BindError, BindResult};

/// Parsed `data:` URL borrowing its payload text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUrl<'a> {
    /// Declared MIME type, if any.
    pub mime: Option<String>,
    /// Whether the payload is base64 (`;base64`) rather than percent-encoded text.
    pub is_base64: bool,
    /// Text after the first comma.
    pub data: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Parse `data:[<mime>][;params][;base64],<data>`.
    pub fn parse(s: &'a str) -> Option<Self> {
        let rest = s.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mut parts = header.split(';');
        let mime = parts
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_lowercase);
        let is_base64 = parts.any(|p| p.trim().eq_ignore_ascii_case("base64"));
        Some(Self {
            mime,
            is_base64,
            data,
        })
    }

    /// Decode the payload into bytes.
    pub fn decode(&self) -> BindResult<Vec<u8>> {
        if self.is_base64 {
            decode_base64_text(self.data)
        } else {
            Ok(percent_decode(self.data))
        }
    }

    /// File extension implied by the declared MIME type.
    pub fn extension(&self) -> Option<String> {
        self.mime.as_deref().and_then(extension_for_mime)
    }
}

/// Return `true` for `data:` URLs.
pub fn is_data_url(s: &str) -> bool {
    s.starts_with("data:")
}

/// Decode either a `data:` URL or bare base64 text.
pub fn decode_base64(encoded: &str) -> BindResult<Vec<u8>> {
    match DataUrl::parse(encoded) {
        Some(url) => url.decode(),
        None => decode_base64_text(encoded),
    }
}

/// File extension guessed from a `data:` URL's MIME prefix.
pub fn extension_from_data_url(encoded: &str) -> Option<String> {
    DataUrl::parse(encoded).and_then(|u| u.extension())
}

/// Encode bytes as a base64 `data:` URL.
pub fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

fn decode_base64_text(text: &str) -> BindResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(compact.trim_end_matches('=')))
        .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(compact.trim_end_matches('=')))
        .map_err(|e| BindError::validation(format!("invalid base64 data: {e}")))
}

fn percent_decode(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = text.get(i + 1..i + 3)
            && let Ok(v) = u8::from_str_radix(hex, 16)
        {
            out.push(v);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/codec/base64.rs"]
mod tests;
