use std::path::{Path, PathBuf};

use crate::cache::fetch::is_http_url;
use crate::cache::filename::mime_for_path;
use crate::cache::store::ContentCache;
use crate::codec::base64::is_data_url;
use crate::foundation::error::{BindError, BindResult};

/// Marker stored in `meta._type` of every file reference.
pub const FILE_DATA_TYPE: &str = "gradio.FileData";

/// Type marker attached to file references so they can be found inside arbitrary JSON.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileMeta {
    /// Always [`FILE_DATA_TYPE`] for values produced by this crate.
    #[serde(rename = "_type")]
    pub kind: String,
}

impl Default for FileMeta {
    fn default() -> Self {
        Self {
            kind: FILE_DATA_TYPE.to_string(),
        }
    }
}

/// Wire-format reference to a file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileData {
    /// Server-side path, or a remote URL.
    pub path: String,
    /// URL the client should fetch the file from.
    #[serde(default)]
    pub url: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: Option<u64>,
    /// Name of the file as uploaded or produced.
    #[serde(default)]
    pub orig_name: Option<String>,
    /// Declared MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Whether the file is a growing stream rather than a finished file.
    #[serde(default)]
    pub is_stream: bool,
    /// Type marker.
    #[serde(default)]
    pub meta: FileMeta,
}

/// A list of file references.
pub type ListFiles = Vec<FileData>;

impl FileData {
    /// Reference to `path` with every optional field unset.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: None,
            size: None,
            orig_name: None,
            mime_type: None,
            is_stream: false,
            meta: FileMeta::default(),
        }
    }

    /// Reference to a local file with name, size and MIME type filled in.
    pub fn from_path(path: &Path) -> Self {
        let mut fd = Self::new(path.to_string_lossy());
        fd.orig_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        fd.size = std::fs::metadata(path).ok().map(|m| m.len());
        fd.mime_type = mime_for_path(path);
        fd
    }

    /// Reference to a remote URL; nothing is downloaded.
    pub fn from_url(url: &str) -> Self {
        let mut fd = Self::new(url);
        fd.url = Some(url.to_string());
        fd.orig_name = crate::cache::fetch::url_file_name(url);
        fd.mime_type = fd.orig_name.as_deref().and_then(mime_for_path);
        fd
    }

    /// Reference to inline `data:` content carried in `url`.
    pub fn inline(data_url: String, orig_name: &str) -> Self {
        let mut fd = Self::new("");
        fd.mime_type = mime_for_path(orig_name);
        fd.orig_name = Some(orig_name.to_string());
        fd.url = Some(data_url);
        fd
    }

    /// Set `orig_name`.
    pub fn with_orig_name(mut self, name: impl Into<String>) -> Self {
        self.orig_name = Some(name.into());
        self
    }

    /// Set `mime_type`.
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Return `true` when the reference carries no information at all.
    pub fn is_none(&self) -> bool {
        self.path.is_empty()
            && self.url.is_none()
            && self.size.is_none()
            && self.orig_name.is_none()
            && self.mime_type.is_none()
    }

    /// Return `true` when `path` is a remote http(s) URL.
    pub fn is_remote(&self) -> bool {
        is_http_url(&self.path)
    }

    /// `orig_name`, falling back to the last component of `path`.
    pub fn display_name(&self) -> Option<String> {
        self.orig_name.clone().or_else(|| {
            Path::new(&self.path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
    }

    /// Resolve this reference to a readable local file, writing into `cache` when the content
    /// is inline (`data:`) or remote (http).
    pub fn materialize(&self, cache: &ContentCache) -> BindResult<PathBuf> {
        let inline = [self.url.as_deref(), Some(self.path.as_str())]
            .into_iter()
            .flatten()
            .find(|s| is_data_url(s));
        if let Some(data) = inline {
            return cache.save_base64(data, self.orig_name.as_deref());
        }
        if self.is_remote() {
            return cache.save_url(&self.path);
        }
        if self.path.is_empty() {
            match self.url.as_deref() {
                Some(url) if is_http_url(url) => return cache.save_url(url),
                _ => {
                    return Err(BindError::validation(
                        "file reference has neither a path nor a fetchable url",
                    ));
                }
            }
        }
        Ok(PathBuf::from(&self.path))
    }
}

/// Return `true` when `value` looks like a file reference (an object with a string `path`).
pub fn is_file_obj(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .and_then(|o| o.get("path"))
        .is_some_and(|p| p.is_string())
}

/// Return `true` when `value` is a file reference carrying the [`FILE_DATA_TYPE`] marker.
pub fn is_file_obj_with_meta(value: &serde_json::Value) -> bool {
    is_file_obj(value)
        && value
            .pointer("/meta/_type")
            .and_then(|t| t.as_str())
            .is_some_and(|t| t == FILE_DATA_TYPE)
}

/// Return `true` when `value` is a marked file reference whose `url` is set.
pub fn is_file_obj_with_url(value: &serde_json::Value) -> bool {
    is_file_obj_with_meta(value) && value.get("url").is_some_and(|u| u.is_string())
}

#[cfg(test)]
#[path = "../../tests/unit/payload/file_data.rs"]
mod tests;
