use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::filename::{extension_of, mime_for_path};
use crate::cache::store::ContentCache;
use crate::codec::base64::encode_data_url;
use crate::components::base::{Clearable, Component, Configurable};
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult, quoted_list};
use crate::payload::file_data::FileData;

choice_enum! {
    /// How many files a [`File`] component takes.
    pub enum FileCount ("file_count", default = Single) {
        /// Exactly one file.
        Single => "single",
        /// Any number of files.
        Multiple => "multiple",
        /// Every file of an uploaded directory.
        Directory => "directory",
    }
}

choice_enum! {
    /// What a [`File`] component hands to the user function.
    pub enum FileType ("type", default = Filepath) {
        /// Path of the cached copy.
        Filepath => "filepath",
        /// File content.
        Binary => "binary",
    }
}

/// One file or a list of files on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FilePayload {
    /// A single reference.
    Single(FileData),
    /// Several references.
    Multiple(Vec<FileData>),
}

/// Values accepted and produced by [`File`].
#[derive(Clone, Debug, PartialEq)]
pub enum FileValue {
    /// A local path or URL.
    Path(String),
    /// Several local paths or URLs.
    Paths(Vec<String>),
    /// File content.
    Bytes(Vec<u8>),
    /// Content of several files.
    BytesList(Vec<Vec<u8>>),
}

impl FileValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Path(p) => json!(p),
            Self::Paths(p) => json!(p),
            Self::Bytes(b) => json!({"bytes": b.len()}),
            Self::BytesList(list) => {
                Value::Array(list.iter().map(|b| json!({"bytes": b.len()})).collect())
            }
        }
    }
}

/// [`File`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// How many files are accepted.
    pub file_count: FileCount,
    /// Representation handed to the function.
    #[serde(rename = "type")]
    pub kind: FileType,
    /// Accepted extensions (`.pdf`) or MIME categories (`image`); `file` accepts anything.
    pub file_types: Option<Vec<String>>,
}

/// Generic file upload and download.
#[derive(Clone, Debug, Default)]
pub struct File {
    options: FileOptions,
}

impl Configurable for File {
    type Options = FileOptions;

    fn from_options(options: FileOptions) -> BindResult<Self> {
        if let Some(types) = &options.file_types
            && types.iter().any(|t| t.trim().is_empty())
        {
            return Err(BindError::config("`file_types` entries must not be empty"));
        }
        Ok(Self { options })
    }
}

/// Return `true` when `path` matches one of `file_types`.
///
/// Entries starting with `.` match the extension; other entries match the MIME category.
pub fn is_valid_file(path: &str, file_types: &[String]) -> bool {
    let ext = extension_of(path);
    let mime = mime_for_path(path);
    file_types.iter().any(|ft| {
        if ft == "file" {
            return true;
        }
        match ft.strip_prefix('.') {
            Some(want) => ext.as_deref() == Some(want.to_ascii_lowercase().as_str()),
            None => mime
                .as_deref()
                .is_some_and(|m| m.starts_with(&format!("{ft}/"))),
        }
    })
}

impl File {
    /// Check the declared type and resolve the upload to a local file.
    fn checked_path(&self, cache: &ContentCache, fd: &FileData) -> BindResult<PathBuf> {
        let name = fd.display_name().unwrap_or_else(|| fd.path.clone());
        if let Some(types) = &self.options.file_types
            && !is_valid_file(&name, types)
        {
            return Err(BindError::validation(format!(
                "Invalid file type. Please upload a file that is one of these formats: {}",
                quoted_list(types)
            )));
        }
        fd.materialize(cache)
    }

    fn read(&self, cache: &ContentCache, fd: &FileData) -> BindResult<Vec<u8>> {
        let path = self.checked_path(cache, fd)?;
        std::fs::read(&path)
            .map_err(|e| BindError::io(format!("read uploaded file '{}': {e}", path.display())))
    }

    fn path_string(&self, cache: &ContentCache, fd: &FileData) -> BindResult<String> {
        Ok(self.checked_path(cache, fd)?.to_string_lossy().into_owned())
    }

    fn reference(&self, cache: &ContentCache, path: &str) -> BindResult<FileData> {
        if is_http_url(path) {
            return Ok(FileData::from_url(path));
        }
        let cached = cache.save_file(Path::new(path))?;
        Ok(FileData::from_path(&cached).with_orig_name(
            Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string()),
        ))
    }

    fn store_bytes(&self, cache: &ContentCache, bytes: &[u8]) -> BindResult<FileData> {
        let cached = cache.save_bytes(bytes, "file")?;
        Ok(FileData::from_path(&cached))
    }
}

impl Component for File {
    type Payload = FilePayload;
    type Value = FileValue;
    type Config = FileOptions;

    fn tag(&self) -> &'static str {
        "file"
    }

    fn config(&self) -> &FileOptions {
        &self.options
    }

    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<FilePayload>,
    ) -> BindResult<Option<FileValue>> {
        let Some(payload) = payload else {
            return Ok(None);
        };
        let files = match (payload, self.options.file_count) {
            (FilePayload::Single(fd), FileCount::Single) => {
                return Ok(Some(match self.options.kind {
                    FileType::Filepath => FileValue::Path(self.path_string(cache, &fd)?),
                    FileType::Binary => FileValue::Bytes(self.read(cache, &fd)?),
                }));
            }
            (FilePayload::Multiple(_), FileCount::Single) => {
                return Err(BindError::validation(
                    "File component with file_count='single' received several files",
                ));
            }
            (FilePayload::Single(fd), _) => vec![fd],
            (FilePayload::Multiple(list), _) => list,
        };
        Ok(Some(match self.options.kind {
            FileType::Filepath => FileValue::Paths(
                files
                    .iter()
                    .map(|fd| self.path_string(cache, fd))
                    .collect::<BindResult<_>>()?,
            ),
            FileType::Binary => FileValue::BytesList(
                files
                    .iter()
                    .map(|fd| self.read(cache, fd))
                    .collect::<BindResult<_>>()?,
            ),
        }))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<FileValue>,
    ) -> BindResult<Option<FilePayload>> {
        let Some(value) = value else {
            return Ok(self.empty_payload());
        };
        Ok(Some(match value {
            FileValue::Path(p) => FilePayload::Single(self.reference(cache, &p)?),
            FileValue::Bytes(b) => FilePayload::Single(self.store_bytes(cache, &b)?),
            FileValue::Paths(paths) => FilePayload::Multiple(
                paths
                    .iter()
                    .map(|p| self.reference(cache, p))
                    .collect::<BindResult<_>>()?,
            ),
            FileValue::BytesList(list) => FilePayload::Multiple(
                list.iter()
                    .map(|b| self.store_bytes(cache, b))
                    .collect::<BindResult<_>>()?,
            ),
        }))
    }

    fn example_payload(&self) -> FilePayload {
        let one = FileData::inline(encode_data_url(b"Hello, world!\n", "text/plain"), "sample.txt");
        match self.options.file_count {
            FileCount::Single => FilePayload::Single(one),
            _ => FilePayload::Multiple(vec![one]),
        }
    }

    fn example_value(&self) -> FileValue {
        match self.options.file_count {
            FileCount::Single => FileValue::Bytes(b"Hello, world!\n".to_vec()),
            _ => FileValue::BytesList(vec![b"Hello, world!\n".to_vec()]),
        }
    }

    fn api_info(&self) -> Value {
        let one = json!({"$ref": "FileData"});
        match self.options.file_count {
            FileCount::Single => one,
            _ => json!({"type": "array", "items": one}),
        }
    }
}

impl Clearable for File {}

#[cfg(test)]
#[path = "../../tests/unit/components/file.rs"]
mod tests;
