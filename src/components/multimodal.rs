use std::path::Path;

use serde::Deserialize as _;
use serde_json::{Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::filename::mime_for_path;
use crate::cache::store::ContentCache;
use crate::components::base::{Clearable, Component, Configurable};
use crate::components::file::{FileCount, is_valid_file};
use crate::components::image::example_image_data;
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult, quoted_list};
use crate::payload::file_data::FileData;

choice_enum! {
    /// Input a [`MultimodalTextbox`] offers besides typing.
    pub enum MultimodalSource ("sources", default = Upload) {
        /// File picker and drop zone.
        Upload => "upload",
        /// Voice recording, attached as an audio file.
        Microphone => "microphone",
    }
}

/// Wire payload of [`MultimodalTextbox`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MultimodalData {
    /// Typed text.
    pub text: String,
    /// Attached files.
    #[serde(default)]
    pub files: Vec<FileData>,
}

/// Values accepted and produced by [`MultimodalTextbox`].
#[derive(Clone, Debug, PartialEq)]
pub enum MultimodalValue {
    /// Text without attachments.
    Text(String),
    /// Text with attachments given as local paths or URLs.
    Message {
        /// Typed text.
        text: String,
        /// Attachment paths.
        files: Vec<String>,
    },
    /// Text with ready-made file references, returned as they are.
    Data(MultimodalData),
}

impl MultimodalValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Text(text) => json!({"text": text, "files": []}),
            Self::Message { text, files } => json!({"text": text, "files": files}),
            Self::Data(d) => json!({
                "text": d.text,
                "files": d.files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            }),
        }
    }
}

fn default_sources() -> Vec<MultimodalSource> {
    vec![MultimodalSource::Upload]
}

/// A single source name or a list of them.
fn one_or_many_sources<'de, D>(d: D) -> Result<Vec<MultimodalSource>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let parse = |v: &Value| -> Result<MultimodalSource, String> {
        let name = v
            .as_str()
            .ok_or_else(|| format!("`sources` entries must be strings, got {v}"))?;
        MultimodalSource::try_from(name.to_string())
    };
    match Value::deserialize(d)? {
        Value::Null => Ok(default_sources()),
        Value::Array(items) => items
            .iter()
            .map(parse)
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom),
        one => parse(&one).map(|s| vec![s]).map_err(serde::de::Error::custom),
    }
}

/// [`MultimodalTextbox`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MultimodalOptions {
    /// Ways to attach content.
    #[serde(deserialize_with = "one_or_many_sources")]
    pub sources: Vec<MultimodalSource>,
    /// Accepted extensions (`.pdf`) or MIME categories (`image`).
    pub file_types: Option<Vec<String>>,
    /// How many files one message may carry.
    pub file_count: FileCount,
    /// Visible lines.
    pub lines: u32,
    /// Lines before the box scrolls; raised to `lines` when smaller.
    pub max_lines: u32,
    /// Hint shown while empty.
    pub placeholder: Option<String>,
}

impl Default for MultimodalOptions {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            file_types: None,
            file_count: FileCount::Single,
            lines: 1,
            max_lines: 20,
            placeholder: None,
        }
    }
}

/// Text box that also carries file attachments.
#[derive(Clone, Debug, Default)]
pub struct MultimodalTextbox {
    options: MultimodalOptions,
}

impl Configurable for MultimodalTextbox {
    type Options = MultimodalOptions;

    fn from_options(mut options: MultimodalOptions) -> BindResult<Self> {
        if let Some(types) = &options.file_types
            && types.iter().any(|t| t.trim().is_empty())
        {
            return Err(BindError::config("`file_types` entries must not be empty"));
        }
        options.max_lines = options.max_lines.max(options.lines);
        Ok(Self { options })
    }
}

impl MultimodalTextbox {
    fn check_type(&self, fd: &FileData) -> BindResult<()> {
        let Some(types) = &self.options.file_types else {
            return Ok(());
        };
        let name = fd.display_name().unwrap_or_else(|| fd.path.clone());
        if is_valid_file(&name, types) {
            return Ok(());
        }
        let mime = fd
            .mime_type
            .clone()
            .or_else(|| mime_for_path(&name))
            .unwrap_or_else(|| "unknown".to_string());
        Err(BindError::validation(format!(
            "Invalid file type: {mime}. Please upload a file that is one of these formats: {}",
            quoted_list(types)
        )))
    }

    fn reference(&self, cache: &ContentCache, path: &str) -> BindResult<FileData> {
        if is_http_url(path) {
            return Ok(FileData::from_url(path));
        }
        let cached = cache.save_file(Path::new(path))?;
        let fd = FileData::from_path(&cached);
        Ok(match Path::new(path).file_name() {
            Some(name) => fd.with_orig_name(name.to_string_lossy()),
            None => fd,
        })
    }
}

impl Component for MultimodalTextbox {
    type Payload = MultimodalData;
    type Value = MultimodalValue;
    type Config = MultimodalOptions;

    fn tag(&self) -> &'static str {
        "multimodaltextbox"
    }

    fn config(&self) -> &MultimodalOptions {
        &self.options
    }

    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<MultimodalData>,
    ) -> BindResult<Option<MultimodalValue>> {
        let Some(data) = payload else {
            return Ok(None);
        };
        for fd in &data.files {
            self.check_type(fd)?;
        }
        let files = data
            .files
            .iter()
            .map(|fd| -> BindResult<String> {
                Ok(fd.materialize(cache)?.to_string_lossy().into_owned())
            })
            .collect::<BindResult<_>>()?;
        Ok(Some(MultimodalValue::Message {
            text: data.text,
            files,
        }))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<MultimodalValue>,
    ) -> BindResult<Option<MultimodalData>> {
        let Some(value) = value else {
            return Ok(None);
        };
        Ok(Some(match value {
            MultimodalValue::Text(text) => MultimodalData {
                text,
                files: vec![],
            },
            MultimodalValue::Message { text, files } => MultimodalData {
                text,
                files: files
                    .iter()
                    .map(|p| self.reference(cache, p))
                    .collect::<BindResult<_>>()?,
            },
            MultimodalValue::Data(data) => data,
        }))
    }

    fn example_payload(&self) -> MultimodalData {
        MultimodalData {
            text: "Describe this image".to_string(),
            files: vec![example_image_data()],
        }
    }

    fn example_value(&self) -> MultimodalValue {
        MultimodalValue::Message {
            text: "Describe this image".to_string(),
            files: vec![
                "https://raw.githubusercontent.com/gradio-app/gradio/main/test/test_files/bus.png"
                    .to_string(),
            ],
        }
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"},
                "files": {"type": "array", "items": {"$ref": "FileData"}}
            },
            "required": ["text"]
        })
    }
}

impl Clearable for MultimodalTextbox {}

#[cfg(test)]
#[path = "../../tests/unit/components/multimodal.rs"]
mod tests;
