use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::filename::extension_of;
use crate::cache::store::ContentCache;
use crate::codec::audio::{AudioData, SampleBuffer, load_audio, save_audio, write_wav};
use crate::codec::base64::encode_data_url;
use crate::components::base::{Clearable, Component, Configurable};
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult};
use crate::payload::file_data::FileData;

/// Sample rate of the example clip.
const EXAMPLE_RATE: u32 = 8000;

choice_enum! {
    /// Representation audio is handed to the user function in.
    pub enum AudioType ("type", default = Numpy) {
        /// Sample rate plus samples.
        Numpy => "numpy",
        /// Path of a file in the cache.
        Filepath => "filepath",
    }
}

/// Values accepted and produced by [`Audio`].
#[derive(Clone, Debug, PartialEq)]
pub enum AudioValue {
    /// Decoded samples.
    Samples(AudioData),
    /// Local path or URL.
    Path(String),
    /// Encoded file content.
    Bytes(Vec<u8>),
}

impl AudioValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Samples(a) => json!({
                "sample_rate": a.sample_rate,
                "channels": a.channels,
                "frames": a.frames(),
                "dtype": a.samples.dtype(),
            }),
            Self::Path(p) => json!(p),
            Self::Bytes(b) => json!({"bytes": b.len()}),
        }
    }
}

fn default_format() -> String {
    "wav".to_string()
}

/// [`Audio`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioOptions {
    /// Representation handed to the function.
    #[serde(rename = "type")]
    pub kind: AudioType,
    /// Container returned audio is written in, and uploads are converted to for `filepath`.
    #[serde(default = "default_format")]
    pub format: String,
    /// Shortest accepted upload, in seconds.
    pub min_length: Option<f64>,
    /// Longest accepted upload, in seconds.
    pub max_length: Option<f64>,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            kind: AudioType::Numpy,
            format: default_format(),
            min_length: None,
            max_length: None,
        }
    }
}

/// Audio upload, recording and playback.
#[derive(Clone, Debug)]
pub struct Audio {
    options: AudioOptions,
}

impl Configurable for Audio {
    type Options = AudioOptions;

    fn from_options(mut options: AudioOptions) -> BindResult<Self> {
        options.format = options.format.trim_start_matches('.').to_ascii_lowercase();
        if options.format.is_empty() {
            return Err(BindError::config("`format` must name an audio container"));
        }
        if let (Some(lo), Some(hi)) = (options.min_length, options.max_length)
            && lo > hi
        {
            return Err(BindError::config(format!(
                "`min_length` ({lo}) is greater than `max_length` ({hi})"
            )));
        }
        Ok(Self { options })
    }
}

impl Audio {
    fn has_format(&self, path: &str) -> bool {
        extension_of(path).as_deref() == Some(self.options.format.as_str())
    }

    fn check_length(&self, audio: &AudioData) -> BindResult<()> {
        let duration = audio.duration_secs();
        if let Some(min) = self.options.min_length
            && duration < min
        {
            return Err(BindError::validation(format!(
                "Audio is too short, and must be at least {min} seconds"
            )));
        }
        if let Some(max) = self.options.max_length
            && duration > max
        {
            return Err(BindError::validation(format!(
                "Audio is too long, and must be at most {max} seconds"
            )));
        }
        Ok(())
    }

    fn save(&self, cache: &ContentCache, audio: &AudioData) -> BindResult<PathBuf> {
        save_audio(cache, audio, &self.options.format)
    }

    fn reference(&self, cache: &ContentCache, path: &str) -> BindResult<FileData> {
        if is_http_url(path) {
            return Ok(FileData::from_url(path));
        }
        let cached = if self.has_format(path) {
            cache.save_file(Path::new(path))?
        } else {
            tracing::debug!(path, format = %self.options.format, "converting returned audio");
            self.save(cache, &load_audio(Path::new(path), None)?)?
        };
        Ok(FileData::from_path(&cached))
    }
}

impl Component for Audio {
    type Payload = FileData;
    type Value = AudioValue;
    type Config = AudioOptions;

    fn tag(&self) -> &'static str {
        "audio"
    }

    fn config(&self) -> &AudioOptions {
        &self.options
    }

    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.options.kind))]
    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<FileData>,
    ) -> BindResult<Option<AudioValue>> {
        let Some(fd) = payload.filter(|fd| !fd.is_none()) else {
            return Ok(None);
        };
        let path = fd.materialize(cache)?;
        let checks_length = self.options.min_length.is_some() || self.options.max_length.is_some();
        let decoded = if checks_length || self.options.kind == AudioType::Numpy {
            let audio = load_audio(&path, None)?;
            self.check_length(&audio)?;
            Some(audio)
        } else {
            None
        };

        Ok(Some(match (self.options.kind, decoded) {
            (AudioType::Numpy, Some(audio)) => AudioValue::Samples(audio),
            _ if self.has_format(&path.to_string_lossy()) => {
                AudioValue::Path(path.to_string_lossy().into_owned())
            }
            (_, decoded) => {
                let audio = match decoded {
                    Some(audio) => audio,
                    None => load_audio(&path, None)?,
                };
                AudioValue::Path(self.save(cache, &audio)?.to_string_lossy().into_owned())
            }
        }))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<AudioValue>,
    ) -> BindResult<Option<FileData>> {
        let Some(value) = value else {
            return Ok(self.empty_payload());
        };
        Ok(Some(match value {
            AudioValue::Bytes(b) => {
                let name = format!("audio.{}", self.options.format);
                FileData::from_path(&cache.save_bytes(&b, &name)?)
            }
            AudioValue::Samples(audio) => FileData::from_path(&self.save(cache, &audio)?),
            AudioValue::Path(p) => self.reference(cache, &p)?,
        }))
    }

    fn example_payload(&self) -> FileData {
        FileData::inline(
            write_wav(&example_clip())
                .map(|wav| encode_data_url(&wav, "audio/wav"))
                .unwrap_or_default(),
            "example.wav",
        )
    }

    fn example_value(&self) -> AudioValue {
        AudioValue::Samples(example_clip())
    }

    fn api_info(&self) -> Value {
        json!({"$ref": "FileData"})
    }
}

impl Clearable for Audio {}

/// A tenth of a second of mono silence.
fn example_clip() -> AudioData {
    AudioData {
        sample_rate: EXAMPLE_RATE,
        channels: 1,
        samples: SampleBuffer::I16(vec![0; EXAMPLE_RATE as usize / 10]),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/audio.rs"]
mod tests;
