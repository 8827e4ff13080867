use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::filename::extension_of;
use crate::cache::store::ContentCache;
use crate::codec::video::{
    convert_to_playable_mp4, ffmpeg_available, transcode_into_cache, video_is_playable,
};
use crate::components::base::{Clearable, Component, Configurable};
use crate::foundation::error::{BindError, BindResult};
use crate::payload::file_data::FileData;

/// Remote clip used by the examples.
const EXAMPLE_URL: &str =
    "https://github.com/gradio-app/gradio/raw/main/gradio/media_assets/videos/world.mp4";

fn default_true() -> bool {
    true
}

/// [`Video`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoOptions {
    /// Container uploads are converted to and returned videos are written in; `null` keeps the
    /// source container.
    pub format: Option<String>,
    /// Keep the audio track of uploads.
    #[serde(default = "default_true")]
    pub include_audio: bool,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            format: None,
            include_audio: true,
        }
    }
}

/// Video upload and playback. Values are paths or URLs.
#[derive(Clone, Debug, Default)]
pub struct Video {
    options: VideoOptions,
}

impl Configurable for Video {
    type Options = VideoOptions;

    fn from_options(mut options: VideoOptions) -> BindResult<Self> {
        if let Some(format) = options.format.as_mut() {
            *format = format.trim_start_matches('.').to_ascii_lowercase();
            if format.is_empty() {
                return Err(BindError::config("`format` must name a video container"));
            }
        }
        Ok(Self { options })
    }
}

impl Video {
    /// Whether a file with this name has to be converted to the configured container.
    fn needs_conversion(&self, name: &str) -> bool {
        self.options
            .format
            .as_deref()
            .is_some_and(|want| extension_of(name).as_deref() != Some(want))
    }

    fn converted_name(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().into_owned());
        let ext = self
            .options
            .format
            .clone()
            .or_else(|| extension_of(&path.to_string_lossy()))
            .unwrap_or_else(|| "mp4".to_string());
        format!("{stem}.{ext}")
    }

    /// Convert or strip audio from an upload when the options ask for it.
    fn format_upload(&self, cache: &ContentCache, path: PathBuf) -> BindResult<PathBuf> {
        let mute: &[&str] = if self.options.include_audio {
            &[]
        } else {
            &["-an"]
        };
        if self.needs_conversion(&path.to_string_lossy()) {
            return transcode_into_cache(cache, &path, &self.converted_name(&path), mute);
        }
        if !self.options.include_audio {
            let name = path
                .file_name()
                .map_or_else(|| "video".to_string(), |n| n.to_string_lossy().into_owned());
            return transcode_into_cache(cache, &path, &format!("muted_{name}"), mute);
        }
        Ok(path)
    }

    /// Make a returned video playable in the configured container and store it in the cache.
    fn format_returned(&self, cache: &ContentCache, video: &str) -> BindResult<FileData> {
        let remote = is_http_url(video);
        if remote && !self.needs_conversion(video) {
            return Ok(FileData::from_url(video));
        }
        let mut path = if remote {
            cache.save_url(video)?
        } else {
            PathBuf::from(video)
        };
        if ffmpeg_available() && !video_is_playable(&path) {
            tracing::warn!(
                path = %path.display(),
                "video does not have a browser-compatible container or codec, converting to mp4"
            );
            path = convert_to_playable_mp4(cache, &path);
        }
        let stored = if self.needs_conversion(&path.to_string_lossy()) {
            transcode_into_cache(cache, &path, &self.converted_name(&path), &[])?
        } else {
            cache.save_file(&path)?
        };
        Ok(FileData::from_path(&stored))
    }
}

impl Component for Video {
    type Payload = FileData;
    type Value = String;
    type Config = VideoOptions;

    fn tag(&self) -> &'static str {
        "video"
    }

    fn config(&self) -> &VideoOptions {
        &self.options
    }

    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<FileData>,
    ) -> BindResult<Option<String>> {
        let Some(fd) = payload else {
            return Ok(None);
        };
        if fd.path.is_empty() && fd.url.is_none() {
            return Err(BindError::validation("Payload path missing"));
        }
        let path = self.format_upload(cache, fd.materialize(cache)?)?;
        Ok(Some(path.to_string_lossy().into_owned()))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<String>,
    ) -> BindResult<Option<FileData>> {
        match value {
            Some(v) => self.format_returned(cache, &v).map(Some),
            None => Ok(self.empty_payload()),
        }
    }

    fn example_payload(&self) -> FileData {
        FileData::from_url(EXAMPLE_URL)
    }

    fn example_value(&self) -> String {
        EXAMPLE_URL.to_string()
    }

    fn api_info(&self) -> Value {
        json!({"$ref": "FileData"})
    }
}

impl Clearable for Video {}

#[cfg(test)]
#[path = "../../tests/unit/components/video.rs"]
mod tests;
