use std::path::{Path, PathBuf};

#[cfg(feature = "media-ffmpeg")]
use crate::cache::filename::extension_of;
use crate::cache::store::ContentCache;
use crate::foundation::error::{BindError, BindResult};

/// `(container extension, video codec)` pairs browsers play natively.
pub const PLAYABLE: &[(&str, &str)] = &[("mp4", "h264"), ("ogg", "theora"), ("webm", "vp9")];

/// What ffprobe reports about a video file.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoProbe {
    /// Lowercased file extension.
    pub container: String,
    /// Codec of the first video stream.
    pub video_codec: Option<String>,
    /// Duration from the container, or from the first stream that reports one.
    pub duration_secs: Option<f64>,
    /// Whether an audio stream exists.
    pub has_audio: bool,
}

impl VideoProbe {
    /// Whether the container/codec pair is in [`PLAYABLE`].
    pub fn is_playable(&self) -> bool {
        self.video_codec
            .as_deref()
            .is_some_and(|codec| is_playable_pair(&self.container, codec))
    }
}

/// Whether `container` with `codec` plays in a browser without conversion.
pub fn is_playable_pair(container: &str, codec: &str) -> bool {
    let container = container.trim_start_matches('.').to_ascii_lowercase();
    PLAYABLE
        .iter()
        .any(|(c, v)| *c == container && v.eq_ignore_ascii_case(codec))
}

/// Whether a usable `ffmpeg` binary is on the path.
#[cfg(feature = "media-ffmpeg")]
pub fn ffmpeg_available() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Whether a usable `ffmpeg` binary is on the path.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn ffmpeg_available() -> bool {
    false
}

/// Run ffprobe on `path`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(path: &Path) -> BindResult<VideoProbe> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        codec_name: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| BindError::unsupported(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BindError::unsupported(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| BindError::serde(format!("ffprobe json parse failed: {e}")))?;

    let video_codec = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| s.codec_name.clone());
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or_else(|| parsed.streams.iter().find_map(|s| s.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok());
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoProbe {
        container: extension_of(&path.to_string_lossy()).unwrap_or_default(),
        video_codec,
        duration_secs,
        has_audio,
    })
}

/// Run ffprobe on `path`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(path: &Path) -> BindResult<VideoProbe> {
    Err(BindError::unsupported(format!(
        "probing '{}' requires the 'media-ffmpeg' feature",
        path.display()
    )))
}

/// Whether the video at `path` plays in a browser.
///
/// Probe failures count as playable so that no conversion is attempted on files ffprobe cannot read.
pub fn video_is_playable(path: &Path) -> bool {
    match probe_video(path) {
        Ok(p) => p.video_codec.is_none() || p.is_playable(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "probe failed, assuming playable");
            true
        }
    }
}

/// Duration of the video in seconds.
pub fn get_video_length(path: &Path) -> BindResult<f64> {
    probe_video(path)?.duration_secs.ok_or_else(|| {
        BindError::unsupported(format!("no duration reported for '{}'", path.display()))
    })
}

/// Run ffmpeg on `input` with `options`, storing the result in the cache as `out_name`.
#[cfg(feature = "media-ffmpeg")]
pub fn transcode_into_cache(
    cache: &ContentCache,
    input: &Path,
    out_name: &str,
    options: &[&str],
) -> BindResult<PathBuf> {
    let dir = tempfile::tempdir().map_err(|e| BindError::io(format!("create temp dir: {e}")))?;
    let output = dir.path().join(out_name);
    tracing::debug!(input = %input.display(), out_name, ?options, "running ffmpeg");

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-i"])
        .arg(input)
        .args(options)
        .arg(&output)
        .output()
        .map_err(|e| BindError::unsupported(format!("failed to run ffmpeg: {e}")))?;
    if !out.status.success() {
        return Err(BindError::unsupported(format!(
            "ffmpeg failed for '{}': {}",
            input.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    cache.save_file(&output)
}

/// Run ffmpeg on `input` with `options`, storing the result in the cache as `out_name`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn transcode_into_cache(
    _cache: &ContentCache,
    input: &Path,
    out_name: &str,
    _options: &[&str],
) -> BindResult<PathBuf> {
    Err(BindError::unsupported(format!(
        "converting '{}' to '{out_name}' requires the 'media-ffmpeg' feature",
        input.display()
    )))
}

/// Re-encode `path` as mp4, returning the original path when conversion fails.
pub fn convert_to_playable_mp4(cache: &ContentCache, path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().into_owned());
    match transcode_into_cache(cache, path, &format!("{stem}.mp4"), &[]) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "error converting video to browser-playable format");
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/video.rs"]
mod tests;
