use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cache::filename::extension_of;
use crate::cache::store::ContentCache;
use crate::foundation::error::{BindError, BindResult};

const WAVE_FORMAT_PCM: u16 = 1;
const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Interleaved samples in their native sample type.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleBuffer {
    /// Signed 8-bit.
    I8(Vec<i8>),
    /// Unsigned 8-bit, as stored in 8-bit WAV files.
    U8(Vec<u8>),
    /// Signed 16-bit.
    I16(Vec<i16>),
    /// Unsigned 16-bit.
    U16(Vec<u16>),
    /// Signed 32-bit; 24-bit WAV data is widened into the upper bits.
    I32(Vec<i32>),
    /// 32-bit float.
    F32(Vec<f32>),
    /// 64-bit float.
    F64(Vec<f64>),
}

impl SampleBuffer {
    /// Number of samples across all channels.
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// Return `true` when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample type name.
    pub fn dtype(&self) -> &'static str {
        match self {
            Self::I8(_) => "int8",
            Self::U8(_) => "uint8",
            Self::I16(_) => "int16",
            Self::U16(_) => "uint16",
            Self::I32(_) => "int32",
            Self::F32(_) => "float32",
            Self::F64(_) => "float64",
        }
    }

    /// Convert to signed 16-bit.
    ///
    /// Floats are peak-normalized, 32-bit integers are divided by 65536, unsigned types are
    /// re-centered around zero, and 8-bit signed samples are scaled by 256.
    pub fn to_i16(&self) -> Vec<i16> {
        if !matches!(self, Self::I16(_)) {
            tracing::warn!(
                dtype = self.dtype(),
                "converting audio automatically to 16-bit int format"
            );
        }
        match self {
            Self::I16(v) => v.clone(),
            Self::I8(v) => v.iter().map(|&x| i16::from(x) * 256).collect(),
            Self::U8(v) => v
                .iter()
                .map(|&x| (i32::from(x) * 257 - 32768) as i16)
                .collect(),
            Self::U16(v) => v.iter().map(|&x| (i32::from(x) - 32768) as i16).collect(),
            Self::I32(v) => v.iter().map(|&x| (x / 65536) as i16).collect(),
            Self::F32(v) => normalize_float(v.iter().map(|&x| f64::from(x))),
            Self::F64(v) => normalize_float(v.iter().copied()),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        match self {
            Self::I8(v) => Self::I8(v[start..end].to_vec()),
            Self::U8(v) => Self::U8(v[start..end].to_vec()),
            Self::I16(v) => Self::I16(v[start..end].to_vec()),
            Self::U16(v) => Self::U16(v[start..end].to_vec()),
            Self::I32(v) => Self::I32(v[start..end].to_vec()),
            Self::F32(v) => Self::F32(v[start..end].to_vec()),
            Self::F64(v) => Self::F64(v[start..end].to_vec()),
        }
    }
}

fn normalize_float(samples: impl Iterator<Item = f64> + Clone) -> Vec<i16> {
    let peak = samples
        .clone()
        .filter(|x| x.is_finite())
        .fold(0.0_f64, |m, x| m.max(x.abs()));
    if peak == 0.0 {
        return samples.map(|_| 0).collect();
    }
    samples.map(|x| (x / peak * 32767.0) as i16).collect()
}

/// Largest channel count whose 16-bit block alignment fits a WAV header.
pub const MAX_CHANNELS: u16 = u16::MAX / 2;

/// Decoded audio: sample rate, channel count and interleaved samples.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioData {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Samples, `frames * channels` long.
    pub samples: SampleBuffer,
}

impl AudioData {
    /// Validated audio buffer.
    pub fn new(sample_rate: u32, channels: u16, samples: SampleBuffer) -> BindResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(BindError::validation(
                "audio needs a positive sample rate and channel count",
            ));
        }
        if channels > MAX_CHANNELS {
            return Err(BindError::validation(format!(
                "{channels} channels exceed the supported maximum of {MAX_CHANNELS}"
            )));
        }
        if samples.len() % usize::from(channels) != 0 {
            return Err(BindError::validation(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Mono 16-bit audio.
    pub fn mono_i16(sample_rate: u32, samples: Vec<i16>) -> BindResult<Self> {
        Self::new(sample_rate, 1, SampleBuffer::I16(samples))
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Keep the part between `min_pct` and `max_pct` percent of the duration.
    pub fn crop(&self, min_pct: f64, max_pct: f64) -> Self {
        let frames = self.frames();
        let lo = ((frames as f64 * min_pct.clamp(0.0, 100.0) / 100.0) as usize).min(frames);
        let hi = ((frames as f64 * max_pct.clamp(0.0, 100.0) / 100.0) as usize).clamp(lo, frames);
        let ch = usize::from(self.channels);
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: self.samples.slice(lo * ch, hi * ch),
        }
    }
}

/// Parse a RIFF/WAVE file.
///
/// Integer PCM at 8/16/24/32 bits and IEEE float at 32/64 bits are accepted. A `data` chunk with
/// an unknown length (as written by streaming encoders) extends to the end of the buffer.
pub fn read_wav(bytes: &[u8]) -> BindResult<AudioData> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(BindError::unsupported("not a RIFF/WAVE file"));
    }

    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let declared = u32_le(&bytes[pos + 4..pos + 8]) as usize;
        let body_start = pos + 8;
        let remaining = bytes.len() - body_start;

        if id == b"fmt " {
            if declared < 16 || declared > remaining {
                return Err(BindError::unsupported("truncated WAV fmt chunk"));
            }
            let b = &bytes[body_start..body_start + declared];
            let mut tag = u16_le(&b[0..2]);
            let channels = u16_le(&b[2..4]);
            let rate = u32_le(&b[4..8]);
            let bits = u16_le(&b[14..16]);
            if tag == WAVE_FORMAT_EXTENSIBLE && declared >= 26 {
                tag = u16_le(&b[24..26]);
            }
            fmt = Some((tag, channels, rate, bits));
        } else if id == b"data" {
            let (tag, channels, rate, bits) =
                fmt.ok_or_else(|| BindError::unsupported("WAV data chunk before fmt chunk"))?;
            let len = if declared == 0 || declared > remaining {
                remaining
            } else {
                declared
            };
            let samples = decode_samples(&bytes[body_start..body_start + len], tag, bits)?;
            return AudioData::new(rate, channels, samples);
        }

        pos = body_start.saturating_add(declared + (declared & 1));
    }
    Err(BindError::unsupported("WAV file has no data chunk"))
}

fn decode_samples(data: &[u8], tag: u16, bits: u16) -> BindResult<SampleBuffer> {
    let out = match (tag, bits) {
        (WAVE_FORMAT_PCM, 8) => SampleBuffer::U8(data.to_vec()),
        (WAVE_FORMAT_PCM, 16) => SampleBuffer::I16(
            data.chunks_exact(2)
                .map(|c| i16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        (WAVE_FORMAT_PCM, 24) => SampleBuffer::I32(
            data.chunks_exact(3)
                .map(|c| i32::from_le_bytes([0, c[0], c[1], c[2]]))
                .collect(),
        ),
        (WAVE_FORMAT_PCM, 32) => SampleBuffer::I32(
            data.chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        (WAVE_FORMAT_IEEE_FLOAT, 32) => SampleBuffer::F32(
            data.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        (WAVE_FORMAT_IEEE_FLOAT, 64) => SampleBuffer::F64(
            data.chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
        _ => {
            return Err(BindError::unsupported(format!(
                "WAV encoding tag {tag} with {bits}-bit samples"
            )));
        }
    };
    Ok(out)
}

fn u16_le(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn u32_le(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Serialize audio as a 16-bit PCM WAV file, converting samples with [`SampleBuffer::to_i16`].
///
/// Fails when the header fields (data length, byte rate or block alignment) do not fit their
/// 32/16-bit slots.
pub fn write_wav(audio: &AudioData) -> BindResult<Vec<u8>> {
    let samples = audio.samples.to_i16();
    let too_large = || {
        BindError::unsupported(format!(
            "audio ({} Hz, {} channels, {} samples) is too large for a WAV header",
            audio.sample_rate,
            audio.channels,
            samples.len()
        ))
    };
    let data_len = samples
        .len()
        .checked_mul(2)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .ok_or_else(too_large)?;
    let block_align = audio.channels.checked_mul(2).ok_or_else(too_large)?;
    let byte_rate = audio
        .sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(too_large)?;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&audio.channels.to_le_bytes());
    out.extend_from_slice(&audio.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    Ok(out)
}

/// Load an audio file, optionally keeping only the `crop` percentage window.
///
/// WAV files are parsed directly; other containers are decoded through ffmpeg.
pub fn load_audio(path: &Path, crop: Option<(f64, f64)>) -> BindResult<AudioData> {
    let is_wav = extension_of(&path.to_string_lossy()).as_deref() == Some("wav");
    let audio = if is_wav {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read audio '{}'", path.display()))
            .map_err(|e| BindError::io(format!("{e:#}")))?;
        read_wav(&bytes)?
    } else {
        if !path.is_file() {
            return Err(BindError::io(format!(
                "Cannot load audio from file: `{}` not found.",
                path.display()
            )));
        }
        ffmpeg_decode_wav(path).and_then(|b| read_wav(&b))?
    };
    Ok(match crop {
        Some((lo, hi)) if lo != 0.0 || hi != 100.0 => audio.crop(lo, hi),
        _ => audio,
    })
}

/// Encode `audio` as `format` (an extension such as `wav` or `mp3`).
pub fn encode_audio(audio: &AudioData, format: &str) -> BindResult<Vec<u8>> {
    let wav = write_wav(audio)?;
    if format.eq_ignore_ascii_case("wav") {
        return Ok(wav);
    }
    ffmpeg_transcode(&wav, format)
}

/// Encode `audio` and store it in the cache as `audio.<format>`.
pub fn save_audio(cache: &ContentCache, audio: &AudioData, format: &str) -> BindResult<PathBuf> {
    let bytes = encode_audio(audio, format)?;
    cache.save_bytes(&bytes, &format!("audio.{}", format.to_ascii_lowercase()))
}

#[cfg(feature = "media-ffmpeg")]
fn ffmpeg_decode_wav(path: &Path) -> BindResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args(["-vn", "-f", "wav", "-acodec", "pcm_s16le", "pipe:1"])
        .output()
        .map_err(|e| {
            BindError::unsupported(format!(
                "failed to run ffmpeg for audio decode: {e}. Please install `ffmpeg` to use non-WAV audio file formats"
            ))
        })?;
    if !out.status.success() {
        return Err(BindError::unsupported(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(out.stdout)
}

#[cfg(not(feature = "media-ffmpeg"))]
fn ffmpeg_decode_wav(path: &Path) -> BindResult<Vec<u8>> {
    Err(BindError::unsupported(format!(
        "decoding '{}' requires the 'media-ffmpeg' feature; only WAV is read natively",
        path.display()
    )))
}

#[cfg(feature = "media-ffmpeg")]
fn ffmpeg_transcode(wav: &[u8], format: &str) -> BindResult<Vec<u8>> {
    let dir = tempfile::tempdir().map_err(|e| BindError::io(format!("create temp dir: {e}")))?;
    let input = dir.path().join("in.wav");
    let output = dir.path().join(format!("out.{format}"));
    std::fs::write(&input, wav)
        .map_err(|e| BindError::io(format!("write '{}': {e}", input.display())))?;

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-i"])
        .arg(&input)
        .arg(&output)
        .output()
        .map_err(|e| BindError::unsupported(format!("failed to run ffmpeg for audio encode: {e}")))?;
    if !out.status.success() {
        return Err(BindError::unsupported(format!(
            "ffmpeg cannot encode audio as '{format}': {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    std::fs::read(&output).map_err(|e| BindError::io(format!("read '{}': {e}", output.display())))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn ffmpeg_transcode(_wav: &[u8], format: &str) -> BindResult<Vec<u8>> {
    Err(BindError::unsupported(format!(
        "encoding audio as '{format}' requires the 'media-ffmpeg' feature"
    )))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/audio.rs"]
mod tests;
