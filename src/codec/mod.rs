//! Content codecs used by components.

/// Audio sample buffers, WAV I/O and ffmpeg conversion.
pub mod audio;
/// `data:` URLs and base64 payloads.
pub mod base64;
/// Pixel arrays, image decoding with orientation, and format fallback.
pub mod image;
/// Tables, numeric matrices, delimited files and styler metadata.
pub mod table;
/// Video probing and conversion through ffprobe/ffmpeg.
pub mod video;
