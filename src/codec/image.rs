use std::io::{BufRead, Cursor, Seek};
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, ImageBuffer, ImageDecoder as _, ImageFormat, ImageReader};

use crate::cache::filename::extension_of;
use crate::cache::store::ContentCache;
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult};

choice_enum! {
    /// Color modes an image can be converted to, named as on the wire.
    pub enum ImageMode ("image_mode", default = Rgb) {
        /// Black and white, stored as 8-bit luma with values 0 or 255.
        Bilevel => "1",
        /// 8-bit grayscale.
        Luma => "L",
        /// 8-bit grayscale with alpha.
        LumaAlpha => "LA",
        /// 8-bit RGB.
        Rgb => "RGB",
        /// 8-bit RGBA.
        Rgba => "RGBA",
        /// 16-bit grayscale.
        Luma16 => "I;16",
    }
}

impl ImageMode {
    /// Mode matching a decoded color type, if there is an exact one.
    pub fn of(color: ColorType) -> Option<Self> {
        match color {
            ColorType::L8 => Some(Self::Luma),
            ColorType::La8 => Some(Self::LumaAlpha),
            ColorType::Rgb8 => Some(Self::Rgb),
            ColorType::Rgba8 => Some(Self::Rgba),
            ColorType::L16 => Some(Self::Luma16),
            _ => None,
        }
    }

    /// Convert `img` into this mode.
    pub fn convert(self, img: &DynamicImage) -> DynamicImage {
        match self {
            Self::Bilevel => {
                let mut luma = img.to_luma8();
                for p in luma.pixels_mut() {
                    p.0[0] = if p.0[0] >= 128 { 255 } else { 0 };
                }
                DynamicImage::ImageLuma8(luma)
            }
            Self::Luma => DynamicImage::ImageLuma8(img.to_luma8()),
            Self::LumaAlpha => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
            Self::Rgb => DynamicImage::ImageRgb8(img.to_rgb8()),
            Self::Rgba => DynamicImage::ImageRgba8(img.to_rgba8()),
            Self::Luma16 => DynamicImage::ImageLuma16(img.to_luma16()),
        }
    }
}

/// Sample storage of an [`ImageArray`].
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    /// 8-bit samples.
    U8(Vec<u8>),
    /// 16-bit samples.
    U16(Vec<u16>),
    /// Floating-point samples in `[0, 1]`, or `[-1, 1]` when any sample is negative.
    F32(Vec<f32>),
}

impl PixelData {
    fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }
}

/// Row-major `height x width x channels` pixel array.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageArray {
    /// Rows.
    pub height: u32,
    /// Columns.
    pub width: u32,
    /// Samples per pixel (1 to 4).
    pub channels: u8,
    /// Interleaved samples.
    pub data: PixelData,
}

impl ImageArray {
    /// Build a validated array.
    pub fn new(height: u32, width: u32, channels: u8, data: PixelData) -> BindResult<Self> {
        if !(1..=4).contains(&channels) {
            return Err(BindError::validation(format!(
                "image arrays need 1 to 4 channels, got {channels}"
            )));
        }
        let expected = (height as usize)
            .checked_mul(width as usize)
            .and_then(|n| n.checked_mul(usize::from(channels)))
            .ok_or_else(|| {
                BindError::validation(format!(
                    "image array of shape ({height}, {width}, {channels}) is too large"
                ))
            })?;
        if data.len() != expected {
            return Err(BindError::validation(format!(
                "image array of shape ({height}, {width}, {channels}) needs {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// 8-bit array.
    pub fn from_u8(height: u32, width: u32, channels: u8, data: Vec<u8>) -> BindResult<Self> {
        Self::new(height, width, channels, PixelData::U8(data))
    }

    /// `(height, width, channels)`.
    pub fn shape(&self) -> (u32, u32, u8) {
        (self.height, self.width, self.channels)
    }

    /// Array holding the pixels of `img` at their native depth.
    pub fn from_image(img: &DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (channels, data) = match img {
            DynamicImage::ImageLuma8(b) => (1, PixelData::U8(b.as_raw().clone())),
            DynamicImage::ImageLumaA8(b) => (2, PixelData::U8(b.as_raw().clone())),
            DynamicImage::ImageRgb8(b) => (3, PixelData::U8(b.as_raw().clone())),
            DynamicImage::ImageRgba8(b) => (4, PixelData::U8(b.as_raw().clone())),
            DynamicImage::ImageLuma16(b) => (1, PixelData::U16(b.as_raw().clone())),
            DynamicImage::ImageLumaA16(b) => (2, PixelData::U16(b.as_raw().clone())),
            DynamicImage::ImageRgb16(b) => (3, PixelData::U16(b.as_raw().clone())),
            DynamicImage::ImageRgba16(b) => (4, PixelData::U16(b.as_raw().clone())),
            DynamicImage::ImageRgb32F(b) => (3, PixelData::F32(b.as_raw().clone())),
            DynamicImage::ImageRgba32F(b) => (4, PixelData::F32(b.as_raw().clone())),
            other => (4, PixelData::U8(other.to_rgba8().into_raw())),
        };
        Self {
            height,
            width,
            channels,
            data,
        }
    }

    /// Decoded image with the array's native depth; float samples are scaled into 8 bits.
    pub fn to_image(&self) -> BindResult<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let bad_shape = || BindError::validation("image array buffer does not match its shape");
        let img = match &self.data {
            PixelData::U8(v) => u8_image(w, h, self.channels, v.clone()).ok_or_else(bad_shape)?,
            PixelData::U16(v) => match self.channels {
                1 => ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageLuma16),
                2 => ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageLumaA16),
                3 => ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb16),
                _ => ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgba16),
            }
            .ok_or_else(bad_shape)?,
            PixelData::F32(v) => {
                u8_image(w, h, self.channels, float_to_u8(v)).ok_or_else(bad_shape)?
            }
        };
        Ok(img)
    }
}

fn u8_image(w: u32, h: u32, channels: u8, v: Vec<u8>) -> Option<DynamicImage> {
    match channels {
        1 => ImageBuffer::from_raw(w, h, v).map(DynamicImage::ImageLuma8),
        2 => ImageBuffer::from_raw(w, h, v).map(DynamicImage::ImageLumaA8),
        3 => ImageBuffer::from_raw(w, h, v).map(DynamicImage::ImageRgb8),
        _ => ImageBuffer::from_raw(w, h, v).map(DynamicImage::ImageRgba8),
    }
}

fn float_to_u8(v: &[f32]) -> Vec<u8> {
    let signed = v.iter().any(|x| *x < 0.0);
    v.iter()
        .map(|&x| {
            let unit = if signed { (x + 1.0) / 2.0 } else { x };
            let unit = if unit.is_finite() { unit.clamp(0.0, 1.0) } else { 0.0 };
            (unit * 255.0).round() as u8
        })
        .collect()
}

/// Parse a format name such as `png`, `jpg` or `webp`.
pub fn parse_format(name: &str) -> BindResult<ImageFormat> {
    let lower = name.trim().trim_start_matches('.').to_ascii_lowercase();
    ImageFormat::from_extension(&lower).ok_or_else(|| {
        BindError::config(format!(
            "unknown image format '{name}'; expected an extension such as png, jpeg, webp, gif, bmp or tiff"
        ))
    })
}

/// File extension written for `format`.
pub fn format_extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        other => other.extensions_str().first().copied().unwrap_or("png"),
    }
}

/// Whether the encoder for `format` accepts `color` directly.
///
/// `None` means the pairing is not known in advance and is only discovered by encoding.
pub fn encoder_supports(format: ImageFormat, color: ColorType) -> Option<bool> {
    use ColorType::*;
    let supported: &[ColorType] = match format {
        ImageFormat::Png => &[L8, La8, Rgb8, Rgba8, L16, La16, Rgb16, Rgba16],
        ImageFormat::Jpeg => &[L8, Rgb8],
        ImageFormat::WebP => &[L8, La8, Rgb8, Rgba8],
        ImageFormat::Gif => &[Rgb8, Rgba8],
        ImageFormat::Bmp => &[L8, La8, Rgb8, Rgba8],
        ImageFormat::Tiff => &[L8, Rgb8, Rgba8, L16, Rgb16, Rgba16],
        _ => return None,
    };
    Some(supported.contains(&color))
}

/// Encoded image bytes together with the format actually used.
#[derive(Clone, Debug)]
pub struct EncodedImage {
    /// Encoded file content.
    pub bytes: Vec<u8>,
    /// Format written, which differs from the requested one after a fallback.
    pub format: ImageFormat,
}

/// Encode `img` as `format`, falling back to PNG when the encoder cannot take the pixel layout.
pub fn encode_image(img: &DynamicImage, format: ImageFormat) -> BindResult<EncodedImage> {
    let img = match img.color() {
        ColorType::Rgb32F => DynamicImage::ImageRgb8(img.to_rgb8()),
        ColorType::Rgba32F => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img.clone(),
    };

    let first = match encoder_supports(format, img.color()) {
        Some(false) => {
            tracing::debug!(
                ?format,
                color = ?img.color(),
                "encoder cannot take color type, writing png"
            );
            None
        }
        _ => match write_format(&img, format) {
            Ok(bytes) => Some(EncodedImage { bytes, format }),
            Err(e) => {
                tracing::warn!(?format, error = %e, "image encode failed, writing png");
                None
            }
        },
    };
    if let Some(done) = first {
        return Ok(done);
    }
    let bytes = write_format(&img, ImageFormat::Png).map_err(|e| {
        BindError::unsupported(format!("image cannot be encoded even as png: {e}"))
    })?;
    Ok(EncodedImage {
        bytes,
        format: ImageFormat::Png,
    })
}

fn write_format(img: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)?;
    Ok(out.into_inner())
}

/// Encode `img` and store it in the cache as `<stem>.<ext>`.
pub fn save_image(
    cache: &ContentCache,
    img: &DynamicImage,
    stem: &str,
    format: ImageFormat,
) -> BindResult<PathBuf> {
    let encoded = encode_image(img, format)?;
    let name = format!("{stem}.{}", format_extension(encoded.format));
    cache.save_bytes(&encoded.bytes, &name)
}

/// Options for [`open_image`] and [`decode_image_bytes`].
#[derive(Clone, Copy, Debug)]
pub struct OpenOptions {
    /// Rotate/flip according to the EXIF orientation tag.
    pub apply_orientation: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            apply_orientation: true,
        }
    }
}

/// Decode an image file.
pub fn open_image(path: &Path, opts: OpenOptions) -> BindResult<DynamicImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| BindError::io(format!("open image '{}': {e}", path.display())))?;
    decode_reader(reader, &path.display().to_string(), opts)
}

/// Decode an in-memory image.
pub fn decode_image_bytes(bytes: &[u8], opts: OpenOptions) -> BindResult<DynamicImage> {
    decode_reader(ImageReader::new(Cursor::new(bytes)), "<memory>", opts)
}

fn decode_reader<R: BufRead + Seek>(
    reader: ImageReader<R>,
    label: &str,
    opts: OpenOptions,
) -> BindResult<DynamicImage> {
    let reader = reader
        .with_guessed_format()
        .map_err(|e| BindError::io(format!("read image '{label}': {e}")))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| BindError::unsupported(format!("cannot decode image '{label}': {e}")))?;

    let orientation = if opts.apply_orientation {
        match decoder.orientation() {
            Ok(o) => Some(o),
            Err(e) => {
                tracing::warn!(image = label, error = %e, "failed to read orientation, leaving image unrotated");
                None
            }
        }
    } else {
        None
    };

    let mut img = DynamicImage::from_decoder(decoder)
        .map_err(|e| BindError::unsupported(format!("cannot decode image '{label}': {e}")))?;
    if let Some(o) = orientation
        && o != Orientation::NoTransforms
    {
        tracing::debug!(image = label, orientation = ?o, "applying exif orientation");
        img.apply_orientation(o);
    }
    Ok(img)
}

/// Color type of an image file, read from its header only.
pub fn probe_color(path: &Path) -> BindResult<ColorType> {
    let decoder = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| BindError::io(format!("open image '{}': {e}", path.display())))?
        .into_decoder()
        .map_err(|e| {
            BindError::unsupported(format!("cannot decode image '{}': {e}", path.display()))
        })?;
    Ok(decoder.color_type())
}

/// Return `true` when `name` has an `.svg` extension.
pub fn is_svg(name: &str) -> bool {
    extension_of(name).as_deref() == Some("svg")
}

/// Where [`resize_and_crop`] anchors the crop window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropAnchor {
    /// Keep the center.
    #[default]
    Center,
    /// Keep the top-left corner.
    Top,
}

/// Crop `img` to the aspect ratio of `size` around `anchor`, then resize to exactly `size`.
///
/// A `None` dimension keeps the image's own size along that axis.
pub fn resize_and_crop(
    img: &DynamicImage,
    size: (Option<u32>, Option<u32>),
    anchor: CropAnchor,
) -> DynamicImage {
    let (src_w, src_h) = (img.width(), img.height());
    let tw = size.0.unwrap_or(src_w).max(1);
    let th = size.1.unwrap_or(src_h).max(1);
    if src_w == 0 || src_h == 0 {
        return img.clone();
    }

    let target_ratio = f64::from(tw) / f64::from(th);
    let src_ratio = f64::from(src_w) / f64::from(src_h);
    let (crop_w, crop_h) = if src_ratio > target_ratio {
        (((f64::from(src_h) * target_ratio).round() as u32).clamp(1, src_w), src_h)
    } else {
        (src_w, ((f64::from(src_w) / target_ratio).round() as u32).clamp(1, src_h))
    };
    let (x, y) = match anchor {
        CropAnchor::Center => ((src_w - crop_w) / 2, (src_h - crop_h) / 2),
        CropAnchor::Top => (0, 0),
    };
    img.crop_imm(x, y, crop_w, crop_h)
        .resize_exact(tw, th, FilterType::Lanczos3)
}

#[cfg(test)]
#[path = "../../tests/unit/codec/image.rs"]
mod tests;
