//! The [`Image`] component and the image handling shared by gallery, editor and annotation
//! components.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::filename::{extension_of, split_extension};
use crate::cache::store::ContentCache;
use crate::codec::base64::encode_data_url;
use crate::codec::image::{
    CropAnchor, ImageArray, ImageMode, OpenOptions, PixelData, encode_image, is_svg, open_image,
    parse_format, probe_color, resize_and_crop, save_image,
};
use crate::components::base::{Clearable, Component, Configurable};
use crate::foundation::choice::choice_enum;
use crate::foundation::error::BindResult;
use crate::payload::file_data::FileData;

/// MIME type reported for SVG payloads.
pub const SVG_MIME: &str = "image/svg+xml";

choice_enum! {
    /// Representation an image is handed to the user function in.
    pub enum ImageType ("type", default = Numpy) {
        /// Raw pixel array.
        Numpy => "numpy",
        /// Decoded image.
        Pil => "pil",
        /// Path of a file in the cache.
        Filepath => "filepath",
    }
}

/// Values accepted and produced by [`Image`].
#[derive(Clone, Debug)]
pub enum ImageValue {
    /// Pixel array.
    Array(ImageArray),
    /// Decoded image.
    Decoded(DynamicImage),
    /// Local path or URL.
    Path(String),
}

impl ImageValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Array(a) => {
                let dtype = match a.data {
                    PixelData::U8(_) => "uint8",
                    PixelData::U16(_) => "uint16",
                    PixelData::F32(_) => "float32",
                };
                let (h, w, c) = a.shape();
                json!({"shape": [h, w, c], "dtype": dtype})
            }
            Self::Decoded(img) => json!({
                "width": img.width(),
                "height": img.height(),
                "color": format!("{:?}", img.color()),
            }),
            Self::Path(p) => json!(p),
        }
    }
}

/// Conversion settings shared by every component that carries images.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ImageCodec {
    pub kind: ImageType,
    pub mode: Option<ImageMode>,
    pub format: ImageFormat,
    /// Resize and center-crop decoded images to `(width, height)`.
    pub crop: Option<(u32, u32)>,
}

impl ImageCodec {
    /// Turn an uploaded image into the configured representation.
    pub fn load(&self, cache: &ContentCache, fd: &FileData) -> BindResult<ImageValue> {
        let path = fd.materialize(cache)?;
        let name = fd
            .orig_name
            .clone()
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "image".to_string());
        let suffix = extension_of(&name).unwrap_or_default();

        if suffix == "svg" || is_svg(&path.to_string_lossy()) {
            return Ok(path_value(&path));
        }
        let animated = suffix == "gif";
        if self.kind == ImageType::Filepath
            && self.crop.is_none()
            && (animated || self.mode_matches(&path))
        {
            return Ok(path_value(&path));
        }

        let mut img = open_image(
            &path,
            OpenOptions {
                apply_orientation: !animated,
            },
        )?;
        if !animated && let Some(mode) = self.mode {
            img = mode.convert(&img);
        }
        if let Some((w, h)) = self.crop {
            img = resize_and_crop(&img, (Some(w), Some(h)), CropAnchor::Center);
        }
        // Re-encoded uploads keep their own format when it is a known one.
        let codec = Self {
            format: parse_format(&suffix).unwrap_or(self.format),
            ..*self
        };
        let (stem, _) = split_extension(&name);
        codec.represent(cache, img, if stem.is_empty() { "image" } else { stem })
    }

    /// Whether the file can be returned untouched, without a mode conversion.
    fn mode_matches(&self, path: &Path) -> bool {
        let Some(mode) = self.mode else {
            return true;
        };
        match probe_color(path) {
            Ok(color) => ImageMode::of(color) == Some(mode),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot probe image color type");
                false
            }
        }
    }

    /// Wrap a decoded image in the configured representation.
    pub fn represent(
        &self,
        cache: &ContentCache,
        img: DynamicImage,
        stem: &str,
    ) -> BindResult<ImageValue> {
        Ok(match self.kind {
            ImageType::Numpy => ImageValue::Array(ImageArray::from_image(&img)),
            ImageType::Pil => ImageValue::Decoded(img),
            ImageType::Filepath => {
                let path = save_image(cache, &img, stem, self.format)?;
                path_value(&path)
            }
        })
    }

    /// Turn a returned image into a file reference.
    pub fn store(&self, cache: &ContentCache, value: ImageValue) -> BindResult<FileData> {
        match value {
            ImageValue::Path(p) => reference_image_path(cache, &p),
            ImageValue::Array(a) => {
                let img = a.to_image()?;
                self.store_decoded(cache, &img)
            }
            ImageValue::Decoded(img) => self.store_decoded(cache, &img),
        }
    }

    fn store_decoded(&self, cache: &ContentCache, img: &DynamicImage) -> BindResult<FileData> {
        let path = save_image(cache, img, "image", self.format)?;
        Ok(FileData::from_path(&path))
    }
}

fn path_value(path: &Path) -> ImageValue {
    ImageValue::Path(path.to_string_lossy().into_owned())
}

/// Reference an existing image: URLs stay remote, local files are copied into the cache.
pub(crate) fn reference_image_path(cache: &ContentCache, path: &str) -> BindResult<FileData> {
    let svg = is_svg(path);
    let fd = if is_http_url(path) {
        FileData::from_url(path)
    } else {
        let cached: PathBuf = cache.save_file(Path::new(path))?;
        let orig = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let fd = FileData::from_path(&cached);
        match orig {
            Some(name) => fd.with_orig_name(name),
            None => fd,
        }
    };
    Ok(if svg { fd.with_mime_type(SVG_MIME) } else { fd })
}

/// A 1x1 white image.
pub(crate) fn example_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])))
}

/// [`example_image`] as an inline PNG reference.
pub(crate) fn example_image_data() -> FileData {
    let data_url = encode_image(&example_image(), ImageFormat::Png)
        .map(|e| encode_data_url(&e.bytes, "image/png"))
        .unwrap_or_default();
    FileData::inline(data_url, "example.png")
}

fn default_image_mode() -> Option<ImageMode> {
    Some(ImageMode::Rgb)
}

fn default_format() -> String {
    "webp".to_string()
}

/// [`Image`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    /// Representation handed to the function.
    #[serde(rename = "type")]
    pub kind: ImageType,
    /// Color mode images are converted to; `null` keeps the source mode.
    #[serde(default = "default_image_mode")]
    pub image_mode: Option<ImageMode>,
    /// Encoding used when a returned image has to be written.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            kind: ImageType::Numpy,
            image_mode: default_image_mode(),
            format: default_format(),
        }
    }
}

/// Image upload and display.
#[derive(Clone, Debug)]
pub struct Image {
    options: ImageOptions,
    codec: ImageCodec,
}

impl Configurable for Image {
    type Options = ImageOptions;

    fn from_options(options: ImageOptions) -> BindResult<Self> {
        let codec = ImageCodec {
            kind: options.kind,
            mode: options.image_mode,
            format: parse_format(&options.format)?,
            crop: None,
        };
        Ok(Self { options, codec })
    }
}

impl Component for Image {
    type Payload = FileData;
    type Value = ImageValue;
    type Config = ImageOptions;

    fn tag(&self) -> &'static str {
        "image"
    }

    fn config(&self) -> &ImageOptions {
        &self.options
    }

    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.options.kind))]
    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<FileData>,
    ) -> BindResult<Option<ImageValue>> {
        payload.map(|fd| self.codec.load(cache, &fd)).transpose()
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<ImageValue>,
    ) -> BindResult<Option<FileData>> {
        value.map(|v| self.codec.store(cache, v)).transpose()
    }

    fn example_payload(&self) -> FileData {
        example_image_data()
    }

    fn example_value(&self) -> ImageValue {
        let img = example_image();
        match self.options.kind {
            ImageType::Pil => ImageValue::Decoded(img),
            _ => ImageValue::Array(ImageArray::from_image(&img)),
        }
    }

    fn api_info(&self) -> Value {
        json!({"$ref": "ImageData"})
    }
}

impl Clearable for Image {}

#[cfg(test)]
#[path = "../../tests/unit/components/image.rs"]
mod tests;
