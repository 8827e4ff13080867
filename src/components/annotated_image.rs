use std::collections::BTreeMap;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::store::ContentCache;
use crate::codec::image::{ImageArray, OpenOptions, open_image, parse_format, save_image};
use crate::components::base::{Component, Configurable};
use crate::components::image::{
    ImageCodec, ImageType, ImageValue, example_image, example_image_data, reference_image_path,
};
use crate::foundation::error::{BindError, BindResult};
use crate::payload::file_data::FileData;

/// Width in pixels of the solid border drawn around a bounding box.
pub const BOX_BORDER: u32 = 3;

/// Fill level inside a bounding box.
const BOX_FILL: f32 = 0.5;

/// Mask color when the label has no entry in the color map.
const DEFAULT_COLOR: [u8; 3] = [255, 0, 0];

/// One mask and its label on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    /// RGBA mask image.
    pub image: FileData,
    /// Label shown in the legend.
    pub label: String,
}

/// Wire payload of [`AnnotatedImage`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotatedImageData {
    /// Base image.
    pub image: FileData,
    /// Masks drawn over the base image.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Confidence mask with values in `[0, 1]`, the same size as the base image.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskArray {
    /// Rows.
    pub height: u32,
    /// Columns.
    pub width: u32,
    /// Row-major values.
    pub data: Vec<f32>,
}

/// Ways to describe one annotation region.
#[derive(Clone, Debug, PartialEq)]
pub enum Mask {
    /// `(x1, y1, x2, y2)` bounding box, end-exclusive.
    BBox([u32; 4]),
    /// Per-pixel confidence.
    Array(MaskArray),
    /// Existing mask image.
    Path(String),
}

/// Values accepted and produced by [`AnnotatedImage`].
#[derive(Clone, Debug)]
pub struct AnnotatedValue {
    /// Base image.
    pub image: ImageValue,
    /// `(mask, label)` pairs.
    pub annotations: Vec<(Mask, String)>,
}

impl AnnotatedValue {
    pub(crate) fn summary(&self) -> Value {
        let annotations: Vec<Value> = self
            .annotations
            .iter()
            .map(|(mask, label)| {
                let mask = match mask {
                    Mask::BBox(b) => json!(b),
                    Mask::Array(a) => json!({"shape": [a.height, a.width]}),
                    Mask::Path(p) => json!(p),
                };
                json!([mask, label])
            })
            .collect();
        json!({"image": self.image.summary(), "annotations": annotations})
    }
}

fn default_format() -> String {
    "webp".to_string()
}

/// [`AnnotatedImage`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnnotatedImageOptions {
    /// Label to hex color (`#rgb` or `#rrggbb`).
    pub color_map: Option<BTreeMap<String, String>>,
    /// Encoding of base images produced from arrays.
    #[serde(default = "default_format")]
    pub format: String,
    /// Show the label legend.
    pub show_legend: bool,
}

impl Default for AnnotatedImageOptions {
    fn default() -> Self {
        Self {
            color_map: None,
            format: default_format(),
            show_legend: true,
        }
    }
}

/// Base image with labeled masks drawn over it.
#[derive(Clone, Debug)]
pub struct AnnotatedImage {
    options: AnnotatedImageOptions,
    codec: ImageCodec,
}

/// Parse `#rgb` / `#rrggbb` into RGB.
pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    let step = match digits.len() {
        3 => 1,
        6 => 2,
        _ => return None,
    };
    let mut out = [0u8; 3];
    for (i, slot) in out.iter_mut().enumerate() {
        let part = digits.get(i * step..(i + 1) * step)?;
        *slot = u8::from_str_radix(part, 16).ok()?;
    }
    Some(out)
}

/// Render a bounding box as a `width x height` mask: the border at 1.0, the inside at 0.5.
pub fn bbox_mask(width: u32, height: u32, bbox: [u32; 4]) -> MaskArray {
    let [x1, y1, x2, y2] = bbox;
    let (x1, x2) = (x1.min(width), x2.min(width));
    let (y1, y2) = (y1.min(height), y2.min(height));
    let mut data = vec![0.0f32; width as usize * height as usize];
    for y in y1..y2 {
        for x in x1..x2 {
            let border = x < x1 + BOX_BORDER
                || x + BOX_BORDER >= x2
                || y < y1 + BOX_BORDER
                || y + BOX_BORDER >= y2;
            data[(y * width + x) as usize] = if border { 1.0 } else { BOX_FILL };
        }
    }
    MaskArray {
        height,
        width,
        data,
    }
}

/// Color a mask: RGB set wherever the mask is non-zero, alpha from the mask value.
pub fn colorize_mask(mask: &MaskArray, color: [u8; 3]) -> BindResult<RgbaImage> {
    if mask.data.len() != mask.width as usize * mask.height as usize {
        return Err(BindError::validation(format!(
            "mask of size {}x{} has {} values",
            mask.width,
            mask.height,
            mask.data.len()
        )));
    }
    Ok(RgbaImage::from_fn(mask.width, mask.height, |x, y| {
        let v = mask.data[(y * mask.width + x) as usize];
        if v > 0.0 {
            let alpha = (v.clamp(0.0, 1.0) * 255.0) as u8;
            Rgba([color[0], color[1], color[2], alpha])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

impl Configurable for AnnotatedImage {
    type Options = AnnotatedImageOptions;

    fn from_options(options: AnnotatedImageOptions) -> BindResult<Self> {
        if let Some(map) = &options.color_map {
            for (label, hex) in map {
                if hex_to_rgb(hex).is_none() {
                    return Err(BindError::config(format!(
                        "color for label '{label}' is not a hex color: {hex}"
                    )));
                }
            }
        }
        let codec = ImageCodec {
            kind: ImageType::Filepath,
            mode: None,
            format: parse_format(&options.format)?,
            crop: None,
        };
        Ok(Self { options, codec })
    }
}

impl AnnotatedImage {
    fn color_for(&self, label: &str) -> [u8; 3] {
        self.options
            .color_map
            .as_ref()
            .and_then(|m| m.get(label))
            .and_then(|hex| hex_to_rgb(hex))
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Color `mask` for `label` and store it as PNG.
    fn save_mask(
        &self,
        cache: &ContentCache,
        mask: &MaskArray,
        label: &str,
    ) -> BindResult<FileData> {
        let colored = DynamicImage::ImageRgba8(colorize_mask(mask, self.color_for(label))?);
        let path = save_image(cache, &colored, "mask", ImageFormat::Png)?;
        Ok(FileData::from_path(&path))
    }

    /// Store the base image and return it with its pixel size.
    fn base(&self, cache: &ContentCache, image: ImageValue) -> BindResult<(FileData, u32, u32)> {
        let decoded: DynamicImage = match &image {
            ImageValue::Array(a) => a.to_image()?,
            ImageValue::Decoded(img) => img.clone(),
            ImageValue::Path(p) if is_http_url(p) => {
                let local = cache.save_url(p)?;
                let img = open_image(&local, OpenOptions::default())?;
                return Ok((FileData::from_path(&local), img.width(), img.height()));
            }
            ImageValue::Path(p) => open_image(Path::new(p), OpenOptions::default())?,
        };
        let fd = match image {
            ImageValue::Path(p) => reference_image_path(cache, &p)?,
            other => self.codec.store(cache, other)?,
        };
        Ok((fd, decoded.width(), decoded.height()))
    }
}

impl Component for AnnotatedImage {
    type Payload = AnnotatedImageData;
    type Value = AnnotatedValue;
    type Config = AnnotatedImageOptions;

    fn tag(&self) -> &'static str {
        "annotatedimage"
    }

    fn config(&self) -> &AnnotatedImageOptions {
        &self.options
    }

    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<AnnotatedImageData>,
    ) -> BindResult<Option<AnnotatedValue>> {
        let Some(data) = payload else {
            return Ok(None);
        };
        let image = data.image.materialize(cache)?;
        let annotations = data
            .annotations
            .iter()
            .map(|a| {
                let mask = a.image.materialize(cache)?;
                Ok((
                    Mask::Path(mask.to_string_lossy().into_owned()),
                    a.label.clone(),
                ))
            })
            .collect::<BindResult<Vec<_>>>()?;
        Ok(Some(AnnotatedValue {
            image: ImageValue::Path(image.to_string_lossy().into_owned()),
            annotations,
        }))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<AnnotatedValue>,
    ) -> BindResult<Option<AnnotatedImageData>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let (image, width, height) = self.base(cache, value.image)?;
        let mut annotations = Vec::with_capacity(value.annotations.len());
        for (mask, label) in value.annotations {
            let mask_fd = match mask {
                Mask::Path(p) => reference_image_path(cache, &p)?,
                Mask::BBox(b) => self.save_mask(cache, &bbox_mask(width, height, b), &label)?,
                Mask::Array(m) => {
                    if (m.width, m.height) != (width, height) {
                        return Err(BindError::validation(format!(
                            "mask for '{label}' is {}x{} but the image is {width}x{height}",
                            m.width, m.height
                        )));
                    }
                    self.save_mask(cache, &m, &label)?
                }
            };
            annotations.push(Annotation {
                image: mask_fd,
                label,
            });
        }
        Ok(Some(AnnotatedImageData { image, annotations }))
    }

    fn example_payload(&self) -> AnnotatedImageData {
        AnnotatedImageData {
            image: example_image_data(),
            annotations: vec![],
        }
    }

    fn example_value(&self) -> AnnotatedValue {
        AnnotatedValue {
            image: ImageValue::Array(ImageArray::from_image(&example_image())),
            annotations: vec![(Mask::BBox([0, 0, 1, 1]), "pixel".to_string())],
        }
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image": {"$ref": "FileData"},
                "annotations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"image": {"$ref": "FileData"}, "label": {"type": "string"}}
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/annotated_image.rs"]
mod tests;
