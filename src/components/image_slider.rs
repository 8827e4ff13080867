use image::ImageFormat;
use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::codec::image::ImageArray;
use crate::components::base::{Clearable, Component, Configurable};
use crate::components::image::{
    ImageCodec, ImageType, ImageValue, example_image, example_image_data,
};
use crate::foundation::error::{BindError, BindResult};
use crate::payload::file_data::FileData;

/// Wire payload of [`ImageSlider`]: the `[before, after]` pair.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SliderData(pub Option<FileData>, pub Option<FileData>);

/// The two images of an [`ImageSlider`], in the configured representation.
#[derive(Clone, Debug, Default)]
pub struct SliderImages(pub Option<ImageValue>, pub Option<ImageValue>);

impl SliderImages {
    pub(crate) fn summary(&self) -> Value {
        json!([
            self.0.as_ref().map(ImageValue::summary),
            self.1.as_ref().map(ImageValue::summary),
        ])
    }
}

fn default_position() -> f64 {
    0.5
}

fn default_upload_count() -> u32 {
    1
}

/// [`ImageSlider`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageSliderOptions {
    /// Representation handed to the function.
    #[serde(rename = "type")]
    pub kind: ImageType,
    /// Initial divider position, as a fraction of the width.
    #[serde(default = "default_position")]
    pub position: f64,
    /// Images the user may upload (1 or 2).
    #[serde(default = "default_upload_count")]
    pub upload_count: u32,
    /// Display height in pixels.
    pub height: Option<u32>,
    /// Display width in pixels.
    pub width: Option<u32>,
    /// CSS color of the divider.
    pub slider_color: Option<String>,
}

impl Default for ImageSliderOptions {
    fn default() -> Self {
        Self {
            kind: ImageType::Numpy,
            position: default_position(),
            upload_count: default_upload_count(),
            height: None,
            width: None,
            slider_color: None,
        }
    }
}

/// Two images compared with a draggable divider.
#[derive(Clone, Debug)]
pub struct ImageSlider {
    options: ImageSliderOptions,
    codec: ImageCodec,
}

impl Configurable for ImageSlider {
    type Options = ImageSliderOptions;

    fn from_options(options: ImageSliderOptions) -> BindResult<Self> {
        if !(0.0..=1.0).contains(&options.position) {
            return Err(BindError::config(format!(
                "`position` must lie between 0 and 1, got {}",
                options.position
            )));
        }
        if !(1..=2).contains(&options.upload_count) {
            return Err(BindError::config(format!(
                "`upload_count` must be 1 or 2, got {}",
                options.upload_count
            )));
        }
        // Images keep their own color mode; re-encoded returns default to webp.
        let codec = ImageCodec {
            kind: options.kind,
            mode: None,
            format: ImageFormat::WebP,
            crop: None,
        };
        Ok(Self { options, codec })
    }
}

impl ImageSlider {
    fn load(&self, cache: &ContentCache, fd: Option<FileData>) -> BindResult<Option<ImageValue>> {
        fd.filter(|fd| !fd.is_none())
            .map(|fd| self.codec.load(cache, &fd))
            .transpose()
    }

    fn store(&self, cache: &ContentCache, v: Option<ImageValue>) -> BindResult<Option<FileData>> {
        v.map(|v| self.codec.store(cache, v)).transpose()
    }

    fn example_side(&self) -> ImageValue {
        let img = example_image();
        match self.options.kind {
            ImageType::Pil => ImageValue::Decoded(img),
            _ => ImageValue::Array(ImageArray::from_image(&img)),
        }
    }
}

impl Component for ImageSlider {
    type Payload = SliderData;
    type Value = SliderImages;
    type Config = ImageSliderOptions;

    fn tag(&self) -> &'static str {
        "imageslider"
    }

    fn config(&self) -> &ImageSliderOptions {
        &self.options
    }

    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.options.kind))]
    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<SliderData>,
    ) -> BindResult<Option<SliderImages>> {
        let Some(SliderData(before, after)) = payload else {
            return Ok(None);
        };
        Ok(Some(SliderImages(
            self.load(cache, before)?,
            self.load(cache, after)?,
        )))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<SliderImages>,
    ) -> BindResult<Option<SliderData>> {
        let Some(SliderImages(before, after)) = value else {
            return Ok(None);
        };
        Ok(Some(SliderData(
            self.store(cache, before)?,
            self.store(cache, after)?,
        )))
    }

    fn example_payload(&self) -> SliderData {
        SliderData(Some(example_image_data()), Some(example_image_data()))
    }

    fn example_value(&self) -> SliderImages {
        SliderImages(Some(self.example_side()), Some(self.example_side()))
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "array",
            "prefixItems": [{"$ref": "FileData"}, {"$ref": "FileData"}],
            "minItems": 2,
            "maxItems": 2
        })
    }
}

impl Clearable for ImageSlider {}

#[cfg(test)]
#[path = "../../tests/unit/components/image_slider.rs"]
mod tests;
