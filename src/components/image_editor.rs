use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::codec::image::{ImageArray, ImageMode, parse_format};
use crate::components::base::{Clearable, Component, Configurable};
use crate::components::image::{
    ImageCodec, ImageType, ImageValue, example_image, example_image_data,
};
use crate::foundation::error::{BindError, BindResult};
use crate::payload::file_data::FileData;

/// Wire payload of [`ImageEditor`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditorData {
    /// Image the user started from.
    #[serde(default)]
    pub background: Option<FileData>,
    /// Drawing layers, bottom first.
    #[serde(default)]
    pub layers: Vec<FileData>,
    /// Background with every layer flattened on top.
    #[serde(default)]
    pub composite: Option<FileData>,
    /// Client-side editing session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Background, layers and composite in the configured image representation.
#[derive(Clone, Debug, Default)]
pub struct EditorImages {
    /// Image the user started from.
    pub background: Option<ImageValue>,
    /// Drawing layers.
    pub layers: Vec<ImageValue>,
    /// Flattened result.
    pub composite: Option<ImageValue>,
}

/// Values accepted and produced by [`ImageEditor`].
#[derive(Clone, Debug)]
pub enum EditorValue {
    /// Full editor state.
    Layered(EditorImages),
    /// A single image, shown as both background and composite.
    Image(ImageValue),
}

impl EditorValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Layered(e) => json!({
                "background": e.background.as_ref().map(ImageValue::summary),
                "layers": e.layers.iter().map(ImageValue::summary).collect::<Vec<_>>(),
                "composite": e.composite.as_ref().map(ImageValue::summary),
            }),
            Self::Image(img) => img.summary(),
        }
    }
}

fn default_image_mode() -> Option<ImageMode> {
    Some(ImageMode::Rgba)
}

fn default_format() -> String {
    "webp".to_string()
}

/// [`ImageEditor`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageEditorOptions {
    /// Representation handed to the function.
    #[serde(rename = "type")]
    pub kind: ImageType,
    /// Color mode every image is converted to.
    #[serde(default = "default_image_mode")]
    pub image_mode: Option<ImageMode>,
    /// Encoding used for returned images.
    #[serde(default = "default_format")]
    pub format: String,
    /// `[width, height]` every image is resized and cropped to.
    pub crop_size: Option<(u32, u32)>,
}

impl Default for ImageEditorOptions {
    fn default() -> Self {
        Self {
            kind: ImageType::Numpy,
            image_mode: default_image_mode(),
            format: default_format(),
            crop_size: None,
        }
    }
}

/// Layered image editor.
#[derive(Clone, Debug)]
pub struct ImageEditor {
    options: ImageEditorOptions,
    codec: ImageCodec,
}

impl Configurable for ImageEditor {
    type Options = ImageEditorOptions;

    fn from_options(options: ImageEditorOptions) -> BindResult<Self> {
        if let Some((w, h)) = options.crop_size
            && (w == 0 || h == 0)
        {
            return Err(BindError::config(format!(
                "`crop_size` must be positive, got ({w}, {h})"
            )));
        }
        let codec = ImageCodec {
            kind: options.kind,
            mode: options.image_mode,
            format: parse_format(&options.format)?,
            crop: options.crop_size,
        };
        Ok(Self { options, codec })
    }
}

impl ImageEditor {
    fn load(&self, cache: &ContentCache, fd: Option<&FileData>) -> BindResult<Option<ImageValue>> {
        fd.filter(|fd| !fd.is_none())
            .map(|fd| self.codec.load(cache, fd))
            .transpose()
    }

    fn store(&self, cache: &ContentCache, v: Option<ImageValue>) -> BindResult<Option<FileData>> {
        v.map(|v| self.codec.store(cache, v)).transpose()
    }
}

impl Component for ImageEditor {
    type Payload = EditorData;
    type Value = EditorValue;
    type Config = ImageEditorOptions;

    fn tag(&self) -> &'static str {
        "imageeditor"
    }

    fn config(&self) -> &ImageEditorOptions {
        &self.options
    }

    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<EditorData>,
    ) -> BindResult<Option<EditorValue>> {
        let Some(data) = payload else {
            return Ok(None);
        };
        let layers = data
            .layers
            .iter()
            .map(|fd| self.codec.load(cache, fd))
            .collect::<BindResult<Vec<_>>>()?;
        Ok(Some(EditorValue::Layered(EditorImages {
            background: self.load(cache, data.background.as_ref())?,
            layers,
            composite: self.load(cache, data.composite.as_ref())?,
        })))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<EditorValue>,
    ) -> BindResult<Option<EditorData>> {
        let Some(value) = value else {
            return Ok(None);
        };
        Ok(Some(match value {
            EditorValue::Image(img) => {
                let fd = self.codec.store(cache, img)?;
                EditorData {
                    background: Some(fd.clone()),
                    layers: vec![],
                    composite: Some(fd),
                    id: None,
                }
            }
            EditorValue::Layered(e) => EditorData {
                background: self.store(cache, e.background)?,
                layers: e
                    .layers
                    .into_iter()
                    .map(|l| self.codec.store(cache, l))
                    .collect::<BindResult<_>>()?,
                composite: self.store(cache, e.composite)?,
                id: None,
            },
        }))
    }

    fn example_payload(&self) -> EditorData {
        EditorData {
            background: Some(example_image_data()),
            layers: vec![],
            composite: Some(example_image_data()),
            id: None,
        }
    }

    fn example_value(&self) -> EditorValue {
        let img = example_image();
        let as_value = || match self.options.kind {
            ImageType::Pil => ImageValue::Decoded(img.clone()),
            _ => ImageValue::Array(ImageArray::from_image(&img)),
        };
        EditorValue::Layered(EditorImages {
            background: Some(as_value()),
            layers: vec![],
            composite: Some(as_value()),
        })
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "background": {"$ref": "FileData"},
                "layers": {"type": "array", "items": {"$ref": "FileData"}},
                "composite": {"$ref": "FileData"},
                "id": {"type": "string"}
            }
        })
    }
}

impl Clearable for ImageEditor {}

#[cfg(test)]
#[path = "../../tests/unit/components/image_editor.rs"]
mod tests;
