use std::path::Path;

use rayon::prelude::*;
use serde_json::{Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::filename::{is_mime_category, mime_for_path};
use crate::cache::store::ContentCache;
use crate::codec::base64::encode_data_url;
use crate::codec::image::{ImageArray, is_svg, parse_format};
use crate::components::base::{Component, Configurable};
use crate::components::file::is_valid_file;
use crate::components::image::{
    ImageCodec, ImageType, ImageValue, SVG_MIME, example_image, example_image_data,
    reference_image_path,
};
use crate::foundation::error::{BindError, BindResult, quoted_list};
use crate::payload::file_data::FileData;

/// One gallery entry on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum GalleryItem {
    /// An image.
    Image {
        /// Image file.
        image: FileData,
        /// Caption under the thumbnail.
        #[serde(default)]
        caption: Option<String>,
    },
    /// A video.
    Video {
        /// Video file.
        video: FileData,
        /// Caption under the thumbnail.
        #[serde(default)]
        caption: Option<String>,
    },
}

/// Media of one gallery entry.
#[derive(Clone, Debug)]
pub enum GalleryMedia {
    /// An image in any representation; paths to videos are detected by MIME type.
    Image(ImageValue),
    /// Path or URL of a video.
    Video(String),
}

/// One gallery entry handed to or returned from the user function.
#[derive(Clone, Debug)]
pub struct GalleryEntry {
    /// Image or video.
    pub media: GalleryMedia,
    /// Optional caption.
    pub caption: Option<String>,
}

/// Values accepted and produced by [`Gallery`].
pub type GalleryValue = Vec<GalleryEntry>;

pub(crate) fn summary(value: &GalleryValue) -> Value {
    Value::Array(
        value
            .iter()
            .map(|e| {
                let media = match &e.media {
                    GalleryMedia::Image(img) => img.summary(),
                    GalleryMedia::Video(p) => json!({"video": p}),
                };
                json!([media, e.caption])
            })
            .collect(),
    )
}

fn default_format() -> String {
    "webp".to_string()
}

/// [`Gallery`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GalleryOptions {
    /// Representation images are handed to the function in; videos are always paths.
    #[serde(rename = "type")]
    pub kind: ImageType,
    /// Encoding used for returned arrays and decoded images.
    #[serde(default = "default_format")]
    pub format: String,
    /// Accepted extensions or MIME categories.
    pub file_types: Option<Vec<String>>,
    /// Grid columns.
    pub columns: Option<u32>,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            kind: ImageType::Filepath,
            format: default_format(),
            file_types: None,
            columns: None,
        }
    }
}

/// Grid of images and videos with captions.
#[derive(Clone, Debug)]
pub struct Gallery {
    options: GalleryOptions,
    codec: ImageCodec,
}

impl Configurable for Gallery {
    type Options = GalleryOptions;

    fn from_options(options: GalleryOptions) -> BindResult<Self> {
        let codec = ImageCodec {
            kind: options.kind,
            mode: None,
            format: parse_format(&options.format)?,
            crop: None,
        };
        Ok(Self { options, codec })
    }
}

impl Gallery {
    fn check_type(&self, fd: &FileData) -> BindResult<()> {
        let Some(types) = &self.options.file_types else {
            return Ok(());
        };
        let name = fd.display_name().unwrap_or_else(|| fd.path.clone());
        if is_valid_file(&name, types) {
            return Ok(());
        }
        Err(BindError::validation(format!(
            "Invalid file type. Please upload a file that is one of these formats: {}",
            quoted_list(types)
        )))
    }

    fn load(&self, cache: &ContentCache, item: &GalleryItem) -> BindResult<GalleryEntry> {
        Ok(match item {
            GalleryItem::Video { video, caption } => {
                self.check_type(video)?;
                let path = video.materialize(cache)?;
                GalleryEntry {
                    media: GalleryMedia::Video(path.to_string_lossy().into_owned()),
                    caption: caption.clone(),
                }
            }
            GalleryItem::Image { image, caption } => {
                self.check_type(image)?;
                GalleryEntry {
                    media: GalleryMedia::Image(self.codec.load(cache, image)?),
                    caption: caption.clone(),
                }
            }
        })
    }

    fn save(&self, cache: &ContentCache, entry: GalleryEntry) -> BindResult<GalleryItem> {
        let caption = entry.caption;
        let path = match entry.media {
            GalleryMedia::Video(p) => {
                return Ok(GalleryItem::Video {
                    video: reference_media(cache, &p)?,
                    caption,
                });
            }
            GalleryMedia::Image(ImageValue::Path(p)) => p,
            GalleryMedia::Image(other) => {
                return Ok(GalleryItem::Image {
                    image: self.codec.store(cache, other)?,
                    caption,
                });
            }
        };

        if is_svg(&path) && !is_http_url(&path) {
            let content = std::fs::read(&path)
                .map_err(|e| BindError::io(format!("read svg '{path}': {e}")))?;
            let name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image.svg".to_string());
            let image = FileData::inline(encode_data_url(&content, SVG_MIME), &name)
                .with_mime_type(SVG_MIME);
            return Ok(GalleryItem::Image { image, caption });
        }
        let fd = reference_image_path(cache, &path)?;
        if is_mime_category(fd.mime_type.as_deref(), "video") {
            Ok(GalleryItem::Video { video: fd, caption })
        } else {
            Ok(GalleryItem::Image { image: fd, caption })
        }
    }
}

fn reference_media(cache: &ContentCache, path: &str) -> BindResult<FileData> {
    if is_http_url(path) {
        return Ok(FileData::from_url(path));
    }
    let cached = cache.save_file(Path::new(path))?;
    let mut fd = FileData::from_path(&cached);
    fd.mime_type = fd.mime_type.or_else(|| mime_for_path(path));
    Ok(fd)
}

impl Component for Gallery {
    type Payload = Vec<GalleryItem>;
    type Value = GalleryValue;
    type Config = GalleryOptions;

    fn tag(&self) -> &'static str {
        "gallery"
    }

    fn config(&self) -> &GalleryOptions {
        &self.options
    }

    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<Vec<GalleryItem>>,
    ) -> BindResult<Option<GalleryValue>> {
        let Some(items) = payload.filter(|items| !items.is_empty()) else {
            return Ok(None);
        };
        items
            .iter()
            .map(|item| self.load(cache, item))
            .collect::<BindResult<Vec<_>>>()
            .map(Some)
    }

    /// Entries are written in parallel; the output keeps the input order.
    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<GalleryValue>,
    ) -> BindResult<Option<Vec<GalleryItem>>> {
        let Some(entries) = value else {
            return Ok(Some(vec![]));
        };
        let saved = entries
            .into_par_iter()
            .map(|entry| self.save(cache, entry))
            .collect::<Vec<_>>();
        let mut out = Vec::with_capacity(saved.len());
        for item in saved {
            out.push(item?);
        }
        Ok(Some(out))
    }

    fn example_payload(&self) -> Vec<GalleryItem> {
        vec![GalleryItem::Image {
            image: example_image_data(),
            caption: None,
        }]
    }

    fn example_value(&self) -> GalleryValue {
        vec![GalleryEntry {
            media: GalleryMedia::Image(ImageValue::Array(ImageArray::from_image(
                &example_image(),
            ))),
            caption: Some("example".to_string()),
        }]
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "image": {"$ref": "FileData"},
                    "video": {"$ref": "FileData"},
                    "caption": {"type": ["string", "null"]}
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/gallery.rs"]
mod tests;
