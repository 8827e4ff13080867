use serde_json::Value;

use crate::components::annotated_image::AnnotatedValue;
use crate::components::audio::AudioValue;
use crate::components::chatbot::ChatbotValue;
use crate::components::dataframe::DataframeValue;
use crate::components::file::FileValue;
use crate::components::gallery::{self, GalleryValue};
use crate::components::highlighted_text::HighlightedValue;
use crate::components::image::ImageValue;
use crate::components::image_editor::EditorValue;
use crate::components::image_slider::SliderImages;
use crate::components::label::LabelValue;
use crate::components::multimodal::MultimodalValue;
use crate::foundation::error::{BindError, BindResult};

macro_rules! component_values {
    ($($(#[$doc:meta])* $variant:ident($ty:ty)),+ $(,)?) => {
        /// Closed set of values a component can hand to, or accept from, a user function.
        #[derive(Clone, Debug)]
        pub enum ComponentValue {
            $($(#[$doc])* $variant($ty)),+
        }

        impl ComponentValue {
            /// Variant name, used in mismatch messages.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant)),+
                }
            }
        }

        $(
            impl From<$ty> for ComponentValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }

            impl TryFrom<ComponentValue> for $ty {
                type Error = BindError;

                fn try_from(v: ComponentValue) -> BindResult<Self> {
                    match v {
                        ComponentValue::$variant(inner) => Ok(inner),
                        other => Err(BindError::validation(format!(
                            "expected a {} value, got {}",
                            stringify!($variant),
                            other.kind()
                        ))),
                    }
                }
            }
        )+
    };
}

component_values! {
    /// Text, also used for plain file paths.
    Text(String),
    /// Number.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Arbitrary JSON.
    Json(Value),
    /// Several selected choices.
    Choices(Vec<Value>),
    /// Classification result.
    Label(LabelValue),
    /// Highlighted spans.
    Highlighted(HighlightedValue),
    /// Image in one of its representations.
    Image(ImageValue),
    /// Layered editor image.
    Editor(EditorValue),
    /// Before/after image pair.
    Slider(SliderImages),
    /// Image with annotation masks.
    Annotated(AnnotatedValue),
    /// Gallery items.
    Gallery(GalleryValue),
    /// Audio in one of its representations.
    Audio(AudioValue),
    /// One or more files.
    Files(FileValue),
    /// Table in one of its representations.
    Table(DataframeValue),
    /// Chat history.
    Chat(ChatbotValue),
    /// Text with attachments.
    Multimodal(MultimodalValue),
}

impl ComponentValue {
    /// JSON description of the value, for display. Pixel and sample data are reduced to shapes.
    pub fn summary(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Bool(b) => Value::Bool(*b),
            Self::Json(v) => v.clone(),
            Self::Choices(v) => Value::Array(v.clone()),
            Self::Label(v) => v.summary(),
            Self::Highlighted(v) => v.summary(),
            Self::Image(v) => v.summary(),
            Self::Editor(v) => v.summary(),
            Self::Slider(v) => v.summary(),
            Self::Annotated(v) => v.summary(),
            Self::Gallery(v) => gallery::summary(v),
            Self::Audio(v) => v.summary(),
            Self::Files(v) => v.summary(),
            Self::Table(v) => v.summary(),
            Self::Chat(v) => v.summary(),
            Self::Multimodal(v) => v.summary(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/value.rs"]
mod tests;
