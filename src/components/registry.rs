use std::collections::BTreeMap;
use std::sync::Arc;

use crate::components::annotated_image::AnnotatedImage;
use crate::components::audio::Audio;
use crate::components::base::{Configurable, ConstructorArgs, DynComponent};
use crate::components::chatbot::Chatbot;
use crate::components::choices::{CheckboxGroup, Dropdown, Radio};
use crate::components::dataframe::Dataframe;
use crate::components::file::File;
use crate::components::form::{Button, Checkbox, Number, Slider, Textbox};
use crate::components::gallery::Gallery;
use crate::components::highlighted_text::HighlightedText;
use crate::components::image::Image;
use crate::components::image_editor::ImageEditor;
use crate::components::image_slider::ImageSlider;
use crate::components::json::Json;
use crate::components::label::Label;
use crate::components::multimodal::MultimodalTextbox;
use crate::components::video::Video;
use crate::foundation::error::{BindError, BindResult};

/// Builds a component from loose constructor arguments.
pub type Factory = Arc<dyn Fn(&ConstructorArgs) -> BindResult<Box<dyn DynComponent>> + Send + Sync>;

fn normalize(tag: &str) -> String {
    tag.trim().to_ascii_lowercase()
}

fn build<C>(args: &ConstructorArgs) -> BindResult<Box<dyn DynComponent>>
where
    C: Configurable + DynComponent + 'static,
{
    Ok(Box::new(C::from_args(args)?))
}

/// Tag to factory map. Tags are matched case-insensitively.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, Factory>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl ComponentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `tag`, replacing any previous entry.
    pub fn register<F>(&mut self, tag: &str, factory: F) -> &mut Self
    where
        F: Fn(&ConstructorArgs) -> BindResult<Box<dyn DynComponent>> + Send + Sync + 'static,
    {
        self.factories.insert(normalize(tag), Arc::new(factory));
        self
    }

    /// Register a component built through [`Configurable::from_args`].
    pub fn register_configurable<C>(&mut self, tag: &str) -> &mut Self
    where
        C: Configurable + DynComponent + 'static,
    {
        self.register(tag, build::<C>)
    }

    /// Every built-in component except `chatbot`.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        r.register_configurable::<Textbox>("textbox")
            .register_configurable::<MultimodalTextbox>("multimodaltextbox")
            .register_configurable::<Number>("number")
            .register_configurable::<Slider>("slider")
            .register_configurable::<Checkbox>("checkbox")
            .register_configurable::<Button>("button")
            .register_configurable::<Radio>("radio")
            .register_configurable::<Dropdown>("dropdown")
            .register_configurable::<CheckboxGroup>("checkboxgroup")
            .register_configurable::<Json>("json")
            .register_configurable::<Label>("label")
            .register_configurable::<HighlightedText>("highlightedtext")
            .register_configurable::<File>("file")
            .register_configurable::<Image>("image")
            .register_configurable::<Audio>("audio")
            .register_configurable::<Video>("video")
            .register_configurable::<Gallery>("gallery")
            .register_configurable::<ImageEditor>("imageeditor")
            .register_configurable::<ImageSlider>("imageslider")
            .register_configurable::<AnnotatedImage>("annotatedimage")
            .register_configurable::<Dataframe>("dataframe");
        r
    }

    /// Add `chatbot`, resolving embedded components against a snapshot of the current entries.
    pub fn with_chatbot(mut self) -> Self {
        let snapshot = Arc::new(self.clone());
        self.register("chatbot", move |args| {
            let chatbot: Box<dyn DynComponent> =
                Box::new(Chatbot::from_args(args, Arc::clone(&snapshot))?);
            Ok(chatbot)
        });
        self
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Return `true` when `tag` is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(&normalize(tag))
    }

    /// Build the component registered under `tag`.
    #[tracing::instrument(level = "debug", skip(self, args))]
    pub fn create(&self, tag: &str, args: &ConstructorArgs) -> BindResult<Box<dyn DynComponent>> {
        let factory = self.factories.get(&normalize(tag)).ok_or_else(|| {
            BindError::config(format!(
                "unknown component '{tag}'; registered: {}",
                self.tags().join(", ")
            ))
        })?;
        factory(args)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/registry.rs"]
mod tests;
