//! UI components and the dynamic layer around them.
//!
//! Each component pairs a wire payload with the value a user function sees, and converts between
//! the two in `preprocess` (payload to value) and `postprocess` (value to payload). Files met on
//! either side are written into a [`ContentCache`](crate::cache::store::ContentCache).

/// Image with annotation masks or boxes.
pub mod annotated_image;
/// Audio clips as samples, paths or bytes.
pub mod audio;
/// The component traits and their object-safe form.
pub mod base;
/// Chat histories.
pub mod chatbot;
/// Radio, dropdown and checkbox-group inputs.
pub mod choices;
/// Tables.
pub mod dataframe;
/// File uploads.
pub mod file;
/// Text, number, slider, checkbox and button.
pub mod form;
/// Galleries of images and videos.
pub mod gallery;
/// Text with highlighted spans.
pub mod highlighted_text;
/// Images.
pub mod image;
/// Layered image editor.
pub mod image_editor;
/// Before/after image comparison.
pub mod image_slider;
/// Arbitrary JSON.
pub mod json;
/// Classification labels.
pub mod label;
/// Text with file attachments.
pub mod multimodal;
/// Tag to constructor lookup.
pub mod registry;
/// The closed set of component values.
pub mod value;
/// Videos.
pub mod video;
