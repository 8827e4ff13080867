//! Bindery is the data-binding layer between a browser UI and user functions.
//!
//! Every component defines a JSON payload schema and two conversions:
//!
//! - `preprocess` turns a client payload into the value a function receives
//! - `postprocess` turns the function's return value back into a payload
//!
//! Files crossing either boundary are stored in a content-addressed [`ContentCache`], so the
//! same bytes always land at the same path.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Content-addressed file cache and guarded downloads.
pub mod cache;
/// Audio, image, table and video codecs.
pub mod codec;
/// Components and the registry that builds them by tag.
pub mod components;
/// Errors, configuration and option enums.
pub mod foundation;
/// File references and payload traversal.
pub mod payload;

pub use crate::cache::hash::{ContentHasher, HashNamespace};
pub use crate::cache::store::ContentCache;
pub use crate::components::base::{
    Clearable, Component, Configurable, ConstructorArgs, DynComponent,
};
pub use crate::components::registry::ComponentRegistry;
pub use crate::components::value::ComponentValue;
pub use crate::foundation::config::{CacheConfig, UrlPolicy};
pub use crate::foundation::error::{BindError, BindResult};
pub use crate::payload::file_data::FileData;
