/// Convenience result type used across the binding pipeline.
pub type BindResult<T> = Result<T, BindError>;

/// Error taxonomy shared by components, codecs and the content cache.
#[derive(thiserror::Error, Debug)]
pub enum BindError {
    /// A payload or value does not match the shape a component expects.
    #[error("schema validation error: {0}")]
    SchemaValidation(String),

    /// The requested format or codec cannot handle the content and no fallback exists.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Reading or writing file/network content failed.
    #[error("content io error: {0}")]
    ContentIo(String),

    /// A component was constructed with invalid options.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Errors when serializing or deserializing payloads.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BindError {
    /// Build a [`BindError::SchemaValidation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::SchemaValidation(msg.into())
    }

    /// Build a [`BindError::UnsupportedFormat`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`BindError::ContentIo`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::ContentIo(msg.into())
    }

    /// Build a [`BindError::Configuration`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`BindError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors caused by the caller's payload or value.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::SchemaValidation(_))
    }
}

/// Render names as `['a', 'b']`, the list form used in user-facing messages.
pub(crate) fn quoted_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted = items
        .iter()
        .map(|v| format!("'{}'", v.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{quoted}]")
}

/// Message used when an option is not one of its allowed values.
pub(crate) fn invalid_choice_message(param: &str, got: &str, valid: &[&str]) -> String {
    format!(
        "Invalid value for parameter `{param}`: {got}. Please choose from one of: {}",
        quoted_list(valid)
    )
}

/// Build the standard "invalid choice" configuration error.
pub(crate) fn invalid_choice(param: &str, got: &str, valid: &[&str]) -> BindError {
    BindError::config(invalid_choice_message(param, got, valid))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
