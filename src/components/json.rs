use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::components::base::{Component, Configurable};
use crate::foundation::error::{BindError, BindResult};

/// [`Json`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Start with every node expanded.
    pub open: bool,
}

/// Arbitrary JSON, shown as a collapsible tree.
#[derive(Clone, Debug, Default)]
pub struct Json {
    options: JsonOptions,
}

impl Configurable for Json {
    type Options = JsonOptions;

    fn from_options(options: JsonOptions) -> BindResult<Self> {
        Ok(Self { options })
    }
}

impl Component for Json {
    type Payload = Value;
    type Value = Value;
    type Config = JsonOptions;

    fn tag(&self) -> &'static str {
        "json"
    }

    fn config(&self) -> &JsonOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<Value>) -> BindResult<Option<Value>> {
        Ok(payload)
    }

    /// Strings are parsed, so a function may return serialized JSON.
    fn postprocess(&self, _: &ContentCache, value: Option<Value>) -> BindResult<Option<Value>> {
        match value {
            Some(Value::String(s)) => serde_json::from_str(&s).map(Some).map_err(|e| {
                BindError::validation(format!("Json component received a string that is not JSON: {e}"))
            }),
            other => Ok(other),
        }
    }

    fn example_payload(&self) -> Value {
        json!({"foo": "bar"})
    }

    fn example_value(&self) -> Value {
        json!({"foo": "bar"})
    }

    fn api_info(&self) -> Value {
        json!({})
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/json.rs"]
mod tests;
