use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::cache::store::ContentCache;
use crate::components::value::ComponentValue;
use crate::foundation::error::{BindError, BindResult};

/// Constructor arguments as they arrive from a host or a chat message.
pub type ConstructorArgs = Map<String, Value>;

/// A UI component's data binding: payload schema plus the two conversions around the user function.
///
/// Components are built once per slot from their configuration and then only read; the single
/// side effect of either conversion is writing into the [`ContentCache`].
pub trait Component: Send + Sync {
    /// Wire representation.
    type Payload: Serialize + DeserializeOwned + Clone + Send;
    /// Value handed to and returned from the user function.
    type Value: Send;
    /// Serializable configuration reported by [`Component::get_config`].
    type Config: Serialize;

    /// Stable lowercase type tag.
    fn tag(&self) -> &'static str;

    /// Current configuration.
    fn config(&self) -> &Self::Config;

    /// Validate raw JSON against the payload schema.
    fn decode_payload(&self, raw: Value) -> BindResult<Self::Payload> {
        serde_json::from_value(raw).map_err(|e| {
            BindError::validation(format!("invalid payload for '{}': {e}", self.tag()))
        })
    }

    /// Payload to value. `None` means the client sent nothing.
    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<Self::Payload>,
    ) -> BindResult<Option<Self::Value>>;

    /// Value to payload. `None` yields the component's empty payload (`None` serializes as `null`).
    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<Self::Value>,
    ) -> BindResult<Option<Self::Payload>>;

    /// Minimal payload that `preprocess` accepts.
    fn example_payload(&self) -> Self::Payload;

    /// Minimal value that `postprocess` accepts.
    fn example_value(&self) -> Self::Value;

    /// JSON-schema-like description of the payload.
    fn api_info(&self) -> Value;

    /// `{"name": tag, ...config}`.
    fn get_config(&self) -> Value {
        let mut out = Map::new();
        out.insert("name".to_string(), Value::String(self.tag().to_string()));
        if let Ok(Value::Object(cfg)) = serde_json::to_value(self.config()) {
            out.extend(cfg);
        }
        Value::Object(out)
    }
}

/// Components built from a deserializable configuration struct.
pub trait Configurable: Sized {
    /// Options struct; missing fields take their defaults.
    type Options: DeserializeOwned + Default;

    /// Validate `options` and build the component.
    fn from_options(options: Self::Options) -> BindResult<Self>;

    /// Build from loose constructor arguments.
    fn from_args(args: &ConstructorArgs) -> BindResult<Self> {
        let options = serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| BindError::config(e.to_string()))?;
        Self::from_options(options)
    }
}

/// Object-safe form of [`Component`] working on JSON payloads and [`ComponentValue`]s.
pub trait DynComponent: Send + Sync {
    /// Stable lowercase type tag.
    fn tag(&self) -> &'static str;
    /// Validate a raw payload without converting it.
    fn validate_payload(&self, payload: &Value) -> BindResult<()>;
    /// Decode and preprocess a raw payload; `null` is the absent payload.
    fn preprocess_json(
        &self,
        cache: &ContentCache,
        payload: &Value,
    ) -> BindResult<Option<ComponentValue>>;
    /// Postprocess into a JSON payload.
    fn postprocess_json(
        &self,
        cache: &ContentCache,
        value: Option<ComponentValue>,
    ) -> BindResult<Value>;
    /// [`Component::example_payload`] as JSON.
    fn example_payload_json(&self) -> BindResult<Value>;
    /// [`Component::example_value`] wrapped in [`ComponentValue`].
    fn example_value_dyn(&self) -> ComponentValue;
    /// [`Component::api_info`].
    fn api_info(&self) -> Value;
    /// [`Component::get_config`].
    fn get_config(&self) -> Value;
}

impl<C> DynComponent for C
where
    C: Component,
    C::Value: Into<ComponentValue> + TryFrom<ComponentValue, Error = BindError>,
{
    fn tag(&self) -> &'static str {
        Component::tag(self)
    }

    fn validate_payload(&self, payload: &Value) -> BindResult<()> {
        if payload.is_null() {
            return Ok(());
        }
        self.decode_payload(payload.clone()).map(|_| ())
    }

    fn preprocess_json(
        &self,
        cache: &ContentCache,
        payload: &Value,
    ) -> BindResult<Option<ComponentValue>> {
        let typed = match payload {
            Value::Null => None,
            other => Some(self.decode_payload(other.clone())?),
        };
        Ok(self.preprocess(cache, typed)?.map(Into::into))
    }

    fn postprocess_json(
        &self,
        cache: &ContentCache,
        value: Option<ComponentValue>,
    ) -> BindResult<Value> {
        let typed = value.map(C::Value::try_from).transpose()?;
        let payload = self.postprocess(cache, typed)?;
        serde_json::to_value(payload).map_err(|e| BindError::serde(e.to_string()))
    }

    fn example_payload_json(&self) -> BindResult<Value> {
        serde_json::to_value(self.example_payload()).map_err(|e| BindError::serde(e.to_string()))
    }

    fn example_value_dyn(&self) -> ComponentValue {
        self.example_value().into()
    }

    fn api_info(&self) -> Value {
        Component::api_info(self)
    }

    fn get_config(&self) -> Value {
        Component::get_config(self)
    }
}

/// A `(display name, value)` option of a choice component.
#[derive(Clone, Debug, PartialEq)]
pub struct Choice {
    /// Text shown to the user.
    pub name: String,
    /// Value passed to the function.
    pub value: Value,
}

impl Serialize for Choice {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        (&self.name, &self.value).serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Choice {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Pair(String, Value),
            Plain(Value),
        }
        Ok(match Raw::deserialize(d)? {
            Raw::Pair(name, value) => Self { name, value },
            Raw::Plain(value) => Self {
                name: match &value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                value,
            },
        })
    }
}

/// Components that offer a fixed list of choices.
pub trait HasChoices {
    /// Configured choices.
    fn choices(&self) -> &[Choice];

    /// Values of every choice, in order.
    fn choice_values(&self) -> Vec<Value> {
        self.choices().iter().map(|c| c.value.clone()).collect()
    }

    /// Index of `value` among the choices.
    fn choice_index(&self, value: &Value) -> Option<usize> {
        self.choices().iter().position(|c| &c.value == value)
    }

    /// Fail unless `value` is one of the choices.
    fn check_choice(&self, value: &Value) -> BindResult<usize> {
        self.choice_index(value).ok_or_else(|| {
            BindError::validation(format!(
                "Value: {} is not in the list of choices: {}",
                display_json(value),
                Value::Array(self.choice_values())
            ))
        })
    }
}

/// Components that fire a click event carrying their own value.
pub trait HasClickEvent {
    /// Event names the component emits.
    const EVENTS: &'static [&'static str] = &["click"];

    /// Value delivered to the handler when the component is clicked.
    fn click_value(&self) -> String;
}

/// Components whose empty payload carries meaning for a client (for example, "clear this field").
pub trait Clearable: Component {
    /// Payload sent when the value is cleared.
    fn empty_payload(&self) -> Option<Self::Payload> {
        None
    }
}

/// Render a JSON scalar the way users typed it (strings unquoted).
pub(crate) fn display_json(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serialize `value` to JSON, mapping failures to [`BindError::Serde`].
pub(crate) fn to_json<T: Serialize>(value: &T) -> BindResult<Value> {
    serde_json::to_value(value).map_err(|e| BindError::serde(e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/components/base.rs"]
mod tests;
