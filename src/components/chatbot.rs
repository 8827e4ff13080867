//! The [`Chatbot`] component: chat histories in the `messages` or `tuples` format, with files and
//! other components embedded in messages.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::cache::fetch::is_http_url;
use crate::cache::store::ContentCache;
use crate::components::base::{Clearable, Component, ConstructorArgs, display_json};
use crate::components::registry::ComponentRegistry;
use crate::components::value::ComponentValue;
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult};
use crate::payload::file_data::FileData;

const MESSAGES_FORMAT_ERROR: &str = "Data incompatible with messages format. Each message should be a dictionary with 'role' and 'content' keys or a ChatMessage object.";
const TUPLES_FORMAT_ERROR: &str =
    "Data incompatible with tuples format. Each message should be a list of length 2.";

choice_enum! {
    /// Shape of a chat history.
    pub enum ChatbotType ("type", default = Tuples) {
        /// List of `{role, content}` messages.
        Messages => "messages",
        /// List of `[user, bot]` pairs.
        Tuples => "tuples",
    }
}

/// A file shown in a message.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FileMessage {
    /// The file.
    pub file: FileData,
    /// Text shown when the file cannot be displayed.
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// Another component rendered inside a message.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComponentMessage {
    /// Component tag.
    pub component: String,
    /// The component's payload.
    #[serde(default)]
    pub value: Value,
    /// Arguments the component is constructed with.
    #[serde(default)]
    pub constructor_args: Map<String, Value>,
    /// The component's configuration, `value` included.
    #[serde(default)]
    pub props: Map<String, Value>,
}

/// Content of one message on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Markdown text.
    Text(String),
    /// A file.
    File(FileMessage),
    /// An embedded component.
    Component(ComponentMessage),
}

/// Thought or tool-use annotations of a message.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MessageMetadata {
    /// Title of the thought.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Id used to nest thoughts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Id of the enclosing thought.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Value>,
    /// Subdued text next to the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// `pending` or `done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A clickable option under a message.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatOption {
    /// Value returned when the option is picked.
    pub value: String,
    /// Text shown instead of the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One message of a `messages` history on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// `user`, `assistant` or `system`.
    pub role: String,
    /// Thought annotations.
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    /// Message body.
    pub content: MessageContent,
    /// Clickable options.
    #[serde(default)]
    pub options: Option<Vec<ChatOption>>,
}

impl Message {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            metadata: None,
            content: MessageContent::Text(text.to_string()),
            options: None,
        }
    }
}

/// `[user, bot]` pair of a `tuples` history; either side may be empty.
pub type MessagePair = (Option<MessageContent>, Option<MessageContent>);

/// Wire payload of [`Chatbot`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ChatbotData {
    /// `messages` history.
    Messages(Vec<Message>),
    /// `tuples` history.
    Tuples(Vec<MessagePair>),
}

/// A component inside a message, as seen by the user function.
#[derive(Clone, Debug)]
pub struct EmbeddedComponent {
    /// Component tag.
    pub tag: String,
    /// Constructor arguments, without `value`.
    pub constructor_args: ConstructorArgs,
    /// The component's value.
    pub value: Option<ComponentValue>,
}

/// Content of one message as seen by the user function.
#[derive(Clone, Debug)]
pub enum ChatContent {
    /// Markdown text.
    Text(String),
    /// A file path or URL with optional alt text.
    File {
        /// Local path or URL.
        path: String,
        /// Text shown when the file cannot be displayed.
        alt_text: Option<String>,
    },
    /// An existing file reference.
    FileData(FileData),
    /// An embedded component.
    Component(EmbeddedComponent),
    /// Content already in wire form.
    Wire(MessageContent),
}

/// One message of a `messages` history as seen by the user function.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    /// `user`, `assistant` or `system`.
    pub role: String,
    /// Message body.
    pub content: ChatContent,
    /// Thought annotations.
    pub metadata: Option<MessageMetadata>,
    /// Clickable options.
    pub options: Option<Vec<ChatOption>>,
}

impl ChatMessage {
    /// Message without metadata or options.
    pub fn new(role: impl Into<String>, content: ChatContent) -> Self {
        Self {
            role: role.into(),
            content,
            metadata: None,
            options: None,
        }
    }
}

/// Values accepted and produced by [`Chatbot`].
#[derive(Clone, Debug)]
pub enum ChatbotValue {
    /// `messages` history.
    Messages(Vec<ChatMessage>),
    /// `tuples` history; every entry must hold exactly two items.
    Tuples(Vec<Vec<Option<ChatContent>>>),
    /// JSON history: `{role, content}` objects or `[user, bot]` lists, with contents given as
    /// strings, `{path, alt_text}` objects or `[path, alt_text]` lists.
    Raw(Value),
}

impl ChatbotValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Messages(msgs) => Value::Array(
                msgs.iter()
                    .map(|m| json!({"role": m.role, "content": content_summary(&m.content)}))
                    .collect(),
            ),
            Self::Tuples(pairs) => Value::Array(
                pairs
                    .iter()
                    .map(|p| {
                        Value::Array(
                            p.iter()
                                .map(|c| c.as_ref().map_or(Value::Null, content_summary))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
            Self::Raw(v) => v.clone(),
        }
    }
}

fn content_summary(c: &ChatContent) -> Value {
    match c {
        ChatContent::Text(s) => json!(s),
        ChatContent::File {
            path,
            alt_text: Some(alt),
        } => json!([path, alt]),
        ChatContent::File { path, .. } => json!([path]),
        ChatContent::FileData(fd) => json!({"path": fd.path}),
        ChatContent::Component(e) => json!({
            "component": e.tag,
            "value": e.value.as_ref().map(ComponentValue::summary),
        }),
        ChatContent::Wire(m) => serde_json::to_value(m).unwrap_or(Value::Null),
    }
}

/// Dedent a docstring-like text: strip the first line's leading whitespace, remove the common
/// indentation of the other lines, then drop blank lines at both ends.
pub fn cleandoc(doc: &str) -> String {
    let mut lines = doc.split('\n');
    let first = lines.next().unwrap_or_default().trim_start();
    let rest: Vec<&str> = lines.collect();
    let margin = rest
        .iter()
        .filter_map(|l| {
            let content = l.trim_start().chars().count();
            (content > 0).then(|| l.chars().count() - content)
        })
        .min()
        .unwrap_or(0);

    let mut out = Vec::with_capacity(rest.len() + 1);
    out.push(first.to_string());
    out.extend(rest.iter().map(|l| l.chars().skip(margin).collect::<String>()));
    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    let start = out.iter().position(|l| !l.is_empty()).unwrap_or(out.len());
    out[start..].join("\n")
}

/// Fail unless every entry of a history has the shape `format` requires.
pub fn check_format(history: &[Value], format: ChatbotType) -> BindResult<()> {
    let ok = match format {
        ChatbotType::Messages => history.iter().all(|m| {
            m.as_object()
                .is_some_and(|o| o.contains_key("role") && o.contains_key("content"))
        }),
        ChatbotType::Tuples => history
            .iter()
            .all(|m| m.as_array().is_some_and(|pair| pair.len() == 2)),
    };
    if ok {
        Ok(())
    } else {
        Err(format_error(format))
    }
}

fn format_error(format: ChatbotType) -> BindError {
    BindError::validation(match format {
        ChatbotType::Messages => MESSAGES_FORMAT_ERROR,
        ChatbotType::Tuples => TUPLES_FORMAT_ERROR,
    })
}

fn invalid_message(v: &Value) -> BindError {
    BindError::validation(format!("Invalid message for Chatbot component: {v}"))
}

/// Content of a JSON history entry.
fn raw_content(v: &Value) -> BindResult<Option<ChatContent>> {
    let decode = |v: &Value| {
        serde_json::from_value::<MessageContent>(v.clone()).map_err(|_| invalid_message(v))
    };
    Ok(Some(match v {
        Value::Null => return Ok(None),
        Value::String(s) => ChatContent::Text(s.clone()),
        Value::Object(o) if o.contains_key("component") || o.contains_key("file") => {
            ChatContent::Wire(decode(v)?)
        }
        Value::Object(o) => match o.get("path") {
            Some(path) => ChatContent::File {
                path: display_json(path),
                alt_text: o.get("alt_text").and_then(Value::as_str).map(str::to_string),
            },
            None => return Err(invalid_message(v)),
        },
        Value::Array(items) if !items.is_empty() => ChatContent::File {
            path: display_json(&items[0]),
            alt_text: items.get(1).and_then(Value::as_str).map(str::to_string),
        },
        other => return Err(invalid_message(other)),
    }))
}

fn optional_field<T: serde::de::DeserializeOwned>(
    o: &Map<String, Value>,
    key: &str,
) -> BindResult<Option<T>> {
    match o.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| BindError::validation(format!("invalid message {key}: {e}"))),
    }
}

fn empty_data(format: ChatbotType) -> ChatbotData {
    match format {
        ChatbotType::Messages => ChatbotData::Messages(vec![]),
        ChatbotType::Tuples => ChatbotData::Tuples(vec![]),
    }
}

/// [`Chatbot`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChatbotOptions {
    /// History format; unset falls back to the deprecated `tuples`.
    #[serde(rename = "type")]
    pub kind: Option<ChatbotType>,
    /// Show a copy button on messages.
    pub show_copy_button: bool,
}

/// Chat history display.
#[derive(Clone, Debug)]
pub struct Chatbot {
    options: ChatbotOptions,
    format: ChatbotType,
    registry: Arc<ComponentRegistry>,
}

impl Chatbot {
    /// Validate `options`; embedded components are resolved through `registry`.
    pub fn from_options(
        mut options: ChatbotOptions,
        registry: Arc<ComponentRegistry>,
    ) -> BindResult<Self> {
        let format = match options.kind {
            None => {
                tracing::warn!(
                    "no `type` given for the chatbot; defaulting to the deprecated 'tuples' format, set type='messages' to use role/content dictionaries"
                );
                ChatbotType::Tuples
            }
            Some(ChatbotType::Tuples) => {
                tracing::warn!(
                    "the 'tuples' chatbot format is deprecated, set type='messages' to use role/content dictionaries"
                );
                ChatbotType::Tuples
            }
            Some(ChatbotType::Messages) => ChatbotType::Messages,
        };
        options.kind = Some(format);
        Ok(Self {
            options,
            format,
            registry,
        })
    }

    /// Build from loose constructor arguments.
    pub fn from_args(args: &ConstructorArgs, registry: Arc<ComponentRegistry>) -> BindResult<Self> {
        let options = serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| BindError::config(e.to_string()))?;
        Self::from_options(options, registry)
    }

    /// History format in use.
    pub fn format(&self) -> ChatbotType {
        self.format
    }

    fn preprocess_content(
        &self,
        cache: &ContentCache,
        content: &MessageContent,
    ) -> BindResult<ChatContent> {
        Ok(match content {
            MessageContent::Text(s) => ChatContent::Text(s.clone()),
            MessageContent::File(fm) => ChatContent::File {
                path: fm.file.materialize(cache)?.to_string_lossy().into_owned(),
                alt_text: fm.alt_text.clone(),
            },
            MessageContent::Component(cm) => {
                if !self.registry.contains(&cm.component) {
                    return Err(BindError::validation(format!(
                        "Invalid component for Chatbot component: {}",
                        cm.component
                    )));
                }
                let mut args = cm.constructor_args.clone();
                args.remove("value");
                let component = self.registry.create(&cm.component, &args)?;
                ChatContent::Component(EmbeddedComponent {
                    tag: component.tag().to_string(),
                    value: component.preprocess_json(cache, &cm.value)?,
                    constructor_args: args,
                })
            }
        })
    }

    fn postprocess_content(
        &self,
        cache: &ContentCache,
        content: ChatContent,
    ) -> BindResult<MessageContent> {
        Ok(match content {
            ChatContent::Text(s) => MessageContent::Text(cleandoc(&s)),
            ChatContent::File { path, alt_text } => MessageContent::File(FileMessage {
                file: reference_file(cache, &path)?,
                alt_text,
            }),
            ChatContent::FileData(file) => MessageContent::File(FileMessage {
                file,
                alt_text: None,
            }),
            ChatContent::Component(e) => {
                let mut args = e.constructor_args;
                args.remove("value");
                let component = self.registry.create(&e.tag, &args)?;
                let payload = component.postprocess_json(cache, e.value)?;
                let mut props = match component.get_config() {
                    Value::Object(m) => m,
                    _ => Map::new(),
                };
                props.insert("value".to_string(), payload.clone());
                MessageContent::Component(ComponentMessage {
                    component: component.tag().to_string(),
                    value: payload,
                    constructor_args: args,
                    props,
                })
            }
            ChatContent::Wire(m) => m,
        })
    }

    fn postprocess_message(
        &self,
        cache: &ContentCache,
        message: ChatMessage,
    ) -> BindResult<Message> {
        Ok(Message {
            role: message.role,
            metadata: message.metadata,
            content: self.postprocess_content(cache, message.content)?,
            options: message.options,
        })
    }

    /// Turn a JSON history into a typed one, checking its shape first.
    fn parse_raw(&self, raw: Value) -> BindResult<ChatbotValue> {
        let Value::Array(history) = raw else {
            return Err(format_error(self.format));
        };
        check_format(&history, self.format)?;
        match self.format {
            ChatbotType::Tuples => history
                .iter()
                .map(|pair| {
                    pair.as_array()
                        .map(|items| items.iter().map(raw_content).collect::<BindResult<Vec<_>>>())
                        .unwrap_or_else(|| Err(format_error(ChatbotType::Tuples)))
                })
                .collect::<BindResult<_>>()
                .map(ChatbotValue::Tuples),
            ChatbotType::Messages => history
                .iter()
                .map(|m| -> BindResult<ChatMessage> {
                    let o = m.as_object().ok_or_else(|| format_error(ChatbotType::Messages))?;
                    let content = o
                        .get("content")
                        .map(raw_content)
                        .transpose()?
                        .flatten()
                        .ok_or_else(|| invalid_message(m))?;
                    Ok(ChatMessage {
                        role: o.get("role").map(display_json).unwrap_or_default(),
                        content,
                        metadata: optional_field(o, "metadata")?,
                        options: optional_field(o, "options")?,
                    })
                })
                .collect::<BindResult<_>>()
                .map(ChatbotValue::Messages),
        }
    }
}

/// Reference a file for display: URLs stay remote, local files are copied into the cache.
fn reference_file(cache: &ContentCache, path: &str) -> BindResult<FileData> {
    if is_http_url(path) {
        return Ok(FileData::from_url(path));
    }
    Ok(FileData::from_path(&cache.save_file(Path::new(path))?))
}

impl Component for Chatbot {
    type Payload = ChatbotData;
    type Value = ChatbotValue;
    type Config = ChatbotOptions;

    fn tag(&self) -> &'static str {
        "chatbot"
    }

    fn config(&self) -> &ChatbotOptions {
        &self.options
    }

    /// The history shape is checked against the configured format before decoding.
    fn decode_payload(&self, raw: Value) -> BindResult<ChatbotData> {
        let Value::Array(history) = &raw else {
            return Err(format_error(self.format));
        };
        check_format(history, self.format)?;
        let decoded = match self.format {
            ChatbotType::Messages => serde_json::from_value(raw).map(ChatbotData::Messages),
            ChatbotType::Tuples => serde_json::from_value(raw).map(ChatbotData::Tuples),
        };
        decoded.map_err(|e| BindError::validation(format!("invalid payload for 'chatbot': {e}")))
    }

    fn preprocess(
        &self,
        cache: &ContentCache,
        payload: Option<ChatbotData>,
    ) -> BindResult<Option<ChatbotValue>> {
        let payload = payload.unwrap_or_else(|| empty_data(self.format));
        Ok(Some(match (payload, self.format) {
            (ChatbotData::Tuples(pairs), ChatbotType::Tuples) => ChatbotValue::Tuples(
                pairs
                    .iter()
                    .map(|(user, bot)| {
                        [user, bot]
                            .into_iter()
                            .map(|c| {
                                c.as_ref()
                                    .map(|c| self.preprocess_content(cache, c))
                                    .transpose()
                            })
                            .collect::<BindResult<Vec<_>>>()
                    })
                    .collect::<BindResult<_>>()?,
            ),
            (ChatbotData::Messages(msgs), ChatbotType::Messages) => ChatbotValue::Messages(
                msgs.into_iter()
                    .map(|m| -> BindResult<ChatMessage> {
                        Ok(ChatMessage {
                            content: self.preprocess_content(cache, &m.content)?,
                            role: m.role,
                            metadata: m.metadata,
                            options: m.options,
                        })
                    })
                    .collect::<BindResult<_>>()?,
            ),
            (ChatbotData::Messages(m), ChatbotType::Tuples) if m.is_empty() => {
                ChatbotValue::Tuples(vec![])
            }
            (ChatbotData::Tuples(t), ChatbotType::Messages) if t.is_empty() => {
                ChatbotValue::Messages(vec![])
            }
            (_, ChatbotType::Tuples) => {
                return Err(BindError::validation("Data incompatible with the tuples format"));
            }
            (_, ChatbotType::Messages) => {
                return Err(BindError::validation(
                    "Data incompatible with the messages format",
                ));
            }
        }))
    }

    fn postprocess(
        &self,
        cache: &ContentCache,
        value: Option<ChatbotValue>,
    ) -> BindResult<Option<ChatbotData>> {
        let value = match value {
            None => return Ok(self.empty_payload()),
            Some(ChatbotValue::Raw(raw)) => self.parse_raw(raw)?,
            Some(v) => v,
        };
        Ok(Some(match (value, self.format) {
            (ChatbotValue::Tuples(pairs), ChatbotType::Tuples) => {
                let mut out = Vec::with_capacity(pairs.len());
                for pair in pairs {
                    let Ok([user, bot]) = <[Option<ChatContent>; 2]>::try_from(pair) else {
                        return Err(format_error(ChatbotType::Tuples));
                    };
                    let side = |c: Option<ChatContent>| {
                        c.map(|c| self.postprocess_content(cache, c)).transpose()
                    };
                    out.push((side(user)?, side(bot)?));
                }
                ChatbotData::Tuples(out)
            }
            (ChatbotValue::Messages(msgs), ChatbotType::Messages) => ChatbotData::Messages(
                msgs.into_iter()
                    .map(|m| self.postprocess_message(cache, m))
                    .collect::<BindResult<_>>()?,
            ),
            (ChatbotValue::Messages(m), ChatbotType::Tuples) if m.is_empty() => {
                ChatbotData::Tuples(vec![])
            }
            (ChatbotValue::Tuples(t), ChatbotType::Messages) if t.is_empty() => {
                ChatbotData::Messages(vec![])
            }
            (_, format) => return Err(format_error(format)),
        }))
    }

    fn example_payload(&self) -> ChatbotData {
        match self.format {
            ChatbotType::Messages => ChatbotData::Messages(vec![
                Message::text("user", "Hello!"),
                Message::text("assistant", "How can I help you?"),
            ]),
            ChatbotType::Tuples => ChatbotData::Tuples(vec![(
                Some(MessageContent::Text("Hello!".to_string())),
                None,
            )]),
        }
    }

    fn example_value(&self) -> ChatbotValue {
        let text = |s: &str| ChatContent::Text(s.to_string());
        match self.format {
            ChatbotType::Messages => ChatbotValue::Messages(vec![
                ChatMessage::new("user", text("Hello!")),
                ChatMessage::new("assistant", text("How can I help you?")),
            ]),
            ChatbotType::Tuples => ChatbotValue::Tuples(vec![vec![Some(text("Hello!")), None]]),
        }
    }

    fn api_info(&self) -> Value {
        let content = json!({
            "anyOf": [
                {"type": "string"},
                {"$ref": "FileMessage"},
                {"$ref": "ComponentMessage"}
            ]
        });
        match self.format {
            ChatbotType::Messages => json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "role": {"type": "string"},
                        "metadata": {"type": ["object", "null"]},
                        "content": content,
                        "options": {"type": ["array", "null"]}
                    },
                    "required": ["role", "content"]
                }
            }),
            ChatbotType::Tuples => json!({
                "type": "array",
                "items": {
                    "type": "array",
                    "minItems": 2,
                    "maxItems": 2,
                    "items": {"anyOf": [content, {"type": "null"}]}
                }
            }),
        }
    }
}

impl Clearable for Chatbot {
    fn empty_payload(&self) -> Option<ChatbotData> {
        Some(empty_data(self.format))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/chatbot.rs"]
mod tests;
