use serde_json::{Map, Value, json};

use crate::cache::store::ContentCache;
use crate::components::base::{Component, Configurable};
use crate::foundation::error::{BindError, BindResult};

/// One highlighted span on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HighlightedToken {
    /// Span text.
    pub token: String,
    /// Class name, confidence, or `null` for unhighlighted text.
    #[serde(default)]
    pub class_or_confidence: Option<Value>,
}

/// A named entity located by character offsets.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entity {
    /// Entity class.
    #[serde(alias = "entity_group")]
    pub entity: String,
    /// First character, inclusive.
    pub start: usize,
    /// Last character, exclusive.
    pub end: usize,
}

/// Values accepted and produced by [`HighlightedText`].
#[derive(Clone, Debug, PartialEq)]
pub enum HighlightedValue {
    /// `(text, class)` spans in order.
    Spans(Vec<(String, Option<Value>)>),
    /// Whole text plus entity offsets, as produced by NER pipelines.
    Entities {
        /// Source text.
        text: String,
        /// Entities, in any order.
        entities: Vec<Entity>,
    },
}

impl HighlightedValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Spans(spans) => json!(spans),
            Self::Entities { text, entities } => json!({"text": text, "entities": entities}),
        }
    }
}

/// [`HighlightedText`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HighlightedTextOptions {
    /// Merge neighbouring spans that share a class.
    pub combine_adjacent: bool,
    /// Inserted between merged spans.
    pub adjacent_separator: String,
    /// Class to CSS color.
    pub color_map: Option<Map<String, Value>>,
    /// Show the class legend.
    pub show_legend: bool,
}

impl Default for HighlightedTextOptions {
    fn default() -> Self {
        Self {
            combine_adjacent: false,
            adjacent_separator: String::new(),
            color_map: None,
            show_legend: false,
        }
    }
}

/// Text with highlighted spans.
#[derive(Clone, Debug, Default)]
pub struct HighlightedText {
    options: HighlightedTextOptions,
}

impl Configurable for HighlightedText {
    type Options = HighlightedTextOptions;

    fn from_options(options: HighlightedTextOptions) -> BindResult<Self> {
        Ok(Self { options })
    }
}

/// Cut `text` into plain and entity spans.
fn split_entities(text: &str, entities: &[Entity]) -> BindResult<Vec<(String, Option<Value>)>> {
    let chars: Vec<char> = text.chars().collect();
    let slice = |a: usize, b: usize| chars[a..b].iter().collect::<String>();
    let mut sorted: Vec<&Entity> = entities.iter().collect();
    sorted.sort_by_key(|e| e.start);

    let mut out = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = 0;
    for e in sorted {
        if e.start < cursor || e.end < e.start || e.end > chars.len() {
            return Err(BindError::validation(format!(
                "entity '{}' spans {}..{} which overlaps another entity or falls outside the text ({} characters)",
                e.entity,
                e.start,
                e.end,
                chars.len()
            )));
        }
        out.push((slice(cursor, e.start), None));
        out.push((slice(e.start, e.end), Some(Value::String(e.entity.clone()))));
        cursor = e.end;
    }
    out.push((slice(cursor, chars.len()), None));
    Ok(out)
}

impl HighlightedText {
    fn combine(&self, spans: Vec<(String, Option<Value>)>) -> Vec<(String, Option<Value>)> {
        let mut out = Vec::new();
        let mut running: Option<(String, Option<Value>)> = None;
        for (text, class) in spans {
            if let Some((acc, cur)) = running.as_mut()
                && *cur == class
            {
                acc.push_str(&self.options.adjacent_separator);
                acc.push_str(&text);
                continue;
            }
            if running.is_some() && text.is_empty() {
                continue;
            }
            out.extend(running.replace((text, class)));
        }
        out.extend(running);
        out
    }
}

impl Component for HighlightedText {
    type Payload = Vec<HighlightedToken>;
    type Value = HighlightedValue;
    type Config = HighlightedTextOptions;

    fn tag(&self) -> &'static str {
        "highlightedtext"
    }

    fn config(&self) -> &HighlightedTextOptions {
        &self.options
    }

    fn preprocess(
        &self,
        _: &ContentCache,
        payload: Option<Vec<HighlightedToken>>,
    ) -> BindResult<Option<HighlightedValue>> {
        Ok(payload.map(|tokens| {
            HighlightedValue::Spans(
                tokens
                    .into_iter()
                    .map(|t| (t.token, t.class_or_confidence))
                    .collect(),
            )
        }))
    }

    fn postprocess(
        &self,
        _: &ContentCache,
        value: Option<HighlightedValue>,
    ) -> BindResult<Option<Vec<HighlightedToken>>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let spans = match value {
            HighlightedValue::Spans(spans) => spans,
            HighlightedValue::Entities { text, entities } => split_entities(&text, &entities)?,
        };
        let spans = if self.options.combine_adjacent {
            self.combine(spans)
        } else {
            spans
        };
        Ok(Some(
            spans
                .into_iter()
                .map(|(token, class_or_confidence)| HighlightedToken {
                    token,
                    class_or_confidence,
                })
                .collect(),
        ))
    }

    fn example_payload(&self) -> Vec<HighlightedToken> {
        vec![
            HighlightedToken {
                token: "The".into(),
                class_or_confidence: None,
            },
            HighlightedToken {
                token: "quick".into(),
                class_or_confidence: Some(json!("adj")),
            },
        ]
    }

    fn example_value(&self) -> HighlightedValue {
        HighlightedValue::Spans(vec![
            ("The".into(), None),
            ("quick".into(), Some(json!("adj"))),
        ])
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "token": {"type": "string"},
                    "class_or_confidence": {"type": ["string", "number", "null"]}
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/highlighted_text.rs"]
mod tests;
