use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::components::base::{Component, Configurable, display_json};
use crate::components::form::format_number;
use crate::foundation::error::BindResult;

/// One class and its confidence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LabelConfidence {
    /// Class name.
    pub label: String,
    /// Confidence, usually in `[0, 1]`.
    pub confidence: f64,
}

/// Wire payload of [`Label`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LabelData {
    /// Top class, or a free-form label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    /// Classes sorted by descending confidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidences: Option<Vec<LabelConfidence>>,
}

/// Values accepted and produced by [`Label`].
#[derive(Clone, Debug, PartialEq)]
pub enum LabelValue {
    /// A plain label.
    Text(String),
    /// A numeric label, shown as text.
    Number(f64),
    /// Ordered `(class, confidence)` pairs.
    Confidences(Vec<LabelConfidence>),
    /// Class to confidence.
    Map(BTreeMap<String, f64>),
}

impl LabelValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Text(s) => json!(s),
            Self::Number(n) => json!(n),
            Self::Confidences(c) => json!(c),
            Self::Map(m) => json!(m),
        }
    }
}

/// [`Label`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LabelOptions {
    /// Keep only this many classes.
    pub num_top_classes: Option<usize>,
    /// Display color of the confidence bars.
    pub color: Option<String>,
}

/// Classification result.
#[derive(Clone, Debug, Default)]
pub struct Label {
    options: LabelOptions,
}

impl Configurable for Label {
    type Options = LabelOptions;

    fn from_options(options: LabelOptions) -> BindResult<Self> {
        Ok(Self { options })
    }
}

impl Label {
    fn ranked(&self, mut pairs: Vec<LabelConfidence>) -> LabelData {
        pairs.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        if let Some(n) = self.options.num_top_classes {
            pairs.truncate(n);
        }
        LabelData {
            label: pairs.first().map(|p| json!(p.label)),
            confidences: Some(pairs),
        }
    }
}

impl Component for Label {
    type Payload = LabelData;
    type Value = LabelValue;
    type Config = LabelOptions;

    fn tag(&self) -> &'static str {
        "label"
    }

    fn config(&self) -> &LabelOptions {
        &self.options
    }

    fn preprocess(
        &self,
        _: &ContentCache,
        payload: Option<LabelData>,
    ) -> BindResult<Option<LabelValue>> {
        let Some(data) = payload else {
            return Ok(None);
        };
        Ok(match data.confidences {
            Some(conf) => Some(LabelValue::Map(
                conf.into_iter().map(|c| (c.label, c.confidence)).collect(),
            )),
            None => match data.label {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => n.as_f64().map(LabelValue::Number),
                Some(other) => Some(LabelValue::Text(display_json(&other))),
            },
        })
    }

    fn postprocess(
        &self,
        _: &ContentCache,
        value: Option<LabelValue>,
    ) -> BindResult<Option<LabelData>> {
        Ok(Some(match value {
            None => LabelData::default(),
            Some(LabelValue::Text(s)) => LabelData {
                label: Some(json!(s)),
                confidences: None,
            },
            Some(LabelValue::Number(n)) => LabelData {
                label: Some(json!(format_number(n))),
                confidences: None,
            },
            Some(LabelValue::Confidences(c)) => self.ranked(c),
            Some(LabelValue::Map(m)) => self.ranked(
                m.into_iter()
                    .map(|(label, confidence)| LabelConfidence { label, confidence })
                    .collect(),
            ),
        }))
    }

    fn example_payload(&self) -> LabelData {
        LabelData {
            label: Some(json!("Cat")),
            confidences: Some(vec![
                LabelConfidence {
                    label: "cat".into(),
                    confidence: 0.9,
                },
                LabelConfidence {
                    label: "dog".into(),
                    confidence: 0.1,
                },
            ]),
        }
    }

    fn example_value(&self) -> LabelValue {
        LabelValue::Map(BTreeMap::from([("cat".into(), 0.9), ("dog".into(), 0.1)]))
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "label": {"type": "string"},
                "confidences": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "label": {"type": "string"},
                            "confidence": {"type": "number"}
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/label.rs"]
mod tests;
