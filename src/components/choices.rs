//! Components that pick from a configured list: [`Radio`], [`Dropdown`] and [`CheckboxGroup`].

use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::components::base::{Choice, Component, Configurable, HasChoices, display_json};
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult};

choice_enum! {
    /// What a choice component hands to the user function.
    pub enum ChoiceType ("type", default = Value) {
        /// The selected value itself.
        Value => "value",
        /// Position of the selection among the choices.
        Index => "index",
    }
}

fn resolve(owner: &impl HasChoices, kind: ChoiceType, value: Value) -> BindResult<Value> {
    match kind {
        ChoiceType::Value => Ok(value),
        ChoiceType::Index => owner.check_choice(&value).map(|i| json!(i)),
    }
}

fn first_value(choices: &[Choice]) -> Value {
    choices.first().map(|c| c.value.clone()).unwrap_or(Value::Null)
}

fn enum_info(owner: &impl HasChoices, title: &str) -> Value {
    json!({"enum": owner.choice_values(), "title": title, "type": "string"})
}

/// [`Radio`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RadioOptions {
    /// Selectable options.
    pub choices: Vec<Choice>,
    /// Value or index.
    #[serde(rename = "type")]
    pub kind: ChoiceType,
}

/// Single selection shown as radio buttons.
#[derive(Clone, Debug, Default)]
pub struct Radio {
    options: RadioOptions,
}

impl Configurable for Radio {
    type Options = RadioOptions;

    fn from_options(options: RadioOptions) -> BindResult<Self> {
        Ok(Self { options })
    }
}

impl HasChoices for Radio {
    fn choices(&self) -> &[Choice] {
        &self.options.choices
    }
}

impl Component for Radio {
    type Payload = Value;
    type Value = Value;
    type Config = RadioOptions;

    fn tag(&self) -> &'static str {
        "radio"
    }

    fn config(&self) -> &RadioOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<Value>) -> BindResult<Option<Value>> {
        let Some(v) = payload.filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        self.check_choice(&v)?;
        resolve(self, self.options.kind, v).map(Some)
    }

    fn postprocess(&self, _: &ContentCache, value: Option<Value>) -> BindResult<Option<Value>> {
        Ok(value)
    }

    fn example_payload(&self) -> Value {
        first_value(&self.options.choices)
    }

    fn example_value(&self) -> Value {
        first_value(&self.options.choices)
    }

    fn api_info(&self) -> Value {
        enum_info(self, "Radio")
    }
}

/// [`Dropdown`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DropdownOptions {
    /// Selectable options.
    pub choices: Vec<Choice>,
    /// Value or index.
    #[serde(rename = "type")]
    pub kind: ChoiceType,
    /// Allow several selections; the payload is then a list.
    pub multiselect: bool,
    /// Accept values that are not among the choices.
    pub allow_custom_value: bool,
    /// Upper bound on selections when `multiselect` is set.
    pub max_choices: Option<usize>,
}

/// Single or multiple selection from a drop-down list.
#[derive(Clone, Debug, Default)]
pub struct Dropdown {
    options: DropdownOptions,
}

impl Configurable for Dropdown {
    type Options = DropdownOptions;

    fn from_options(options: DropdownOptions) -> BindResult<Self> {
        if options.allow_custom_value && options.kind == ChoiceType::Index {
            return Err(BindError::config(
                "`allow_custom_value` cannot be combined with `type=\"index\"`",
            ));
        }
        Ok(Self { options })
    }
}

impl HasChoices for Dropdown {
    fn choices(&self) -> &[Choice] {
        &self.options.choices
    }
}

impl Dropdown {
    fn check(&self, v: &Value) -> BindResult<()> {
        if !self.options.allow_custom_value {
            self.check_choice(v)?;
        }
        Ok(())
    }
}

impl Component for Dropdown {
    type Payload = Value;
    type Value = Value;
    type Config = DropdownOptions;

    fn tag(&self) -> &'static str {
        "dropdown"
    }

    fn config(&self) -> &DropdownOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<Value>) -> BindResult<Option<Value>> {
        let Some(v) = payload.filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        if !self.options.multiselect {
            if v.is_array() {
                return Err(BindError::validation(
                    "Dropdown does not allow multiple selections; expected a single value",
                ));
            }
            self.check(&v)?;
            return resolve(self, self.options.kind, v).map(Some);
        }
        let Value::Array(items) = v else {
            return Err(BindError::validation(format!(
                "multiselect Dropdown expects a list of values, got {}",
                display_json(&v)
            )));
        };
        if let Some(max) = self.options.max_choices
            && items.len() > max
        {
            return Err(BindError::validation(format!(
                "Dropdown accepts at most {max} choices, got {}",
                items.len()
            )));
        }
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            self.check(&item)?;
            out.push(resolve(self, self.options.kind, item)?);
        }
        Ok(Some(Value::Array(out)))
    }

    fn postprocess(&self, _: &ContentCache, value: Option<Value>) -> BindResult<Option<Value>> {
        let Some(v) = value.filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let v = match v {
            Value::Array(items) if self.options.multiselect => Value::Array(items),
            scalar if self.options.multiselect => Value::Array(vec![scalar]),
            other => other,
        };
        if !self.options.allow_custom_value {
            let unknown: Vec<&Value> = match &v {
                Value::Array(items) => items.iter().collect(),
                single => vec![single],
            }
            .into_iter()
            .filter(|x| self.choice_index(x).is_none())
            .collect();
            if !unknown.is_empty() {
                let values = Value::Array(unknown.into_iter().cloned().collect());
                tracing::warn!(
                    values = %values,
                    "dropdown value is not among its choices; set allow_custom_value to accept it"
                );
            }
        }
        Ok(Some(v))
    }

    fn example_payload(&self) -> Value {
        let first = first_value(&self.options.choices);
        if self.options.multiselect {
            if first.is_null() { json!([]) } else { json!([first]) }
        } else {
            first
        }
    }

    fn example_value(&self) -> Value {
        self.example_payload()
    }

    fn api_info(&self) -> Value {
        let single = enum_info(self, "Dropdown");
        if self.options.multiselect {
            json!({"type": "array", "items": single})
        } else {
            single
        }
    }
}

/// [`CheckboxGroup`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckboxGroupOptions {
    /// Selectable options.
    pub choices: Vec<Choice>,
    /// Value or index.
    #[serde(rename = "type")]
    pub kind: ChoiceType,
}

/// Several independent checkboxes.
#[derive(Clone, Debug, Default)]
pub struct CheckboxGroup {
    options: CheckboxGroupOptions,
}

impl Configurable for CheckboxGroup {
    type Options = CheckboxGroupOptions;

    fn from_options(options: CheckboxGroupOptions) -> BindResult<Self> {
        Ok(Self { options })
    }
}

impl HasChoices for CheckboxGroup {
    fn choices(&self) -> &[Choice] {
        &self.options.choices
    }
}

impl Component for CheckboxGroup {
    type Payload = Vec<Value>;
    type Value = Vec<Value>;
    type Config = CheckboxGroupOptions;

    fn tag(&self) -> &'static str {
        "checkboxgroup"
    }

    fn config(&self) -> &CheckboxGroupOptions {
        &self.options
    }

    fn preprocess(
        &self,
        _: &ContentCache,
        payload: Option<Vec<Value>>,
    ) -> BindResult<Option<Vec<Value>>> {
        let Some(items) = payload else {
            return Ok(None);
        };
        items
            .into_iter()
            .map(|v| {
                self.check_choice(&v)?;
                resolve(self, self.options.kind, v)
            })
            .collect::<BindResult<Vec<_>>>()
            .map(Some)
    }

    fn postprocess(
        &self,
        _: &ContentCache,
        value: Option<Vec<Value>>,
    ) -> BindResult<Option<Vec<Value>>> {
        Ok(Some(value.unwrap_or_default()))
    }

    fn example_payload(&self) -> Vec<Value> {
        self.options
            .choices
            .first()
            .map(|c| vec![c.value.clone()])
            .unwrap_or_default()
    }

    fn example_value(&self) -> Vec<Value> {
        self.example_payload()
    }

    fn api_info(&self) -> Value {
        json!({"type": "array", "items": enum_info(self, "Checkbox Group Option")})
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/choices.rs"]
mod tests;
