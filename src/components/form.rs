//! Scalar form inputs: text, numbers, sliders, checkboxes and buttons.

use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::components::base::{Clearable, Component, Configurable, HasClickEvent};
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult};

choice_enum! {
    /// Input flavor of a [`Textbox`].
    pub enum TextboxType ("type", default = Text) {
        /// Plain text.
        Text => "text",
        /// Masked input.
        Password => "password",
        /// E-mail address input.
        Email => "email",
    }
}

/// [`Textbox`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextboxOptions {
    /// Input flavor.
    #[serde(rename = "type")]
    pub kind: TextboxType,
    /// Visible lines.
    pub lines: u32,
    /// Lines before the box scrolls.
    pub max_lines: Option<u32>,
    /// Hint shown while empty.
    pub placeholder: Option<String>,
}

impl Default for TextboxOptions {
    fn default() -> Self {
        Self {
            kind: TextboxType::Text,
            lines: 1,
            max_lines: None,
            placeholder: None,
        }
    }
}

/// Single or multi-line text.
#[derive(Clone, Debug, Default)]
pub struct Textbox {
    options: TextboxOptions,
}

impl Configurable for Textbox {
    type Options = TextboxOptions;

    fn from_options(options: TextboxOptions) -> BindResult<Self> {
        if options.lines == 0 {
            return Err(BindError::config("`lines` must be at least 1"));
        }
        if let Some(max) = options.max_lines
            && max < options.lines
        {
            return Err(BindError::config(format!(
                "`max_lines` ({max}) must not be smaller than `lines` ({})",
                options.lines
            )));
        }
        Ok(Self { options })
    }
}

impl Component for Textbox {
    type Payload = String;
    type Value = String;
    type Config = TextboxOptions;

    fn tag(&self) -> &'static str {
        "textbox"
    }

    fn config(&self) -> &TextboxOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<String>) -> BindResult<Option<String>> {
        Ok(payload)
    }

    fn postprocess(&self, _: &ContentCache, value: Option<String>) -> BindResult<Option<String>> {
        Ok(match value {
            Some(v) => Some(v),
            None => self.empty_payload(),
        })
    }

    fn example_payload(&self) -> String {
        "Hello!!".to_string()
    }

    fn example_value(&self) -> String {
        "Hello!!".to_string()
    }

    fn api_info(&self) -> Value {
        json!({"type": "string"})
    }
}

impl Clearable for Textbox {
    fn empty_payload(&self) -> Option<String> {
        Some(String::new())
    }
}

/// Format a number the way users expect to read it back (`5.0`, `2.5`).
pub(crate) fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn round_to_precision(v: f64, precision: Option<u32>) -> f64 {
    match precision {
        None => v,
        Some(0) => v.round(),
        Some(p) => {
            let scale = 10f64.powi(p as i32);
            (v * scale).round() / scale
        }
    }
}

fn check_bounds(v: f64, minimum: Option<f64>, maximum: Option<f64>) -> BindResult<()> {
    if let Some(min) = minimum
        && v < min
    {
        return Err(BindError::validation(format!(
            "Value {} is less than minimum value {}.",
            format_number(v),
            format_number(min)
        )));
    }
    if let Some(max) = maximum
        && v > max
    {
        return Err(BindError::validation(format!(
            "Value {} is greater than maximum value {}.",
            format_number(v),
            format_number(max)
        )));
    }
    Ok(())
}

/// [`Number`] options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NumberOptions {
    /// Smallest accepted value.
    pub minimum: Option<f64>,
    /// Largest accepted value.
    pub maximum: Option<f64>,
    /// Digits after the decimal point; `0` produces integral values.
    pub precision: Option<u32>,
    /// Increment used by the spinner.
    pub step: Option<f64>,
}

/// Numeric input.
#[derive(Clone, Debug, Default)]
pub struct Number {
    options: NumberOptions,
}

impl Configurable for Number {
    type Options = NumberOptions;

    fn from_options(options: NumberOptions) -> BindResult<Self> {
        if let (Some(lo), Some(hi)) = (options.minimum, options.maximum)
            && lo > hi
        {
            return Err(BindError::config(format!(
                "`minimum` ({lo}) is greater than `maximum` ({hi})"
            )));
        }
        Ok(Self { options })
    }
}

impl Component for Number {
    type Payload = f64;
    type Value = f64;
    type Config = NumberOptions;

    fn tag(&self) -> &'static str {
        "number"
    }

    fn config(&self) -> &NumberOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<f64>) -> BindResult<Option<f64>> {
        let Some(v) = payload else {
            return Ok(None);
        };
        check_bounds(v, self.options.minimum, self.options.maximum)?;
        Ok(Some(round_to_precision(v, self.options.precision)))
    }

    fn postprocess(&self, _: &ContentCache, value: Option<f64>) -> BindResult<Option<f64>> {
        Ok(value.map(|v| round_to_precision(v, self.options.precision)))
    }

    fn example_payload(&self) -> f64 {
        3.0
    }

    fn example_value(&self) -> f64 {
        3.0
    }

    fn api_info(&self) -> Value {
        json!({"type": "number"})
    }
}

/// [`Slider`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SliderOptions {
    /// Left end of the range.
    pub minimum: f64,
    /// Right end of the range.
    pub maximum: f64,
    /// Increment; derived from the range when unset.
    pub step: Option<f64>,
}

impl Default for SliderOptions {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            maximum: 100.0,
            step: None,
        }
    }
}

/// Number picked from a closed range.
#[derive(Clone, Debug)]
pub struct Slider {
    options: SliderOptions,
}

impl Configurable for Slider {
    type Options = SliderOptions;

    fn from_options(options: SliderOptions) -> BindResult<Self> {
        if options.minimum > options.maximum {
            return Err(BindError::config(format!(
                "slider `minimum` ({}) is greater than `maximum` ({})",
                options.minimum, options.maximum
            )));
        }
        if options.step.is_some_and(|s| s <= 0.0) {
            return Err(BindError::config("slider `step` must be positive"));
        }
        Ok(Self { options })
    }
}

impl Component for Slider {
    type Payload = f64;
    type Value = f64;
    type Config = SliderOptions;

    fn tag(&self) -> &'static str {
        "slider"
    }

    fn config(&self) -> &SliderOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<f64>) -> BindResult<Option<f64>> {
        if let Some(v) = payload {
            check_bounds(v, Some(self.options.minimum), Some(self.options.maximum))?;
        }
        Ok(payload)
    }

    fn postprocess(&self, _: &ContentCache, value: Option<f64>) -> BindResult<Option<f64>> {
        Ok(Some(value.unwrap_or(self.options.minimum)))
    }

    fn example_payload(&self) -> f64 {
        self.options.minimum
    }

    fn example_value(&self) -> f64 {
        self.options.minimum
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "number",
            "minimum": self.options.minimum,
            "maximum": self.options.maximum,
            "description": format!(
                "numeric value between {} and {}",
                self.options.minimum, self.options.maximum
            ),
        })
    }
}

/// [`Checkbox`] has no options.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CheckboxOptions {}

/// Boolean toggle.
#[derive(Clone, Debug, Default)]
pub struct Checkbox {
    options: CheckboxOptions,
}

impl Configurable for Checkbox {
    type Options = CheckboxOptions;

    fn from_options(options: CheckboxOptions) -> BindResult<Self> {
        Ok(Self { options })
    }
}

impl Component for Checkbox {
    type Payload = bool;
    type Value = bool;
    type Config = CheckboxOptions;

    fn tag(&self) -> &'static str {
        "checkbox"
    }

    fn config(&self) -> &CheckboxOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<bool>) -> BindResult<Option<bool>> {
        Ok(payload)
    }

    fn postprocess(&self, _: &ContentCache, value: Option<bool>) -> BindResult<Option<bool>> {
        Ok(value)
    }

    fn example_payload(&self) -> bool {
        true
    }

    fn example_value(&self) -> bool {
        true
    }

    fn api_info(&self) -> Value {
        json!({"type": "boolean"})
    }
}

choice_enum! {
    /// Visual weight of a [`Button`].
    pub enum ButtonVariant ("variant", default = Secondary) {
        /// Call to action.
        Primary => "primary",
        /// Default look.
        Secondary => "secondary",
        /// Destructive action.
        Stop => "stop",
        /// Borderless.
        Huggingface => "huggingface",
    }
}

/// [`Button`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ButtonOptions {
    /// Label, also the value passed on click.
    pub value: String,
    /// Visual weight.
    pub variant: ButtonVariant,
    /// URL opened on click instead of running a function.
    pub link: Option<String>,
}

impl Default for ButtonOptions {
    fn default() -> Self {
        Self {
            value: "Run".to_string(),
            variant: ButtonVariant::Secondary,
            link: None,
        }
    }
}

/// Clickable button whose label is its value.
#[derive(Clone, Debug, Default)]
pub struct Button {
    options: ButtonOptions,
}

impl Configurable for Button {
    type Options = ButtonOptions;

    fn from_options(options: ButtonOptions) -> BindResult<Self> {
        Ok(Self { options })
    }
}

impl HasClickEvent for Button {
    fn click_value(&self) -> String {
        self.options.value.clone()
    }
}

impl Component for Button {
    type Payload = String;
    type Value = String;
    type Config = ButtonOptions;

    fn tag(&self) -> &'static str {
        "button"
    }

    fn config(&self) -> &ButtonOptions {
        &self.options
    }

    fn preprocess(&self, _: &ContentCache, payload: Option<String>) -> BindResult<Option<String>> {
        Ok(payload)
    }

    fn postprocess(&self, _: &ContentCache, value: Option<String>) -> BindResult<Option<String>> {
        Ok(value)
    }

    fn example_payload(&self) -> String {
        self.click_value()
    }

    fn example_value(&self) -> String {
        self.click_value()
    }

    fn api_info(&self) -> Value {
        json!({"type": "string", "events": Self::EVENTS})
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/form.rs"]
mod tests;
