use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::components::value::ComponentValue;

use super::*;

fn args(v: Value) -> ConstructorArgs {
    v.as_object().cloned().unwrap()
}

#[test]
fn tags_are_matched_case_insensitively() {
    let r = ComponentRegistry::with_builtins();
    assert!(r.contains("Textbox"));
    assert!(r.contains(" dataframe "));
    assert!(r.contains("MultimodalTextbox"));
    assert!(r.contains("imageslider"));
    assert!(!r.contains("chatbot"));
    let c = r.create("CheckboxGroup", &args(json!({"choices": ["a", "b"]}))).unwrap();
    assert_eq!(c.tag(), "checkboxgroup");
}

#[test]
fn unknown_tags_list_what_is_registered() {
    let r = ComponentRegistry::new();
    let err = r.create("plot", &ConstructorArgs::new()).err().unwrap();
    assert_eq!(
        err.to_string(),
        "configuration error: unknown component 'plot'; registered: "
    );
}

#[test]
fn constructor_errors_surface_from_create() {
    let r = ComponentRegistry::with_builtins();
    let err = r.create("dataframe", &args(json!({"type": "polars"}))).err().unwrap();
    assert!(matches!(err, BindError::Configuration(_)));
}

#[test]
fn chatbot_resolves_embedded_components() {
    let r = ComponentRegistry::with_builtins().with_chatbot();
    assert!(r.contains("chatbot"));
    let bot = r.create("chatbot", &args(json!({"type": "messages"}))).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("cache")).unwrap();
    let value = bot
        .preprocess_json(
            &cache,
            &json!([{"role": "user", "content": {"component": "number", "value": 3}}]),
        )
        .unwrap();
    assert!(matches!(value, Some(ComponentValue::Chat(_))));
}

#[test]
fn custom_factories_replace_builtins() {
    let mut r = ComponentRegistry::with_builtins();
    let before = r.tags().len();
    r.register("textbox", |_| {
        let c: Box<dyn DynComponent> = Box::new(Json::default());
        Ok(c)
    });
    assert_eq!(r.tags().len(), before);
    assert_eq!(r.create("textbox", &ConstructorArgs::new()).unwrap().tag(), "json");
}
