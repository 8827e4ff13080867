use super::*;
use serde_json::json;

fn cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("cache")).unwrap();
    (dir, cache)
}

fn number(args: serde_json::Value) -> Number {
    Number::from_args(args.as_object().unwrap()).unwrap()
}

#[test]
fn textbox_clears_to_empty_string() {
    let (_d, cache) = cache();
    let tb = Textbox::default();
    assert_eq!(tb.postprocess(&cache, None).unwrap(), Some(String::new()));
    assert_eq!(
        tb.preprocess(&cache, Some("abc".into())).unwrap().as_deref(),
        Some("abc")
    );
}

#[test]
fn textbox_rejects_inconsistent_line_counts() {
    let args = json!({"lines": 4, "max_lines": 2});
    assert!(Textbox::from_args(args.as_object().unwrap()).is_err());
}

#[test]
fn number_rounds_to_precision() {
    let (_d, cache) = cache();
    let n = number(json!({"precision": 0}));
    assert_eq!(n.preprocess(&cache, Some(2.6)).unwrap(), Some(3.0));
    let n = number(json!({"precision": 2}));
    assert_eq!(n.postprocess(&cache, Some(1.23456)).unwrap(), Some(1.23));
}

#[test]
fn number_bounds_use_readable_messages() {
    let (_d, cache) = cache();
    let n = number(json!({"minimum": 1, "maximum": 10}));
    let low = n.preprocess(&cache, Some(0.5)).unwrap_err();
    assert!(low.to_string().ends_with("Value 0.5 is less than minimum value 1.0."));
    let high = n.preprocess(&cache, Some(11.0)).unwrap_err();
    assert!(high.to_string().ends_with("Value 11.0 is greater than maximum value 10.0."));
}

#[test]
fn number_config_requires_ordered_bounds() {
    let args = json!({"minimum": 5, "maximum": 1});
    assert!(matches!(
        Number::from_args(args.as_object().unwrap()),
        Err(BindError::Configuration(_))
    ));
}

#[test]
fn slider_rejects_out_of_range_values() {
    let (_d, cache) = cache();
    let s = Slider::from_args(json!({"minimum": 0, "maximum": 5}).as_object().unwrap()).unwrap();
    assert!(s.preprocess(&cache, Some(6.0)).unwrap_err().is_validation());
    assert_eq!(s.preprocess(&cache, Some(5.0)).unwrap(), Some(5.0));
    assert_eq!(s.postprocess(&cache, None).unwrap(), Some(0.0));
    assert_eq!(s.api_info()["maximum"], 5.0);
}

#[test]
fn checkbox_passes_booleans_through() {
    let (_d, cache) = cache();
    let c = Checkbox::default();
    assert_eq!(c.preprocess(&cache, Some(false)).unwrap(), Some(false));
    assert_eq!(c.postprocess(&cache, None).unwrap(), None);
}

#[test]
fn button_click_carries_its_label() {
    let b = Button::from_args(json!({"value": "Go", "variant": "primary"}).as_object().unwrap())
        .unwrap();
    assert_eq!(b.click_value(), "Go");
    assert_eq!(b.example_payload(), "Go");
    assert_eq!(b.api_info()["events"], json!(["click"]));
    assert_eq!(Component::get_config(&b)["variant"], "primary");
}

#[test]
fn format_number_keeps_a_decimal() {
    assert_eq!(format_number(3.0), "3.0");
    assert_eq!(format_number(-0.25), "-0.25");
}
