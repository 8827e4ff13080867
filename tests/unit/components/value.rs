use super::*;
use serde_json::json;

#[test]
fn conversions_round_trip_through_the_matching_variant() {
    let v: ComponentValue = "hi".to_string().into();
    assert_eq!(v.kind(), "Text");
    assert_eq!(String::try_from(v).unwrap(), "hi");
    let n: ComponentValue = 2.5f64.into();
    assert!(matches!(n, ComponentValue::Number(x) if x == 2.5));
}

#[test]
fn mismatched_variant_is_a_validation_error() {
    let err = f64::try_from(ComponentValue::Text("x".into())).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("expected a Number value, got Text"));
}

#[test]
fn summary_of_scalars_is_plain_json() {
    assert_eq!(ComponentValue::Bool(true).summary(), json!(true));
    assert_eq!(ComponentValue::Choices(vec![json!(1)]).summary(), json!([1]));
    assert_eq!(ComponentValue::Number(f64::NAN).summary(), Value::Null);
}
