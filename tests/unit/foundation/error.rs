use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BindError::validation("x")
            .to_string()
            .contains("schema validation error:")
    );
    assert!(
        BindError::unsupported("x")
            .to_string()
            .contains("unsupported format:")
    );
    assert!(BindError::io("x").to_string().contains("content io error:"));
    assert!(
        BindError::config("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        BindError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BindError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_validation());
}

#[test]
fn invalid_choice_lists_every_option() {
    let err = invalid_choice("type", "polars", &["pandas", "numpy", "array"]);
    assert_eq!(
        err.to_string(),
        "configuration error: Invalid value for parameter `type`: polars. \
         Please choose from one of: ['pandas', 'numpy', 'array']"
    );
}

#[test]
fn quoted_list_handles_owned_and_empty() {
    assert_eq!(quoted_list(&[".pdf".to_string(), "image".to_string()]), "['.pdf', 'image']");
    assert_eq!(quoted_list::<&str>(&[]), "[]");
}
