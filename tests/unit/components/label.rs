use super::*;

fn cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path()).unwrap();
    (dir, cache)
}

#[test]
fn confidences_are_sorted_and_truncated() {
    let (_d, cache) = cache();
    let label = Label::from_options(LabelOptions {
        num_top_classes: Some(2),
        color: None,
    })
    .unwrap();
    let map = BTreeMap::from([("a".to_string(), 0.2), ("b".to_string(), 0.5), ("c".to_string(), 0.3)]);
    let out = label
        .postprocess(&cache, Some(LabelValue::Map(map)))
        .unwrap()
        .unwrap();
    assert_eq!(out.label, Some(json!("b")));
    let names: Vec<_> = out.confidences.unwrap().into_iter().map(|c| c.label).collect();
    assert_eq!(names, ["b", "c"]);
}

#[test]
fn scalar_values_become_text_labels() {
    let (_d, cache) = cache();
    let label = Label::default();
    let out = label.postprocess(&cache, Some(LabelValue::Number(3.0))).unwrap().unwrap();
    assert_eq!(serde_json::to_value(out).unwrap(), json!({"label": "3.0"}));
    let empty = label.postprocess(&cache, None).unwrap().unwrap();
    assert_eq!(serde_json::to_value(empty).unwrap(), json!({}));
}

#[test]
fn preprocess_prefers_confidences() {
    let (_d, cache) = cache();
    let label = Label::default();
    let got = label.preprocess(&cache, Some(label.example_payload())).unwrap();
    assert_eq!(got, Some(label.example_value()));
    let plain = LabelData {
        label: Some(json!("Dog")),
        confidences: None,
    };
    assert_eq!(
        label.preprocess(&cache, Some(plain)).unwrap(),
        Some(LabelValue::Text("Dog".into()))
    );
}
