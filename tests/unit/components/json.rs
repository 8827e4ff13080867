use super::*;

#[test]
fn strings_are_parsed_on_the_way_out() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path()).unwrap();
    let j = Json::default();
    assert_eq!(
        j.postprocess(&cache, Some(json!("{\"a\": [1, 2]}"))).unwrap(),
        Some(json!({"a": [1, 2]}))
    );
    assert_eq!(j.postprocess(&cache, Some(json!([1]))).unwrap(), Some(json!([1])));
    assert!(j.postprocess(&cache, Some(json!("{oops"))).unwrap_err().is_validation());
    assert_eq!(j.preprocess(&cache, None).unwrap(), None);
}
