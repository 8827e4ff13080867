use super::*;

fn cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("cache")).unwrap();
    (dir, cache)
}

fn textbox(args: Value) -> MultimodalTextbox {
    MultimodalTextbox::from_args(args.as_object().unwrap()).unwrap()
}

#[test]
fn sources_accept_a_single_name_or_a_list() {
    assert_eq!(textbox(json!({})).options.sources, vec![MultimodalSource::Upload]);
    assert_eq!(
        textbox(json!({"sources": "microphone"})).options.sources,
        vec![MultimodalSource::Microphone]
    );
    assert_eq!(
        textbox(json!({"sources": ["upload", "microphone"]})).options.sources.len(),
        2
    );
    let err = MultimodalTextbox::from_args(json!({"sources": ["webcam"]}).as_object().unwrap())
        .err()
        .unwrap();
    assert!(matches!(err, BindError::Configuration(_)), "{err}");
    assert!(err.to_string().contains("webcam"), "{err}");
}

#[test]
fn max_lines_never_drops_below_lines() {
    let tb = textbox(json!({"lines": 30}));
    assert_eq!(Component::get_config(&tb)["max_lines"], json!(30));
    assert_eq!(Component::get_config(&tb)["name"], json!("multimodaltextbox"));
}

#[test]
fn payload_text_is_required_and_files_default_to_empty() {
    let tb = textbox(json!({}));
    assert!(tb.decode_payload(json!({"files": []})).unwrap_err().is_validation());
    let data = tb.decode_payload(json!({"text": "hi"})).unwrap();
    assert_eq!(data, MultimodalData { text: "hi".into(), files: vec![] });
}

#[test]
fn preprocess_hands_over_text_and_local_paths() {
    let (d, cache) = cache();
    let notes = d.path().join("notes.txt");
    std::fs::write(&notes, b"attached").unwrap();
    let tb = textbox(json!({}));
    let got = tb
        .preprocess(
            &cache,
            Some(MultimodalData {
                text: "see file".into(),
                files: vec![FileData::from_path(&notes)],
            }),
        )
        .unwrap();
    let Some(MultimodalValue::Message { text, files }) = got else {
        panic!("expected a message");
    };
    assert_eq!(text, "see file");
    assert_eq!(files, vec![notes.to_string_lossy().into_owned()]);

    let inline = tb.preprocess(&cache, Some(tb.example_payload())).unwrap();
    let Some(MultimodalValue::Message { files, .. }) = inline else {
        panic!("expected a message");
    };
    assert!(cache.contains(Path::new(&files[0])));
}

#[test]
fn file_types_are_enforced_on_upload() {
    let (_d, cache) = cache();
    let tb = textbox(json!({"file_types": ["image"]}));
    let pdf = FileData::new("/uploads/report.pdf").with_mime_type("application/pdf");
    let err = tb
        .preprocess(&cache, Some(MultimodalData { text: String::new(), files: vec![pdf] }))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(
        err.to_string().contains("Invalid file type: application/pdf"),
        "{err}"
    );
    assert!(tb.preprocess(&cache, Some(tb.example_payload())).is_ok());
}

#[test]
fn postprocess_accepts_text_paths_and_references() {
    let (d, cache) = cache();
    let tb = textbox(json!({}));

    let plain = tb
        .postprocess(&cache, Some(MultimodalValue::Text("hello".into())))
        .unwrap()
        .unwrap();
    assert_eq!(plain, MultimodalData { text: "hello".into(), files: vec![] });

    let src = d.path().join("cat.png");
    std::fs::write(&src, b"not really a png").unwrap();
    let out = tb
        .postprocess(
            &cache,
            Some(MultimodalValue::Message {
                text: "a cat".into(),
                files: vec![
                    src.to_string_lossy().into_owned(),
                    "https://example.com/dog.jpg".into(),
                ],
            }),
        )
        .unwrap()
        .unwrap();
    assert_eq!(out.files.len(), 2);
    assert!(cache.contains(Path::new(&out.files[0].path)));
    assert_eq!(out.files[0].orig_name.as_deref(), Some("cat.png"));
    assert_eq!(out.files[0].mime_type.as_deref(), Some("image/png"));
    assert_eq!(out.files[1].path, "https://example.com/dog.jpg");

    let kept = MultimodalData { text: "as is".into(), files: vec![FileData::new("x.txt")] };
    let same = tb
        .postprocess(&cache, Some(MultimodalValue::Data(kept.clone())))
        .unwrap();
    assert_eq!(same, Some(kept));
    assert_eq!(tb.postprocess(&cache, None).unwrap(), None);
}

#[test]
fn missing_attachment_is_a_content_error() {
    let (d, cache) = cache();
    let tb = textbox(json!({}));
    let gone = d.path().join("gone.txt").to_string_lossy().into_owned();
    let err = tb
        .postprocess(
            &cache,
            Some(MultimodalValue::Message { text: String::new(), files: vec![gone] }),
        )
        .unwrap_err();
    assert!(matches!(err, BindError::ContentIo(_)), "{err}");
}
