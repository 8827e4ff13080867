use std::path::Path;

use super::*;

fn cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("cache")).unwrap();
    (dir, cache)
}

fn slider(args: Value) -> ImageSlider {
    ImageSlider::from_args(args.as_object().unwrap()).unwrap()
}

#[test]
fn options_are_checked_at_construction() {
    let bad = |args: Value| {
        ImageSlider::from_args(args.as_object().unwrap())
            .err()
            .unwrap()
    };
    assert!(matches!(bad(json!({"position": 1.5})), BindError::Configuration(_)));
    assert!(matches!(bad(json!({"upload_count": 3})), BindError::Configuration(_)));
    assert!(matches!(bad(json!({"type": "tensor"})), BindError::Configuration(_)));
    let cfg = Component::get_config(&slider(json!({"type": "filepath"})));
    assert_eq!(cfg["position"], json!(0.5));
    assert_eq!(cfg["type"], json!("filepath"));
}

#[test]
fn payload_is_a_pair() {
    let s = slider(json!({}));
    let data = s.decode_payload(json!([null, {"path": "b.png"}])).unwrap();
    assert_eq!(data.0, None);
    assert_eq!(data.1.map(|f| f.path).as_deref(), Some("b.png"));
    assert!(s.decode_payload(json!([null, null, null])).unwrap_err().is_validation());
    assert_eq!(
        serde_json::to_value(s.example_payload()).unwrap().as_array().map(Vec::len),
        Some(2)
    );
}

#[test]
fn preprocess_loads_both_sides() {
    let (_d, cache) = cache();
    let s = slider(json!({}));
    let Some(SliderImages(Some(ImageValue::Array(a)), Some(ImageValue::Array(b)))) =
        s.preprocess(&cache, Some(s.example_payload())).unwrap()
    else {
        panic!("expected two arrays");
    };
    assert_eq!(a.shape(), (1, 1, 3));
    assert_eq!(b.shape(), (1, 1, 3));

    let one_sided = s
        .preprocess(&cache, Some(SliderData(Some(example_image_data()), None)))
        .unwrap();
    assert!(matches!(one_sided, Some(SliderImages(Some(_), None))));
}

#[test]
fn filepath_uploads_keep_their_color_mode() {
    let (d, cache) = cache();
    let src = d.path().join("gray.png");
    image::DynamicImage::ImageLuma8(image::GrayImage::new(3, 2))
        .save(&src)
        .unwrap();
    let s = slider(json!({"type": "filepath"}));
    let got = s
        .preprocess(&cache, Some(SliderData(Some(FileData::from_path(&src)), None)))
        .unwrap();
    assert!(matches!(
        got,
        Some(SliderImages(Some(ImageValue::Path(p)), None)) if Path::new(&p) == src
    ));
}

#[test]
fn postprocess_stores_each_side() {
    let (_d, cache) = cache();
    let s = slider(json!({}));
    let out = s.postprocess(&cache, Some(s.example_value())).unwrap().unwrap();
    for side in [&out.0, &out.1] {
        let fd = side.as_ref().unwrap();
        assert!(fd.path.ends_with(".webp"), "{}", fd.path);
        assert!(cache.contains(Path::new(&fd.path)));
    }

    let remote = s
        .postprocess(
            &cache,
            Some(SliderImages(
                Some(ImageValue::Path("https://example.com/before.png".into())),
                None,
            )),
        )
        .unwrap()
        .unwrap();
    assert_eq!(remote.0.unwrap().path, "https://example.com/before.png");
    assert_eq!(remote.1, None);
    assert_eq!(s.postprocess(&cache, None).unwrap(), None);
}
