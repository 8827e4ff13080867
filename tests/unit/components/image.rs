use super::*;

fn cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("cache")).unwrap();
    (dir, cache)
}

fn component(args: Value) -> Image {
    Image::from_args(args.as_object().unwrap()).unwrap()
}

fn write_png(dir: &Path, name: &str, img: &DynamicImage) -> PathBuf {
    let p = dir.join(name);
    img.save_with_format(&p, ImageFormat::Png).unwrap();
    p
}

#[test]
fn svg_upload_is_returned_as_path_for_every_type() {
    let (d, cache) = cache();
    let svg = d.path().join("logo.svg");
    std::fs::write(&svg, br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();
    for kind in ImageType::NAMES {
        let img = component(json!({"type": kind}));
        let got = img
            .preprocess(&cache, Some(FileData::from_path(&svg)))
            .unwrap();
        match got {
            Some(ImageValue::Path(p)) => assert!(p.ends_with("logo.svg"), "{kind}: {p}"),
            other => panic!("{kind}: expected a path, got {other:?}"),
        }
    }
}

#[test]
fn numpy_upload_is_converted_to_rgb() {
    let (d, cache) = cache();
    let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4])));
    let src = write_png(d.path(), "a.png", &rgba);
    let got = Image::default_for_tests()
        .preprocess(&cache, Some(FileData::from_path(&src)))
        .unwrap();
    let Some(ImageValue::Array(arr)) = got else {
        panic!("expected an array");
    };
    assert_eq!(arr.shape(), (2, 3, 3));
}

#[test]
fn filepath_passes_through_when_mode_matches() {
    let (d, cache) = cache();
    let src = write_png(d.path(), "rgb.png", &example_image());
    let img = component(json!({"type": "filepath"}));
    let got = img.preprocess(&cache, Some(FileData::from_path(&src))).unwrap();
    assert!(matches!(got, Some(ImageValue::Path(p)) if Path::new(&p) == src));

    let img = component(json!({"type": "filepath", "image_mode": "L", "format": "png"}));
    let Some(ImageValue::Path(p)) = img.preprocess(&cache, Some(FileData::from_path(&src))).unwrap()
    else {
        panic!("expected a path");
    };
    assert!(cache.contains(Path::new(&p)));
    assert!(p.ends_with("rgb.png"));
}

fn write_two_frame_gif(dir: &Path) -> PathBuf {
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};

    let p = dir.join("blink.gif");
    let file = std::fs::File::create(&p).unwrap();
    let mut enc = GifEncoder::new(file);
    let frames = [Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255])].map(|px| {
        Frame::from_parts(RgbaImage::from_pixel(4, 3, px), 0, 0, Delay::from_numer_denom_ms(100, 1))
    });
    enc.encode_frames(frames).unwrap();
    p
}

#[test]
fn animated_gif_skips_mode_conversion() {
    let (d, cache) = cache();
    let src = write_two_frame_gif(d.path());

    let img = component(json!({"type": "filepath", "image_mode": "L"}));
    let got = img.preprocess(&cache, Some(FileData::from_path(&src))).unwrap();
    assert!(matches!(got, Some(ImageValue::Path(p)) if Path::new(&p) == src));

    let img = component(json!({"type": "pil", "image_mode": "L"}));
    let Some(ImageValue::Decoded(decoded)) =
        img.preprocess(&cache, Some(FileData::from_path(&src))).unwrap()
    else {
        panic!("expected a decoded image");
    };
    assert_ne!(decoded.color(), image::ColorType::L8);
    assert_eq!((decoded.width(), decoded.height()), (4, 3));
}

#[test]
fn filepath_reencode_keeps_the_upload_format() {
    let (d, cache) = cache();
    let src = d.path().join("photo.jpg");
    DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 10, 10])))
        .save_with_format(&src, ImageFormat::Jpeg)
        .unwrap();

    let img = component(json!({"type": "filepath", "image_mode": "L"}));
    let Some(ImageValue::Path(p)) = img.preprocess(&cache, Some(FileData::from_path(&src))).unwrap()
    else {
        panic!("expected a path");
    };
    assert!(p.ends_with("photo.jpeg"), "{p}");
    assert_eq!(probe_color(Path::new(&p)).unwrap(), image::ColorType::L8);
}

#[test]
fn data_url_example_round_trips() {
    let (_d, cache) = cache();
    let img = component(json!({"type": "pil"}));
    let got = img.preprocess(&cache, Some(img.example_payload())).unwrap();
    let Some(ImageValue::Decoded(decoded)) = got else {
        panic!("expected a decoded image");
    };
    assert_eq!((decoded.width(), decoded.height()), (1, 1));
}

#[test]
fn array_postprocess_writes_configured_format() {
    let (_d, cache) = cache();
    let img = component(json!({"format": "jpeg"}));
    let arr = ImageArray::from_u8(100, 100, 3, vec![90; 100 * 100 * 3]).unwrap();
    let fd = img
        .postprocess(&cache, Some(ImageValue::Array(arr)))
        .unwrap()
        .unwrap();
    assert!(fd.path.ends_with(".jpeg"), "{}", fd.path);
    assert!(Path::new(&fd.path).exists());
}

#[test]
fn unsupported_pair_falls_back_to_png() {
    let (_d, cache) = cache();
    let img = component(json!({"format": "jpeg"}));
    let arr = ImageArray::from_u8(4, 4, 4, vec![200; 4 * 4 * 4]).unwrap();
    let fd = img
        .postprocess(&cache, Some(ImageValue::Array(arr)))
        .unwrap()
        .unwrap();
    assert!(fd.path.ends_with(".png"), "{}", fd.path);
}

#[test]
fn remote_and_svg_paths_are_referenced() {
    let (d, cache) = cache();
    let img = Image::default_for_tests();
    let url = "https://example.com/cat.png";
    let fd = img
        .postprocess(&cache, Some(ImageValue::Path(url.into())))
        .unwrap()
        .unwrap();
    assert_eq!(fd.url.as_deref(), Some(url));

    let svg = d.path().join("icon.svg");
    std::fs::write(&svg, b"<svg/>").unwrap();
    let fd = img
        .postprocess(&cache, Some(ImageValue::Path(svg.to_string_lossy().into_owned())))
        .unwrap()
        .unwrap();
    assert_eq!(fd.mime_type.as_deref(), Some(SVG_MIME));
    assert!(cache.contains(Path::new(&fd.path)));
    assert_eq!(std::fs::read(&fd.path).unwrap(), b"<svg/>");
}

#[test]
fn unknown_format_fails_at_construction() {
    let err = Image::from_args(json!({"format": "xyz"}).as_object().unwrap()).unwrap_err();
    assert!(matches!(err, crate::foundation::error::BindError::Configuration(_)));
}

impl Image {
    fn default_for_tests() -> Self {
        Self::from_options(ImageOptions::default()).unwrap()
    }
}
