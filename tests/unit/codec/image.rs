use super::*;

fn rgb(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(w, h, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 128])
    }))
}

#[test]
fn mode_parses_wire_names_and_rejects_others() {
    assert_eq!("RGBA".parse::<ImageMode>().unwrap(), ImageMode::Rgba);
    assert_eq!("I;16".parse::<ImageMode>().unwrap(), ImageMode::Luma16);
    let err = "CMYK".parse::<ImageMode>().unwrap_err().to_string();
    assert!(err.contains("Invalid value for parameter `image_mode`: CMYK"), "{err}");
    assert_eq!(
        serde_json::to_value(ImageMode::Bilevel).unwrap(),
        serde_json::json!("1")
    );
}

#[test]
fn bilevel_conversion_thresholds_luma() {
    let img = DynamicImage::ImageLuma8(ImageBuffer::from_raw(2, 1, vec![10u8, 200]).unwrap());
    let out = ImageMode::Bilevel.convert(&img).to_luma8();
    assert_eq!(out.as_raw(), &vec![0u8, 255]);
}

#[test]
fn array_rejects_bad_shapes() {
    assert!(ImageArray::from_u8(2, 2, 3, vec![0; 11]).is_err());
    assert!(ImageArray::from_u8(2, 2, 5, vec![0; 20]).is_err());
    let ok = ImageArray::from_u8(2, 2, 3, vec![0; 12]).unwrap();
    assert_eq!(ok.shape(), (2, 2, 3));
}

#[test]
fn huge_shapes_are_validation_errors() {
    let err = ImageArray::new(u32::MAX, u32::MAX, 4, PixelData::U8(vec![])).unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert!(err.to_string().contains("too large"), "{err}");
}

#[test]
fn array_image_conversion_keeps_pixels() {
    let img = rgb(4, 3);
    let arr = ImageArray::from_image(&img);
    assert_eq!(arr.shape(), (3, 4, 3));
    assert_eq!(arr.to_image().unwrap().to_rgb8(), img.to_rgb8());
}

#[test]
fn signed_floats_are_rescaled() {
    let arr = ImageArray::new(1, 1, 3, PixelData::F32(vec![-1.0, 0.0, 1.0])).unwrap();
    let px = arr.to_image().unwrap().to_rgb8();
    assert_eq!(px.get_pixel(0, 0).0, [0, 128, 255]);

    let arr = ImageArray::new(1, 1, 3, PixelData::F32(vec![0.0, 0.5, 2.0])).unwrap();
    let px = arr.to_image().unwrap().to_rgb8();
    assert_eq!(px.get_pixel(0, 0).0, [0, 128, 255]);
}

#[test]
fn jpg_alias_maps_to_jpeg_extension() {
    let fmt = parse_format("jpg").unwrap();
    assert_eq!(fmt, ImageFormat::Jpeg);
    assert_eq!(format_extension(fmt), "jpeg");
    assert!(parse_format("nope").is_err());
}

#[test]
fn capability_table_knows_jpeg_has_no_alpha() {
    assert_eq!(encoder_supports(ImageFormat::Jpeg, ColorType::Rgba8), Some(false));
    assert_eq!(encoder_supports(ImageFormat::Jpeg, ColorType::Rgb8), Some(true));
    assert_eq!(encoder_supports(ImageFormat::Png, ColorType::Rgba16), Some(true));
}

#[test]
fn unsupported_pairing_falls_back_to_png() {
    let img = DynamicImage::ImageRgba8(ImageBuffer::new(5, 5));
    let enc = encode_image(&img, ImageFormat::Jpeg).unwrap();
    assert_eq!(enc.format, ImageFormat::Png);
    assert_eq!(&enc.bytes[1..4], b"PNG");
}

#[test]
fn save_image_writes_requested_format() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path()).unwrap();
    let p = save_image(&cache, &rgb(100, 100), "image", ImageFormat::Jpeg).unwrap();
    assert_eq!(p.extension().unwrap(), "jpeg");
    let back = open_image(&p, OpenOptions::default()).unwrap();
    assert_eq!((back.width(), back.height()), (100, 100));
}

#[test]
fn decode_bytes_round_trips_png() {
    let enc = encode_image(&rgb(3, 2), ImageFormat::Png).unwrap();
    let back = decode_image_bytes(&enc.bytes, OpenOptions::default()).unwrap();
    assert_eq!(back.to_rgb8(), rgb(3, 2).to_rgb8());
    assert!(decode_image_bytes(b"not an image", OpenOptions::default()).is_err());
}

/// JPEG bytes with an APP1 segment carrying `tiff` inserted right after SOI.
fn jpeg_with_exif(img: &DynamicImage, tiff: &[u8]) -> Vec<u8> {
    let jpeg = encode_image(img, ImageFormat::Jpeg).unwrap().bytes;
    let len = u16::try_from(2 + 6 + tiff.len()).unwrap();
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Little-endian TIFF block with a single Orientation (274) entry.
fn orientation_tiff(value: u16) -> Vec<u8> {
    let mut t = b"II*\0".to_vec();
    t.extend_from_slice(&8u32.to_le_bytes());
    t.extend_from_slice(&1u16.to_le_bytes());
    t.extend_from_slice(&274u16.to_le_bytes());
    t.extend_from_slice(&3u16.to_le_bytes());
    t.extend_from_slice(&1u32.to_le_bytes());
    t.extend_from_slice(&u32::from(value).to_le_bytes());
    t.extend_from_slice(&0u32.to_le_bytes());
    t
}

#[test]
fn exif_orientation_rotates_on_decode() {
    let bytes = jpeg_with_exif(&rgb(8, 4), &orientation_tiff(6));
    let turned = decode_image_bytes(&bytes, OpenOptions::default()).unwrap();
    assert_eq!((turned.width(), turned.height()), (4, 8));

    let raw = decode_image_bytes(&bytes, OpenOptions { apply_orientation: false }).unwrap();
    assert_eq!((raw.width(), raw.height()), (8, 4));

    let upright = jpeg_with_exif(&rgb(8, 4), &orientation_tiff(1));
    let same = decode_image_bytes(&upright, OpenOptions::default()).unwrap();
    assert_eq!((same.width(), same.height()), (8, 4));
}

#[test]
fn unreadable_exif_leaves_the_image_unrotated() {
    let bytes = jpeg_with_exif(&rgb(8, 4), b"not a tiff block");
    let img = decode_image_bytes(&bytes, OpenOptions::default()).unwrap();
    assert_eq!((img.width(), img.height()), (8, 4));
}

#[test]
fn header_color_is_read_without_decoding() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path()).unwrap();
    let gray = DynamicImage::ImageLuma8(ImageBuffer::new(2, 2));
    let p = save_image(&cache, &gray, "g", ImageFormat::Png).unwrap();
    assert_eq!(probe_color(&p).unwrap(), ColorType::L8);
}

#[test]
fn svg_detection_uses_extension() {
    assert!(is_svg("logo.SVG"));
    assert!(!is_svg("logo.png"));
}

#[test]
fn resize_and_crop_hits_target_size() {
    let out = resize_and_crop(&rgb(40, 20), (Some(10), Some(10)), CropAnchor::Center);
    assert_eq!((out.width(), out.height()), (10, 10));
    let out = resize_and_crop(&rgb(40, 20), (Some(20), None), CropAnchor::Top);
    assert_eq!((out.width(), out.height()), (20, 20));
}
