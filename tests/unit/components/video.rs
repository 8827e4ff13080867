use super::*;

fn cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("cache")).unwrap();
    (dir, cache)
}

fn component(args: Value) -> Video {
    Video::from_args(args.as_object().unwrap()).unwrap()
}

fn clip(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42 not a real movie").unwrap();
    path
}

#[test]
fn upload_in_the_right_container_passes_through() {
    let (d, cache) = cache();
    let src = clip(d.path(), "world.mp4");
    let v = component(json!({"format": "mp4"}));
    let got = v.preprocess(&cache, Some(FileData::from_path(&src))).unwrap();
    assert_eq!(got, Some(src.to_string_lossy().into_owned()));
}

#[test]
fn payload_without_location_is_rejected() {
    let (_d, cache) = cache();
    let err = Video::default()
        .preprocess(&cache, Some(FileData::new("")))
        .unwrap_err();
    assert_eq!(err.to_string(), "schema validation error: Payload path missing");
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn conversion_without_ffmpeg_is_unsupported() {
    let (d, cache) = cache();
    let src = clip(d.path(), "world.avi");
    let v = component(json!({"format": "mp4"}));
    let err = v
        .preprocess(&cache, Some(FileData::from_path(&src)))
        .unwrap_err();
    assert!(matches!(err, BindError::UnsupportedFormat(_)));
}

#[test]
fn remote_video_is_referenced_when_no_conversion_is_needed() {
    let (_d, cache) = cache();
    let v = component(json!({"format": "mp4"}));
    let fd = v
        .postprocess(&cache, Some(v.example_value()))
        .unwrap()
        .unwrap();
    assert_eq!(fd.path, EXAMPLE_URL);
    assert_eq!(fd.orig_name.as_deref(), Some("world.mp4"));
}

#[test]
fn local_video_is_copied_into_the_cache() {
    let (d, cache) = cache();
    let src = clip(d.path(), "world.mp4");
    let fd = Video::default()
        .postprocess(&cache, Some(src.to_string_lossy().into_owned()))
        .unwrap()
        .unwrap();
    assert!(cache.contains(Path::new(&fd.path)));
    assert_eq!(fd.orig_name.as_deref(), Some("world.mp4"));
    assert_eq!(fd.mime_type.as_deref(), Some("video/mp4"));
}

#[test]
fn format_is_normalized_and_audio_kept_by_default() {
    let v = component(json!({"format": ".MP4"}));
    assert_eq!(
        Component::get_config(&v),
        json!({"name": "video", "format": "mp4", "include_audio": true})
    );
    assert!(v.needs_conversion("clip.webm"));
    assert!(!v.needs_conversion("CLIP.MP4"));
    assert!(!Video::default().needs_conversion("clip.webm"));
}
