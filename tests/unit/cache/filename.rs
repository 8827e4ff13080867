use super::*;

#[test]
fn strips_invalid_characters_but_keeps_extension() {
    assert_eq!(sanitize_file_name("a<b>c:d?.png"), "abcd.png");
    assert_eq!(sanitize_file_name("my file-1_(copy).txt"), "my file-1_copy.txt");
    assert_eq!(sanitize_file_name("dir/sub/name.wav"), "name.wav");
    assert_eq!(sanitize_file_name("C:\\tmp\\x.jpg"), "x.jpg");
}

#[test]
fn truncates_stem_to_byte_budget() {
    let long = format!("{}.jpeg", "é".repeat(300));
    let out = sanitize_file_name(&long);
    assert!(out.len() <= MAX_FILE_NAME_BYTES);
    assert!(out.ends_with(".jpeg"));
}

#[test]
fn empty_results_fall_back() {
    assert_eq!(sanitize_file_name("???"), "");
    assert_eq!(sanitize_or(Some("???"), FALLBACK_FILE_NAME), "file");
    assert_eq!(sanitize_or(None, "image.png"), "image.png");
}

#[test]
fn leading_dots_are_not_extensions() {
    assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
    assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
    assert_eq!(extension_of("photo.JPG").as_deref(), Some("jpg"));
    assert_eq!(extension_of("noext"), None);
}

#[test]
fn mime_lookups() {
    assert_eq!(mime_for_path("x.png").as_deref(), Some("image/png"));
    assert_eq!(mime_for_path("x.webp").as_deref(), Some("image/webp"));
    assert_eq!(mime_for_path("subs.vtt").as_deref(), Some("text/vtt"));
    assert_eq!(extension_for_mime("image/jpeg").as_deref(), Some("jpg"));
    assert_eq!(extension_for_mime("audio/x-wav").as_deref(), Some("wav"));
    assert!(is_mime_category(Some("video/mp4"), "video"));
    assert!(!is_mime_category(None, "video"));
}
