use super::*;

fn manual(seed: &[u8], tag: u8, data: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(seed);
    h.update([0u8, tag]);
    h.update(data);
    hex_digest(h)
}

#[test]
fn keys_are_lowercase_hex_sha256() {
    let k = ContentHasher::default().hash_bytes(b"abc");
    assert_eq!(k.len(), 64);
    assert!(k.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(k, manual(b"", b'B', b"abc"));
}

#[test]
fn namespaces_separate_identical_content() {
    let h = ContentHasher::new("seed");
    let bytes = h.hash_bytes(b"https://x/y.png");
    let url = h.hash_url("https://x/y.png");
    let b64 = h.hash_base64("https://x/y.png");
    assert_ne!(bytes, url);
    assert_ne!(url, b64);
    assert_ne!(bytes, b64);
}

#[test]
fn seed_changes_every_key() {
    let a = ContentHasher::new("a").hash_bytes(b"same");
    let b = ContentHasher::new("b").hash_bytes(b"same");
    assert_ne!(a, b);
}

#[test]
fn file_hash_streams_across_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.bin");
    let data: Vec<u8> = (0..(FILE_HASH_BLOCK * 2 + 17)).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &data).unwrap();

    let h = ContentHasher::new("s");
    assert_eq!(h.hash_file(&path).unwrap(), manual(b"s", b'F', &data));
}

#[test]
fn missing_file_is_content_io() {
    let err = ContentHasher::default()
        .hash_file(Path::new("/definitely/not/here.bin"))
        .unwrap_err();
    assert!(matches!(err, BindError::ContentIo(_)));
}

#[test]
fn base64_chunking_matches_single_pass() {
    let text = "QUJD".repeat(BASE64_HASH_CHUNK);
    assert_eq!(
        ContentHasher::default().hash_base64(&text),
        manual(b"", b'6', text.as_bytes())
    );
}
