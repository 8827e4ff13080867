use super::*;
use serde_json::json;

fn file(path: &str) -> Value {
    serde_json::to_value(FileData::new(path)).unwrap()
}

#[test]
fn traverse_replaces_matching_nodes_at_any_depth() {
    let v = json!({"a": [1, {"x": 2}], "b": {"x": 3}, "c": "x"});
    let out = traverse(
        &v,
        &mut |_| Ok(json!("hit")),
        &|n: &Value| n.get("x").is_some(),
    )
    .unwrap();
    assert_eq!(out, json!({"a": [1, "hit"], "b": "hit", "c": "x"}));
}

#[test]
fn traverse_propagates_errors() {
    let v = json!([file("a")]);
    let err = traverse(
        &v,
        &mut |_| Err(BindError::validation("stop")),
        &is_file_obj_with_meta,
    )
    .unwrap_err();
    assert!(err.to_string().contains("stop"));
}

#[test]
fn collect_files_finds_nested_references() {
    let v = json!({"image": file("/a.png"), "layers": [file("/b.png"), {"path": "/unmarked"}]});
    let found = collect_files(&v).unwrap();
    let paths: Vec<_> = found.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["/a.png", "/b.png"]);
}

#[test]
fn move_files_to_cache_copies_and_sets_route() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("c")).unwrap();
    let src = dir.path().join("in.txt");
    std::fs::write(&src, b"abc").unwrap();

    let v = json!({"f": file(src.to_str().unwrap())});
    let out = move_files_to_cache(&v, &cache, &MoveOptions::default()).unwrap();
    let fd: FileData = serde_json::from_value(out["f"].clone()).unwrap();
    assert!(cache.contains(Path::new(&fd.path)));
    assert_eq!(fd.url.unwrap(), format!("{FILE_ROUTE}{}", fd.path));
}

#[test]
fn postprocess_leaves_remote_urls_alone() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path()).unwrap();
    let v = json!([file("https://example.com/cat.png")]);
    let opts = MoveOptions {
        postprocess: true,
        ..MoveOptions::default()
    };
    let out = move_files_to_cache(&v, &cache, &opts).unwrap();
    assert_eq!(out[0]["path"], "https://example.com/cat.png");
    assert_eq!(out[0]["url"], "https://example.com/cat.png");
}

#[test]
fn streams_are_not_copied() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path()).unwrap();
    let mut fd = FileData::new("/live/stream.m3u8");
    fd.is_stream = true;
    let v = serde_json::to_value(&fd).unwrap();
    let opts = MoveOptions {
        root_url: Some("https://host/".to_string()),
        ..MoveOptions::default()
    };
    let out = move_files_to_cache(&v, &cache, &opts).unwrap();
    assert_eq!(out["path"], "/live/stream.m3u8");
    assert_eq!(out["url"], "https://host/gradio_api/stream//live/stream.m3u8");
}

#[test]
fn upload_folder_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("c")).unwrap();
    let uploads = dir.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();
    let outside = dir.path().join("secret.txt");
    std::fs::write(&outside, b"x").unwrap();

    let opts = MoveOptions {
        upload_folder: Some(uploads),
        ..MoveOptions::default()
    };
    let err = move_files_to_cache(&file(outside.to_str().unwrap()), &cache, &opts).unwrap_err();
    assert!(err.to_string().contains("not in the upload folder"));
}

#[test]
fn check_all_files_in_cache_flags_outside_paths() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("c")).unwrap();
    let cached = cache.save_bytes(b"x", "x.bin").unwrap();
    let ok = json!([file(cached.to_str().unwrap()), file("https://x.org/a.png")]);
    check_all_files_in_cache(&ok, &cache).unwrap();

    let bad = json!([file("/etc/passwd")]);
    assert!(check_all_files_in_cache(&bad, &cache).unwrap_err().is_validation());
}

#[test]
fn add_root_url_rewrites_relative_and_previous_roots() {
    let mut a = FileData::new("/p");
    a.url = Some("/gradio_api/file=/p".to_string());
    let mut b = FileData::new("/q");
    b.url = Some("http://old/gradio_api/file=/q".to_string());
    let mut c = FileData::new("/r");
    c.url = Some("https://cdn.example.com/r".to_string());
    let v = json!([a, b, c]);

    let out = add_root_url(&v, "https://new", Some("http://old")).unwrap();
    assert_eq!(out[0]["url"], "https://new/gradio_api/file=/p");
    assert_eq!(out[1]["url"], "https://new/gradio_api/file=/q");
    assert_eq!(out[2]["url"], "https://cdn.example.com/r");
}

#[test]
fn copy_to_dir_preserves_cache_layout() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("c")).unwrap();
    let cached = cache.save_bytes(b"payload", "p.bin").unwrap();
    let target = dir.path().join("sandbox");

    let out = copy_to_dir(&file(cached.to_str().unwrap()), &cache, &target).unwrap();
    let new_path = PathBuf::from(out["path"].as_str().unwrap());
    assert!(new_path.starts_with(&target));
    assert_eq!(new_path.file_name().unwrap(), "p.bin");
    assert_eq!(std::fs::read(new_path).unwrap(), b"payload");
}
