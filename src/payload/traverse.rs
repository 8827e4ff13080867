//! Walk nested payload JSON and rewrite every file reference it contains.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cache::fetch::is_http_url;
use crate::cache::store::ContentCache;
use crate::codec::base64::is_data_url;
use crate::foundation::error::{BindError, BindResult};
use crate::payload::file_data::{FileData, is_file_obj_with_meta, is_file_obj_with_url};

/// Route prefix for finished files served by the host.
pub const FILE_ROUTE: &str = "/gradio_api/file=";
/// Route prefix for streamed files served by the host.
pub const STREAM_ROUTE: &str = "/gradio_api/stream/";

/// Rebuild `value`, replacing every node for which `is_root` holds with `func(node)`.
///
/// Matching nodes are not descended into.
pub fn traverse<F, P>(value: &Value, func: &mut F, is_root: &P) -> BindResult<Value>
where
    F: FnMut(&Value) -> BindResult<Value>,
    P: Fn(&Value) -> bool,
{
    if is_root(value) {
        return func(value);
    }
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), traverse(v, func, is_root)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| traverse(v, func, is_root))
            .collect::<BindResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Every marked file reference inside `value`, in document order.
pub fn collect_files(value: &Value) -> BindResult<Vec<FileData>> {
    let mut found = Vec::new();
    traverse(
        value,
        &mut |node| {
            found.push(decode_file(node)?);
            Ok(node.clone())
        },
        &is_file_obj_with_meta,
    )?;
    Ok(found)
}

fn decode_file(node: &Value) -> BindResult<FileData> {
    serde_json::from_value(node.clone())
        .map_err(|e| BindError::validation(format!("invalid file reference: {e}")))
}

fn encode_file(fd: &FileData) -> BindResult<Value> {
    serde_json::to_value(fd).map_err(|e| BindError::serde(e.to_string()))
}

/// Options for [`move_files_to_cache`].
#[derive(Clone, Debug, Default)]
pub struct MoveOptions {
    /// `true` on the outbound path; remote URLs are then passed through without downloading.
    pub postprocess: bool,
    /// When set, inbound local paths must lie inside this folder.
    pub upload_folder: Option<PathBuf>,
    /// Prefix (e.g. `https://host`) prepended to generated routes.
    pub root_url: Option<String>,
}

/// Bring every file referenced by `value` into `cache` and point its `url` at the serving route.
pub fn move_files_to_cache(
    value: &Value,
    cache: &ContentCache,
    opts: &MoveOptions,
) -> BindResult<Value> {
    traverse(
        value,
        &mut |node| {
            let mut fd = decode_file(node)?;
            let url_is_remote = fd.url.as_deref().is_some_and(is_http_url);
            if opts.postprocess && (url_is_remote || fd.is_remote()) {
                if url_is_remote {
                    fd.path = fd.url.clone().unwrap_or_default();
                }
                fd.url = Some(fd.path.clone());
                return encode_file(&fd);
            }

            if let Some(folder) = &opts.upload_folder
                && !fd.is_remote()
                && !is_data_url(&fd.path)
            {
                ensure_within(Path::new(&fd.path), folder)?;
            }
            if !fd.is_stream {
                fd.path = if fd.path.is_empty() {
                    fd.materialize(cache)?.to_string_lossy().into_owned()
                } else {
                    cache.move_resource(&fd.path)?
                };
            }

            let route = if fd.is_stream { STREAM_ROUTE } else { FILE_ROUTE };
            let url = if is_http_url(&fd.path) || fd.path.starts_with(route) {
                fd.path.clone()
            } else {
                format!("{route}{}", fd.path)
            };
            fd.url = Some(match &opts.root_url {
                Some(root) if !is_http_url(&url) => format!("{}{url}", root.trim_end_matches('/')),
                _ => url,
            });
            encode_file(&fd)
        },
        &is_file_obj_with_meta,
    )
}

fn ensure_within(path: &Path, folder: &Path) -> BindResult<()> {
    let folder = std::fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf());
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if resolved.starts_with(&folder) {
        return Ok(());
    }
    Err(BindError::validation(format!(
        "File {} is not in the upload folder and cannot be accessed.",
        resolved.display()
    )))
}

/// Fail unless every file referenced by `value` is cached, remote or inline.
pub fn check_all_files_in_cache(value: &Value, cache: &ContentCache) -> BindResult<()> {
    for fd in collect_files(value)? {
        if fd.is_remote() || is_data_url(&fd.path) || cache.contains(Path::new(&fd.path)) {
            continue;
        }
        return Err(BindError::validation(format!(
            "File {} is not in the cache folder and cannot be accessed.",
            fd.path
        )));
    }
    Ok(())
}

/// Turn relative `url` fields into absolute ones under `root_url`.
///
/// URLs that start with `previous_root_url` are re-rooted; other absolute URLs are untouched.
pub fn add_root_url(
    value: &Value,
    root_url: &str,
    previous_root_url: Option<&str>,
) -> BindResult<Value> {
    traverse(
        value,
        &mut |node| {
            let mut fd = decode_file(node)?;
            let Some(mut url) = fd.url.take() else {
                return Ok(node.clone());
            };
            match previous_root_url {
                Some(prev) if !prev.is_empty() && url.starts_with(prev) => {
                    url = url[prev.len()..].to_string();
                }
                _ if is_http_url(&url) => {
                    fd.url = Some(url);
                    return encode_file(&fd);
                }
                _ => {}
            }
            fd.url = Some(format!("{root_url}{url}"));
            encode_file(&fd)
        },
        &is_file_obj_with_url,
    )
}

/// Copy every local file referenced by `value` into `dir` and rewrite the paths.
///
/// Files inside `cache` keep their `<hash>/<name>` layout under `dir`; other files land directly
/// in `dir`. Remote and inline references are left alone.
pub fn copy_to_dir(value: &Value, cache: &ContentCache, dir: &Path) -> BindResult<Value> {
    traverse(
        value,
        &mut |node| {
            let mut fd = decode_file(node)?;
            if fd.is_remote() || is_data_url(&fd.path) || fd.path.is_empty() {
                return Ok(node.clone());
            }
            let src = PathBuf::from(&fd.path);
            let rel = src
                .strip_prefix(cache.root())
                .map(Path::to_path_buf)
                .ok()
                .or_else(|| src.file_name().map(PathBuf::from))
                .ok_or_else(|| {
                    BindError::validation(format!("file reference '{}' has no name", fd.path))
                })?;
            let dest = dir.join(rel);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BindError::io(format!("create '{}': {e}", parent.display())))?;
            }
            std::fs::copy(&src, &dest).map_err(|e| {
                BindError::io(format!(
                    "copy '{}' to '{}': {e}",
                    src.display(),
                    dest.display()
                ))
            })?;
            fd.path = dest.to_string_lossy().into_owned();
            encode_file(&fd)
        },
        &is_file_obj_with_meta,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/payload/traverse.rs"]
mod tests;
