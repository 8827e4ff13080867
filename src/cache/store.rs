use std::fs::File;
use std::io::Write as _;
use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;

use crate::cache::fetch::{download, is_http_url, url_file_name};
use crate::cache::filename::{FALLBACK_FILE_NAME, sanitize_or};
use crate::cache::hash::ContentHasher;
use crate::codec::base64::{decode_base64, extension_from_data_url, is_data_url};
use crate::foundation::config::{CacheConfig, UrlPolicy};
use crate::foundation::error::{BindError, BindResult};

/// Content-addressed file store.
///
/// Entries live at `<root>/<hash>/<name>`. An entry is never rewritten once it exists, and new
/// entries become visible atomically: content is written to a temp file in the entry directory
/// and then linked into place without clobbering. Two writers racing on the same key both
/// succeed and observe the same path.
#[derive(Clone, Debug)]
pub struct ContentCache {
    root: PathBuf,
    hasher: ContentHasher,
    url_policy: UrlPolicy,
}

impl ContentCache {
    /// Open (and create if needed) the cache described by `config`.
    pub fn new(config: CacheConfig) -> BindResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.root)
            .with_context(|| format!("create cache root '{}'", config.root.display()))
            .map_err(|e| BindError::io(format!("{e:#}")))?;
        let root = std::fs::canonicalize(&config.root)
            .map_err(|e| BindError::io(format!("resolve '{}': {e}", config.root.display())))?;
        tracing::debug!(root = %root.display(), "opened content cache");
        Ok(Self {
            root,
            hasher: ContentHasher::new(&config.hash_seed),
            url_policy: config.url_policy,
        })
    }

    /// Cache rooted at `root` with default settings.
    pub fn at(root: impl Into<PathBuf>) -> BindResult<Self> {
        Self::new(CacheConfig::new(root))
    }

    /// Canonical cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hasher used for cache keys.
    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    /// Policy applied to remote downloads.
    pub fn url_policy(&self) -> &UrlPolicy {
        &self.url_policy
    }

    fn entry_path(&self, key: &str, name: &str) -> PathBuf {
        self.root.join(key).join(name)
    }

    /// Store in-memory bytes under `file_name`.
    #[tracing::instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn save_bytes(&self, data: &[u8], file_name: &str) -> BindResult<PathBuf> {
        let key = self.hasher.hash_bytes(data);
        let dest = self.entry_path(&key, &sanitize_or(Some(file_name), FALLBACK_FILE_NAME));
        self.publish(&dest, |f| {
            f.write_all(data)
                .map_err(|e| BindError::io(format!("write cache entry: {e}")))
        })
    }

    /// Copy an existing file into the cache, keyed by its content.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn save_file(&self, src: &Path) -> BindResult<PathBuf> {
        let key = self.hasher.hash_file(src)?;
        let name = src.file_name().map(|n| n.to_string_lossy().into_owned());
        let dest = self.entry_path(&key, &sanitize_or(name.as_deref(), FALLBACK_FILE_NAME));
        self.publish(&dest, |f| {
            let mut input = File::open(src)
                .map_err(|e| BindError::io(format!("open '{}': {e}", src.display())))?;
            std::io::copy(&mut input, f)
                .map(|_| ())
                .map_err(|e| BindError::io(format!("copy '{}': {e}", src.display())))
        })
    }

    /// Download a URL into the cache, keyed by the URL string.
    ///
    /// The remote content is fetched at most once per distinct URL per cache root; later changes
    /// on the server are not observed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn save_url(&self, url: &str) -> BindResult<PathBuf> {
        if !is_http_url(url) {
            return Err(BindError::validation(format!(
                "expected an http(s) URL, got '{url}'"
            )));
        }
        let key = self.hasher.hash_url(url);
        let name = url_file_name(url);
        let dest = self.entry_path(&key, &sanitize_or(name.as_deref(), FALLBACK_FILE_NAME));
        self.publish(&dest, |f| download(&self.url_policy, url, f).map(|_| ()))
    }

    /// Decode base64 (bare or `data:` URL) into the cache, keyed by the encoded text.
    ///
    /// Without `file_name` the entry is named `file.<ext>` from the declared MIME type, or `file`.
    #[tracing::instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn save_base64(&self, data: &str, file_name: Option<&str>) -> BindResult<PathBuf> {
        let key = self.hasher.hash_base64(data);
        let fallback = match extension_from_data_url(data) {
            Some(ext) => format!("{FALLBACK_FILE_NAME}.{ext}"),
            None => FALLBACK_FILE_NAME.to_string(),
        };
        let dest = self.entry_path(&key, &sanitize_or(file_name, &fallback));
        self.publish(&dest, |f| {
            let bytes = decode_base64(data)?;
            f.write_all(&bytes)
                .map_err(|e| BindError::io(format!("write cache entry: {e}")))
        })
    }

    /// Bring a resource into the cache and return its cached location.
    ///
    /// http(s) URLs are downloaded, `data:` URLs decoded, local files outside the cache copied in;
    /// anything already inside the cache is returned unchanged.
    pub fn move_resource(&self, url_or_path: &str) -> BindResult<String> {
        let out = if is_http_url(url_or_path) {
            self.save_url(url_or_path)?
        } else if is_data_url(url_or_path) {
            self.save_base64(url_or_path, None)?
        } else if !self.contains(Path::new(url_or_path)) {
            self.save_file(Path::new(url_or_path))?
        } else {
            return Ok(url_or_path.to_string());
        };
        Ok(out.to_string_lossy().into_owned())
    }

    /// Return `true` when `path` is the cache root or lies inside it.
    pub fn contains(&self, path: &Path) -> bool {
        let resolved =
            std::fs::canonicalize(path).unwrap_or_else(|_| normalize_lexically(path));
        resolved.starts_with(&self.root)
    }

    fn publish(
        &self,
        dest: &Path,
        write: impl FnOnce(&mut File) -> BindResult<()>,
    ) -> BindResult<PathBuf> {
        if dest.exists() {
            tracing::debug!(path = %dest.display(), "cache hit");
            return Ok(dest.to_path_buf());
        }
        let dir = dest
            .parent()
            .ok_or_else(|| BindError::io(format!("cache path '{}' has no parent", dest.display())))?;
        std::fs::create_dir_all(dir)
            .map_err(|e| BindError::io(format!("create '{}': {e}", dir.display())))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(dir)
            .map_err(|e| BindError::io(format!("create temp file in '{}': {e}", dir.display())))?;
        write(tmp.as_file_mut())?;
        tmp.as_file_mut()
            .flush()
            .map_err(|e| BindError::io(format!("flush cache entry: {e}")))?;

        match tmp.persist_noclobber(dest) {
            Ok(_) => {
                tracing::debug!(path = %dest.display(), "cache store");
                Ok(dest.to_path_buf())
            }
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %dest.display(), "lost publish race, reusing entry");
                Ok(dest.to_path_buf())
            }
            Err(e) => Err(BindError::io(format!(
                "publish '{}': {}",
                dest.display(),
                e.error
            ))),
        }
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().unwrap_or_default()
    };
    let mut out = base;
    for comp in path.components() {
        match comp {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
