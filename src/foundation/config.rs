use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{BindError, BindResult};

/// Environment variable consulted by [`CacheConfig::from_env_or`].
pub const TEMP_DIR_ENV: &str = "GRADIO_TEMP_DIR";

/// Hosts that are always fetched, even when they resolve to private addresses.
///
/// These sit behind split DNS, so requests from inside their own network can resolve internally.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["hf.co", "huggingface.co"];

/// Configuration for a [`ContentCache`](crate::ContentCache).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheConfig {
    /// Cache root directory. Every entry lives in `<root>/<hash>/<name>`.
    pub root: PathBuf,
    /// Seed mixed into every content hash so separate deployments never share keys.
    #[serde(default)]
    pub hash_seed: String,
    /// Rules applied before any remote download.
    #[serde(default)]
    pub url_policy: UrlPolicy,
}

/// Remote download policy.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UrlPolicy {
    /// Refuse hosts that resolve to private, loopback, link-local or otherwise internal addresses.
    pub block_private_hosts: bool,
    /// Hostnames exempt from the private-address check.
    pub allowed_hosts: Vec<String>,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of redirects followed, each one re-checked against this policy.
    pub max_redirects: u32,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            block_private_hosts: true,
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            timeout_secs: 30,
            max_redirects: 5,
        }
    }
}

impl UrlPolicy {
    /// Policy that fetches any http(s) URL, including local addresses.
    pub fn permissive() -> Self {
        Self {
            block_private_hosts: false,
            ..Self::default()
        }
    }
}

impl CacheConfig {
    /// Configuration rooted at `root` with an empty seed and the default URL policy.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            hash_seed: String::new(),
            url_policy: UrlPolicy::default(),
        }
    }

    /// Replace the hash seed.
    pub fn with_hash_seed(mut self, seed: impl Into<String>) -> Self {
        self.hash_seed = seed.into();
        self
    }

    /// Replace the URL policy.
    pub fn with_url_policy(mut self, policy: UrlPolicy) -> Self {
        self.url_policy = policy;
        self
    }

    /// Root from `GRADIO_TEMP_DIR` when set and non-empty, otherwise `fallback`.
    pub fn from_env_or(fallback: impl Into<PathBuf>) -> Self {
        match std::env::var_os(TEMP_DIR_ENV) {
            Some(v) if !v.is_empty() => Self::new(PathBuf::from(v)),
            _ => Self::new(fallback),
        }
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: &Path) -> BindResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read cache config '{}'", path.display()))
            .map_err(BindError::from)?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| BindError::serde(format!("cache config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> BindResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(BindError::config("cache root must be a non-empty path"));
        }
        if self.url_policy.timeout_secs == 0 {
            return Err(BindError::config("url_policy.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
