use std::io::Read as _;
use std::path::Path;

use anyhow::Context as _;
use sha2::{Digest as _, Sha256};

use crate::foundation::error::{BindError, BindResult};

/// Block size used when streaming files through the hasher.
pub const FILE_HASH_BLOCK: usize = 128 * 1024;

const BASE64_HASH_CHUNK: usize = 64 * 1024;

/// Channel through which content reached the cache.
///
/// The same bytes arriving as an upload and as inline base64 hash to different keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashNamespace {
    /// In-memory bytes (encoded images, generated audio).
    Bytes,
    /// Bytes of an existing file.
    File,
    /// A remote URL string; the fetched content is never hashed.
    Url,
    /// Inline base64 text, hashed before decoding.
    Base64,
}

impl HashNamespace {
    fn tag(self) -> u8 {
        match self {
            Self::Bytes => b'B',
            Self::File => b'F',
            Self::Url => b'U',
            Self::Base64 => b'6',
        }
    }
}

/// Seeded SHA-256 hasher producing hex cache keys.
#[derive(Clone, Debug, Default)]
pub struct ContentHasher {
    seed: Vec<u8>,
}

impl ContentHasher {
    /// Hasher mixing `seed` into every key.
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.as_bytes().to_vec(),
        }
    }

    fn begin(&self, ns: HashNamespace) -> Sha256 {
        let mut h = Sha256::new();
        h.update(&self.seed);
        h.update([0u8, ns.tag()]);
        h
    }

    /// Key for in-memory bytes.
    pub fn hash_bytes(&self, data: &[u8]) -> String {
        let mut h = self.begin(HashNamespace::Bytes);
        h.update(data);
        hex_digest(h)
    }

    /// Key for a file's content, read in [`FILE_HASH_BLOCK`] blocks.
    pub fn hash_file(&self, path: &Path) -> BindResult<String> {
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("open '{}' for hashing", path.display()))
            .map_err(|e| BindError::io(format!("{e:#}")))?;
        let mut h = self.begin(HashNamespace::File);
        let mut buf = vec![0u8; FILE_HASH_BLOCK];
        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| BindError::io(format!("read '{}': {e}", path.display())))?;
            if n == 0 {
                break;
            }
            h.update(&buf[..n]);
        }
        Ok(hex_digest(h))
    }

    /// Key for a URL string.
    pub fn hash_url(&self, url: &str) -> String {
        let mut h = self.begin(HashNamespace::Url);
        h.update(url.as_bytes());
        hex_digest(h)
    }

    /// Key for inline base64 text, without decoding it.
    pub fn hash_base64(&self, data: &str) -> String {
        let mut h = self.begin(HashNamespace::Base64);
        for chunk in data.as_bytes().chunks(BASE64_HASH_CHUNK) {
            h.update(chunk);
        }
        hex_digest(h)
    }
}

fn hex_digest(h: Sha256) -> String {
    let digest = h.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/cache/hash.rs"]
mod tests;
