//! Content-addressed file cache.
//!
//! Entries are keyed by a namespaced SHA-256 of their content (bytes, file, URL string or base64
//! text) and laid out as `<root>/<hash>/<name>`.

/// Guarded http(s) downloads.
pub mod fetch;
/// File name sanitizing and MIME helpers.
pub mod filename;
/// Namespaced content hashing.
pub mod hash;
/// The cache itself.
pub mod store;
