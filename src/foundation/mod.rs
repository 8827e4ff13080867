//! Shared plumbing: the error taxonomy, cache configuration and option enums.

pub(crate) mod choice;
/// Cache and download configuration.
pub mod config;
/// Error taxonomy and result alias.
pub mod error;
