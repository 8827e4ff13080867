//! Wire-level file references and helpers that walk payload JSON.

/// `FileData` and the predicates that recognize it inside arbitrary JSON.
pub mod file_data;
/// Depth-first rewriting of file references.
pub mod traverse;
