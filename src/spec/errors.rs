//! Specification and key-extraction error types

use thiserror::Error;

/// Result type for specification operations
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors from index declarations and key extraction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// Declaration failed validation (empty pattern, empty identity, ...)
    #[error("invalid index declaration: {0}")]
    InvalidDeclaration(String),

    /// Two pattern fields resolved to arrays in the same document; the
    /// cartesian fan-out is not indexable
    #[error("cannot index parallel arrays: fields '{first}' and '{second}'")]
    ParallelArrays { first: String, second: String },

    /// A pattern field resolved to a value with no key-element form
    #[error("field '{path}' has no indexable form")]
    Unindexable { path: String },

    /// The catalog could not supply the collection's declarations
    #[error("catalog lookup failed: {0}")]
    Catalog(String),
}
