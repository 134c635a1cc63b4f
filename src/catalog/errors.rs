//! Catalog error types

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors from the index metadata registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// An index with this identity is already registered
    #[error("index already registered: {ns}.${name}")]
    DuplicateIndex { ns: String, name: String },

    /// No index with this identity is registered
    #[error("index not found: {ns}.${name}")]
    IndexNotFound { ns: String, name: String },

    /// Internal lock poisoned by a panicked writer
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}
