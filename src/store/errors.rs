//! Store error types
//!
//! Errors crossing the transactional-store boundary. The engine maps
//! `Conflict` to ORDEX_DUPLICATE_KEY and everything else it does not expect
//! to ORDEX_STORAGE_ENGINE (see ERRORS.md).

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Dictionary does not exist and creation was not requested
    #[error("dictionary not found: {0}")]
    DictionaryNotFound(String),

    /// No-overwrite insert hit an existing key
    #[error("key already exists in dictionary {dictionary}")]
    Conflict { dictionary: String },

    /// Delete of an absent key without missing-ok semantics
    #[error("key not found in dictionary {dictionary}")]
    KeyNotFound { dictionary: String },

    /// Operation issued against a committed or aborted transaction
    #[error("transaction {0} is no longer active")]
    TransactionInactive(u64),

    /// Dictionary handle used after close
    #[error("dictionary handle already closed")]
    HandleClosed,

    /// Generic I/O failure from the underlying storage engine
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal lock poisoned by a panicked writer
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}
