//! Engine error types
//!
//! Error codes (see ERRORS.md):
//! - ORDEX_STORAGE_OPEN (FATAL) - dictionary open/create failed
//! - ORDEX_DUPLICATE_KEY (ERROR) - unique-index conflict, caller-recoverable
//! - ORDEX_KEY_EXTRACTION (ERROR) - document not indexable under the pattern
//! - ORDEX_MALFORMED_KEY (FATAL) - key decode failed, corruption or codec mismatch
//! - ORDEX_ILLEGAL_STATE (FATAL) - operation after close or without an active transaction
//! - ORDEX_TXN_EXPIRED (FATAL) - cursor used after its transaction ended
//! - ORDEX_STORAGE_ENGINE (FATAL) - unexpected store failure
//!
//! A duplicate-key violation surfaces as a structured write error carrying
//! the offending index and key; everything FATAL aborts the enclosing
//! transaction at the caller.

use std::fmt;

use crate::codec::IndexKey;

/// Severity levels for engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller-recoverable operation failure
    Error,
    /// Unexpected invariant violation; not retried
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Engine error codes as defined in ERRORS.md
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorCode {
    /// Dictionary open or create failed
    StorageOpen,
    /// Unique-index conflict on insert
    DuplicateKey,
    /// Key extraction rejected the document
    KeyExtraction,
    /// Physical key failed to decode
    MalformedKey,
    /// Operation invoked after close or without an active transaction
    IllegalState,
    /// Cursor used after its transaction committed or aborted
    TxnExpired,
    /// Any other unexpected store result
    StorageEngine,
}

impl EngineErrorCode {
    /// Returns the string code as defined in ERRORS.md
    pub fn code(&self) -> &'static str {
        match self {
            EngineErrorCode::StorageOpen => "ORDEX_STORAGE_OPEN",
            EngineErrorCode::DuplicateKey => "ORDEX_DUPLICATE_KEY",
            EngineErrorCode::KeyExtraction => "ORDEX_KEY_EXTRACTION",
            EngineErrorCode::MalformedKey => "ORDEX_MALFORMED_KEY",
            EngineErrorCode::IllegalState => "ORDEX_ILLEGAL_STATE",
            EngineErrorCode::TxnExpired => "ORDEX_TXN_EXPIRED",
            EngineErrorCode::StorageEngine => "ORDEX_STORAGE_ENGINE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            EngineErrorCode::DuplicateKey | EngineErrorCode::KeyExtraction => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for EngineErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with full context
#[derive(Debug)]
pub struct EngineError {
    code: EngineErrorCode,
    message: String,
    /// Index namespace, when the failure is index-scoped
    index: Option<String>,
    /// Offending secondary key, for duplicate-key violations
    key: Option<IndexKey>,
}

impl EngineError {
    /// Dictionary open or create failed
    pub fn storage_open(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::StorageOpen,
            message: reason.into(),
            index: Some(index.into()),
            key: None,
        }
    }

    /// Unique-index conflict, carrying the offending key
    pub fn duplicate_key(index: impl Into<String>, key: IndexKey) -> Self {
        Self {
            code: EngineErrorCode::DuplicateKey,
            message: "key already exists in unique index".to_string(),
            index: Some(index.into()),
            key: Some(key),
        }
    }

    /// Document rejected by key extraction
    pub fn key_extraction(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::KeyExtraction,
            message: reason.into(),
            index: Some(index.into()),
            key: None,
        }
    }

    /// Physical key or value failed to decode
    pub fn malformed_key(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::MalformedKey,
            message: reason.into(),
            index: Some(index.into()),
            key: None,
        }
    }

    /// Programming error: closed engine or missing transaction
    pub fn illegal_state(reason: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::IllegalState,
            message: reason.into(),
            index: None,
            key: None,
        }
    }

    /// Cursor outlived its transaction
    pub fn txn_expired(index: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::TxnExpired,
            message: "cursor used after its transaction ended".to_string(),
            index: Some(index.into()),
            key: None,
        }
    }

    /// Unexpected store failure
    pub fn storage_engine(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::StorageEngine,
            message: reason.into(),
            index: Some(index.into()),
            key: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> EngineErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the index namespace, if index-scoped
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Returns the offending key, for duplicate-key violations
    pub fn key(&self) -> Option<&IndexKey> {
        self.key.as_ref()
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code.code(), self.message)?;
        if let Some(index) = &self.index {
            write!(f, " (index: {})", index)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {:?})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::KeyElement;

    #[test]
    fn test_error_codes_match_errors_md() {
        assert_eq!(EngineErrorCode::StorageOpen.code(), "ORDEX_STORAGE_OPEN");
        assert_eq!(EngineErrorCode::DuplicateKey.code(), "ORDEX_DUPLICATE_KEY");
        assert_eq!(EngineErrorCode::KeyExtraction.code(), "ORDEX_KEY_EXTRACTION");
        assert_eq!(EngineErrorCode::MalformedKey.code(), "ORDEX_MALFORMED_KEY");
        assert_eq!(EngineErrorCode::IllegalState.code(), "ORDEX_ILLEGAL_STATE");
        assert_eq!(EngineErrorCode::TxnExpired.code(), "ORDEX_TXN_EXPIRED");
        assert_eq!(EngineErrorCode::StorageEngine.code(), "ORDEX_STORAGE_ENGINE");
    }

    #[test]
    fn test_only_write_conflicts_are_recoverable() {
        assert_eq!(EngineErrorCode::DuplicateKey.severity(), Severity::Error);
        assert_eq!(EngineErrorCode::KeyExtraction.severity(), Severity::Error);
        for fatal in [
            EngineErrorCode::StorageOpen,
            EngineErrorCode::MalformedKey,
            EngineErrorCode::IllegalState,
            EngineErrorCode::TxnExpired,
            EngineErrorCode::StorageEngine,
        ] {
            assert_eq!(fatal.severity(), Severity::Fatal);
        }
    }

    #[test]
    fn test_duplicate_key_carries_context() {
        let key = IndexKey::single(KeyElement::Int(1));
        let err = EngineError::duplicate_key("db.users.$email_1", key.clone());

        assert_eq!(err.index(), Some("db.users.$email_1"));
        assert_eq!(err.key(), Some(&key));

        let display = format!("{}", err);
        assert!(display.contains("ORDEX_DUPLICATE_KEY"));
        assert!(display.contains("db.users.$email_1"));
    }
}
