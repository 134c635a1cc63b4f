//! Codec error types
//!
//! A decode failure means the bytes in the dictionary do not match the codec,
//! which is either data corruption or a codec mismatch. Per ERRORS.md these
//! all surface under the ORDEX_MALFORMED_KEY code and are FATAL: they are
//! logged and propagated, never retried.

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while decoding a physical key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Byte at `offset` is not a known element tag
    #[error("unknown element tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// Key ended in the middle of an element
    #[error("truncated element at offset {offset}")]
    Truncated { offset: usize },

    /// String element payload is not valid UTF-8
    #[error("invalid utf-8 in string element at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Bytes remained after the expected elements were decoded
    #[error("{remaining} trailing bytes after final element")]
    TrailingBytes { remaining: usize },

    /// A key must contain at least one element
    #[error("empty key")]
    EmptyKey,
}

impl CodecError {
    /// Returns the error code as defined in ERRORS.md
    pub fn code(&self) -> &'static str {
        "ORDEX_MALFORMED_KEY"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_code_for_all_variants() {
        let errors = [
            CodecError::UnknownTag { tag: 0xff, offset: 0 },
            CodecError::Truncated { offset: 3 },
            CodecError::InvalidUtf8 { offset: 1 },
            CodecError::TrailingBytes { remaining: 2 },
            CodecError::EmptyKey,
        ];
        for err in errors {
            assert_eq!(err.code(), "ORDEX_MALFORMED_KEY");
        }
    }

    #[test]
    fn test_display_names_offset() {
        let err = CodecError::Truncated { offset: 9 };
        assert!(err.to_string().contains("offset 9"));
    }
}
