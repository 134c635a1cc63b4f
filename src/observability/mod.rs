//! Observability for ordex
//!
//! Structured JSON logging only. The engine logs lifecycle transitions
//! (open, close, drop), multikey flips, and fatal storage or codec failures;
//! metrics and tracing belong to the embedding process.

mod logger;

pub use logger::{Logger, Severity};
