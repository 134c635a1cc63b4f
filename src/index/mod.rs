//! Index engine for ordex
//!
//! One engine instance per open index. The engine owns the index's storage
//! dictionary, shares its specification, and implements the write and scan
//! paths against the transactional store:
//!
//! - `IndexEngine::open(...)` - Open or create an index
//! - `insert(txn, doc, pk, overwrite_allowed)` - Index a document
//! - `remove(txn, doc, pk)` - Unindex a document (idempotent)
//! - `cursor(txn)` - Ordered scan bound to a transaction
//! - `drop_index(store)` - Remove dictionary and catalog entry together
//!
//! Physical layouts (fixed at creation):
//!
//! | kind | physical key | value |
//! |---|---|---|
//! | id | secondary key | full document |
//! | clustering | secondary key + primary key | full document |
//! | plain | secondary key + primary key | empty |

mod cursor;
mod engine;
mod errors;

pub use cursor::{IndexEntry, OrderedCursor};
pub use engine::IndexEngine;
pub use errors::{EngineError, EngineErrorCode, EngineResult, Severity};
