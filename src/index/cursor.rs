//! Ordered index cursor
//!
//! Wraps a store cursor, decoding each physical entry back into its
//! (secondary key, primary key, value) form. The cursor is bound to the
//! transaction it was created in: once that transaction commits or aborts,
//! every further advance fails with ORDEX_TXN_EXPIRED.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use super::errors::{EngineError, EngineResult};
use crate::codec::{self, IndexKey};
use crate::observability::{Logger, Severity};
use crate::spec::IndexSpec;
use crate::store::StoreCursor;

/// One decoded index entry.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Secondary key, in pattern order
    pub secondary: IndexKey,
    /// Primary key suffix; `None` for the id index
    pub primary: Option<IndexKey>,
    /// Stored document for id and clustering indexes, `None` for plain ones
    pub document: Option<Value>,
}

/// Forward scan over an index in encoded-key order.
pub struct OrderedCursor {
    inner: Box<dyn StoreCursor>,
    spec: Arc<IndexSpec>,
    index_namespace: String,
    txn_active: Arc<AtomicBool>,
}

impl fmt::Debug for OrderedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedCursor")
            .field("index", &self.index_namespace)
            .field("txn_active", &self.txn_active.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl OrderedCursor {
    pub(super) fn new(
        inner: Box<dyn StoreCursor>,
        spec: Arc<IndexSpec>,
        index_namespace: String,
        txn_active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            inner,
            spec,
            index_namespace,
            txn_active,
        }
    }

    /// Next entry in key order, or `None` at the end of the index.
    pub fn next_entry(&mut self) -> EngineResult<Option<IndexEntry>> {
        if !self.txn_active.load(Ordering::Acquire) {
            return Err(EngineError::txn_expired(self.index_namespace.clone()));
        }

        let Some((key_bytes, value_bytes)) = self
            .inner
            .next_entry()
            .map_err(|err| EngineError::storage_engine(self.index_namespace.clone(), err.to_string()))?
        else {
            return Ok(None);
        };

        let has_primary = !self.spec.is_id_index();
        let (secondary, primary) =
            codec::decode(&key_bytes, self.spec.pattern_len(), has_primary).map_err(|err| {
                Logger::index_event(
                    Severity::Fatal,
                    "malformed_index_key",
                    &self.index_namespace,
                    &[("reason", &err.to_string())],
                );
                EngineError::malformed_key(self.index_namespace.clone(), err.to_string())
            })?;

        let document = if value_bytes.is_empty() {
            None
        } else {
            let doc = serde_json::from_slice(&value_bytes).map_err(|err| {
                Logger::index_event(
                    Severity::Fatal,
                    "malformed_index_value",
                    &self.index_namespace,
                    &[("reason", &err.to_string())],
                );
                EngineError::malformed_key(
                    self.index_namespace.clone(),
                    format!("value payload is not a document: {}", err),
                )
            })?;
            Some(doc)
        };

        Ok(Some(IndexEntry {
            secondary,
            primary,
            document,
        }))
    }
}
