//! Scoped dictionary ownership
//!
//! `StorageDictionary` binds a raw dictionary handle to the engine's
//! lifetime: one owner, never copied, closed exactly once whether the engine
//! exits normally, fails early, or is simply dropped.

use super::errors::{StoreError, StoreResult};
use super::traits::{Dictionary, StoreCursor};
use crate::txn::TransactionContext;

/// Owned handle over one physical dictionary.
///
/// All engine I/O for an index flows through this wrapper. After `close`
/// every operation fails with `StoreError::HandleClosed`.
pub struct StorageDictionary {
    id: String,
    inner: Option<Box<dyn Dictionary>>,
}

impl StorageDictionary {
    /// Wrap a freshly opened dictionary handle
    pub fn new(id: impl Into<String>, inner: Box<dyn Dictionary>) -> Self {
        Self {
            id: id.into(),
            inner: Some(inner),
        }
    }

    /// Dictionary identifier, e.g. `db.users.$email_1`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True once `close` has run
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn handle(&self) -> StoreResult<&dyn Dictionary> {
        self.inner.as_deref().ok_or(StoreError::HandleClosed)
    }

    /// Insert or overwrite a key (see [`Dictionary::put`])
    pub fn put(
        &self,
        txn: &TransactionContext,
        key: &[u8],
        value: &[u8],
        no_overwrite: bool,
    ) -> StoreResult<()> {
        self.handle()?.put(txn, key, value, no_overwrite)
    }

    /// Point lookup
    pub fn get(&self, txn: &TransactionContext, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.handle()?.get(txn, key)
    }

    /// Delete a key (see [`Dictionary::delete`])
    pub fn delete(
        &self,
        txn: &TransactionContext,
        key: &[u8],
        missing_ok: bool,
    ) -> StoreResult<()> {
        self.handle()?.delete(txn, key, missing_ok)
    }

    /// Ordered cursor bound to the transaction
    pub fn cursor(&self, txn: &TransactionContext) -> StoreResult<Box<dyn StoreCursor>> {
        self.handle()?.cursor(txn)
    }

    /// Ordered cursor positioned at the first key >= `lower_bound`
    pub fn cursor_from(
        &self,
        txn: &TransactionContext,
        lower_bound: &[u8],
    ) -> StoreResult<Box<dyn StoreCursor>> {
        self.handle()?.cursor_from(txn, lower_bound)
    }

    /// Close the handle. A second close fails with `HandleClosed`.
    pub fn close(&mut self) -> StoreResult<()> {
        match self.inner.take() {
            Some(handle) => handle.close(),
            None => Err(StoreError::HandleClosed),
        }
    }
}

impl Drop for StorageDictionary {
    fn drop(&mut self) {
        // Covers early-failure paths where the engine never reached close().
        if let Some(handle) = self.inner.take() {
            let _ = handle.close();
        }
    }
}
