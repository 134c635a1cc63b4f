//! Transactional-store traits
//!
//! The minimal contract an embedded storage engine must satisfy to host
//! index dictionaries. Implementations provide their own concurrency control
//! and durability; the index layer only relies on the operations below.

use std::fmt;

use super::errors::StoreResult;
use crate::txn::TransactionContext;

/// Result of opening a dictionary: the handle plus whether the open created
/// it. The engine registers a catalog entry only for newly created
/// dictionaries.
pub struct OpenedDictionary {
    /// Handle to the physical dictionary
    pub dictionary: Box<dyn Dictionary>,
    /// True when the open call created the dictionary
    pub created: bool,
}

impl fmt::Debug for OpenedDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedDictionary")
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

/// One physical ordered key-value dictionary inside the store.
///
/// Handles are exclusively owned; the engine wraps one in a
/// [`super::StorageDictionary`] for its lifetime.
pub trait Dictionary: Send + Sync {
    /// Insert or overwrite a key.
    ///
    /// With `no_overwrite` set, an existing key fails with
    /// `StoreError::Conflict` and leaves the dictionary unchanged. The put
    /// is atomic per key.
    fn put(
        &self,
        txn: &TransactionContext,
        key: &[u8],
        value: &[u8],
        no_overwrite: bool,
    ) -> StoreResult<()>;

    /// Point lookup
    fn get(&self, txn: &TransactionContext, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Delete a key.
    ///
    /// With `missing_ok` set, deleting an absent key succeeds silently;
    /// otherwise it fails with `StoreError::KeyNotFound`.
    fn delete(&self, txn: &TransactionContext, key: &[u8], missing_ok: bool) -> StoreResult<()>;

    /// Ordered cursor over the dictionary, bound to the transaction.
    ///
    /// The cursor's lifetime must not exceed the transaction's.
    fn cursor(&self, txn: &TransactionContext) -> StoreResult<Box<dyn StoreCursor>>;

    /// Ordered cursor positioned at the first key >= `lower_bound`.
    ///
    /// Uniqueness checks use this to probe for an existing entry whose key
    /// starts with a given secondary-key prefix.
    fn cursor_from(
        &self,
        txn: &TransactionContext,
        lower_bound: &[u8],
    ) -> StoreResult<Box<dyn StoreCursor>>;

    /// Release backend resources for this handle. Called exactly once, by
    /// the owning wrapper.
    fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Forward-only cursor over a dictionary's entries in key order.
pub trait StoreCursor: Send {
    /// Next (key, value) entry, or `None` at the end
    fn next_entry(&mut self) -> StoreResult<Option<(Vec<u8>, Vec<u8>)>>;
}

/// An embedded transactional store hosting index dictionaries.
pub trait TransactionalStore: Send + Sync {
    /// Open a dictionary, creating it when `create_if_missing` is set.
    ///
    /// Fails with `StoreError::DictionaryNotFound` when the dictionary does
    /// not exist and creation was not requested.
    fn open_dictionary(&self, id: &str, create_if_missing: bool) -> StoreResult<OpenedDictionary>;

    /// Remove a dictionary and all its entries
    fn drop_dictionary(&self, id: &str) -> StoreResult<()>;

    /// Begin a transaction. The caller owns the returned context and must
    /// eventually commit or abort it.
    fn begin(&self) -> TransactionContext;

    /// Commit: make the transaction's writes permanent
    fn commit(&self, txn: &TransactionContext) -> StoreResult<()>;

    /// Abort: undo the transaction's writes
    fn abort(&self, txn: &TransactionContext) -> StoreResult<()>;
}
