//! Transaction context for ordex
//!
//! Every store-facing operation takes an explicit `&TransactionContext`
//! instead of reading connection-local state, so the dependency is visible in
//! each operation's type and testable without a background runtime. The
//! engine only ever borrows a context; it is created, committed and aborted
//! by the store that issued it.
//!
//! The context carries a shared active flag. Cursors hold a clone of the
//! flag and refuse to advance once the transaction has committed or aborted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A single undo record for one dictionary write.
///
/// `prior` is the value the key held before the write (`None` when the key
/// was absent). Aborting replays undo records in reverse order.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    /// Dictionary the write landed in
    pub dictionary_id: String,
    /// Physical key that was written or deleted
    pub key: Vec<u8>,
    /// Value before the write, if any
    pub prior: Option<Vec<u8>>,
}

/// Handle to one active transaction.
///
/// Borrowed by every engine operation, owned by its issuing store. At most
/// one context is active per worker at a time; the engine never creates,
/// commits or aborts one.
#[derive(Debug)]
pub struct TransactionContext {
    id: u64,
    active: Arc<AtomicBool>,
    undo: Mutex<Vec<UndoRecord>>,
}

impl TransactionContext {
    /// Create an active context with the given id.
    ///
    /// Called by store implementations from their `begin` path.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            active: Arc::new(AtomicBool::new(true)),
            undo: Mutex::new(Vec::new()),
        }
    }

    /// Transaction id, monotonically assigned by the issuing store
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True until the transaction commits or aborts
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Shared view of the active flag, for cursors that outlive the borrow
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    /// Record the prior state of a key so an abort can restore it
    pub fn push_undo(&self, record: UndoRecord) {
        // A poisoned log is still the best record of what to undo.
        self.undo
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record);
    }

    /// Mark the transaction finished and drain the undo log.
    ///
    /// Store commit paths discard the returned records; abort paths replay
    /// them in reverse. Draining twice returns an empty log.
    pub fn finish(&self) -> Vec<UndoRecord> {
        self.active.store(false, Ordering::Release);
        std::mem::take(
            &mut *self
                .undo
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_active() {
        let txn = TransactionContext::new(1);
        assert!(txn.is_active());
        assert_eq!(txn.id(), 1);
    }

    #[test]
    fn test_finish_deactivates_and_drains() {
        let txn = TransactionContext::new(2);
        txn.push_undo(UndoRecord {
            dictionary_id: "db.coll.$a_1".to_string(),
            key: vec![1, 2, 3],
            prior: None,
        });

        let undo = txn.finish();
        assert_eq!(undo.len(), 1);
        assert!(!txn.is_active());

        // Second drain is empty.
        assert!(txn.finish().is_empty());
    }

    #[test]
    fn test_active_flag_is_shared() {
        let txn = TransactionContext::new(3);
        let flag = txn.active_flag();
        assert!(flag.load(std::sync::atomic::Ordering::Acquire));

        txn.finish();
        assert!(!flag.load(std::sync::atomic::Ordering::Acquire));
    }
}
