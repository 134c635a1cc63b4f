//! In-memory transactional store
//!
//! Reference backend: ordered dictionaries over `BTreeMap`, transactions
//! with an undo log, no-overwrite conflict detection, snapshot cursors.
//! Embedders use it for tests and single-process setups; production deploys
//! put a real storage engine behind [`TransactionalStore`].
//!
//! Writes apply immediately and record their prior state on the
//! transaction; abort replays the records in reverse. Cursors snapshot the
//! dictionary at creation time, so they observe the transaction's own
//! writes made before the cursor was opened.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::errors::{StoreError, StoreResult};
use super::traits::{Dictionary, OpenedDictionary, StoreCursor, TransactionalStore};
use crate::txn::{TransactionContext, UndoRecord};

type DictionaryData = Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>;

/// In-memory implementation of [`TransactionalStore`].
#[derive(Default)]
pub struct MemoryStore {
    dictionaries: RwLock<HashMap<String, DictionaryData>>,
    next_txn_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            dictionaries: RwLock::new(HashMap::new()),
            next_txn_id: AtomicU64::new(1),
        }
    }

    /// True when a dictionary with this id exists
    pub fn dictionary_exists(&self, id: &str) -> bool {
        self.dictionaries
            .read()
            .map(|dicts| dicts.contains_key(id))
            .unwrap_or(false)
    }

    fn poisoned(what: &str) -> StoreError {
        StoreError::LockPoisoned(what.to_string())
    }
}

impl TransactionalStore for MemoryStore {
    fn open_dictionary(&self, id: &str, create_if_missing: bool) -> StoreResult<OpenedDictionary> {
        let mut dicts = self
            .dictionaries
            .write()
            .map_err(|_| Self::poisoned("dictionary registry"))?;

        let (data, created) = match dicts.get(id) {
            Some(existing) => (Arc::clone(existing), false),
            None => {
                if !create_if_missing {
                    return Err(StoreError::DictionaryNotFound(id.to_string()));
                }
                let data: DictionaryData = Arc::new(RwLock::new(BTreeMap::new()));
                dicts.insert(id.to_string(), Arc::clone(&data));
                (data, true)
            }
        };

        Ok(OpenedDictionary {
            dictionary: Box::new(MemoryDictionary {
                id: id.to_string(),
                data,
            }),
            created,
        })
    }

    fn drop_dictionary(&self, id: &str) -> StoreResult<()> {
        let mut dicts = self
            .dictionaries
            .write()
            .map_err(|_| Self::poisoned("dictionary registry"))?;
        dicts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::DictionaryNotFound(id.to_string()))
    }

    fn begin(&self) -> TransactionContext {
        TransactionContext::new(self.next_txn_id.fetch_add(1, Ordering::Relaxed))
    }

    fn commit(&self, txn: &TransactionContext) -> StoreResult<()> {
        if !txn.is_active() {
            return Err(StoreError::TransactionInactive(txn.id()));
        }
        // Writes are already applied; committing just discards the undo log.
        txn.finish();
        Ok(())
    }

    fn abort(&self, txn: &TransactionContext) -> StoreResult<()> {
        if !txn.is_active() {
            return Err(StoreError::TransactionInactive(txn.id()));
        }
        let undo = txn.finish();
        let dicts = self
            .dictionaries
            .read()
            .map_err(|_| Self::poisoned("dictionary registry"))?;

        for record in undo.into_iter().rev() {
            // A dictionary dropped mid-transaction has nothing to restore.
            let Some(data) = dicts.get(&record.dictionary_id) else {
                continue;
            };
            let mut map = data
                .write()
                .map_err(|_| Self::poisoned("dictionary data"))?;
            match record.prior {
                Some(value) => {
                    map.insert(record.key, value);
                }
                None => {
                    map.remove(&record.key);
                }
            }
        }
        Ok(())
    }
}

struct MemoryDictionary {
    id: String,
    data: DictionaryData,
}

impl MemoryDictionary {
    fn check_active(&self, txn: &TransactionContext) -> StoreResult<()> {
        if txn.is_active() {
            Ok(())
        } else {
            Err(StoreError::TransactionInactive(txn.id()))
        }
    }
}

impl Dictionary for MemoryDictionary {
    fn put(
        &self,
        txn: &TransactionContext,
        key: &[u8],
        value: &[u8],
        no_overwrite: bool,
    ) -> StoreResult<()> {
        self.check_active(txn)?;
        let mut map = self
            .data
            .write()
            .map_err(|_| MemoryStore::poisoned("dictionary data"))?;

        if no_overwrite && map.contains_key(key) {
            return Err(StoreError::Conflict {
                dictionary: self.id.clone(),
            });
        }

        let prior = map.insert(key.to_vec(), value.to_vec());
        txn.push_undo(UndoRecord {
            dictionary_id: self.id.clone(),
            key: key.to_vec(),
            prior,
        });
        Ok(())
    }

    fn get(&self, txn: &TransactionContext, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.check_active(txn)?;
        let map = self
            .data
            .read()
            .map_err(|_| MemoryStore::poisoned("dictionary data"))?;
        Ok(map.get(key).cloned())
    }

    fn delete(&self, txn: &TransactionContext, key: &[u8], missing_ok: bool) -> StoreResult<()> {
        self.check_active(txn)?;
        let mut map = self
            .data
            .write()
            .map_err(|_| MemoryStore::poisoned("dictionary data"))?;

        match map.remove(key) {
            Some(prior) => {
                txn.push_undo(UndoRecord {
                    dictionary_id: self.id.clone(),
                    key: key.to_vec(),
                    prior: Some(prior),
                });
                Ok(())
            }
            None if missing_ok => Ok(()),
            None => Err(StoreError::KeyNotFound {
                dictionary: self.id.clone(),
            }),
        }
    }

    fn cursor(&self, txn: &TransactionContext) -> StoreResult<Box<dyn StoreCursor>> {
        self.check_active(txn)?;
        let map = self
            .data
            .read()
            .map_err(|_| MemoryStore::poisoned("dictionary data"))?;
        let entries: Vec<(Vec<u8>, Vec<u8>)> =
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        Ok(Box::new(MemoryCursor { entries, pos: 0 }))
    }

    fn cursor_from(
        &self,
        txn: &TransactionContext,
        lower_bound: &[u8],
    ) -> StoreResult<Box<dyn StoreCursor>> {
        self.check_active(txn)?;
        let map = self
            .data
            .read()
            .map_err(|_| MemoryStore::poisoned("dictionary data"))?;
        let entries: Vec<(Vec<u8>, Vec<u8>)> = map
            .range(lower_bound.to_vec()..)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(MemoryCursor { entries, pos: 0 }))
    }
}

struct MemoryCursor {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
}

impl StoreCursor for MemoryCursor {
    fn next_entry(&mut self) -> StoreResult<Option<(Vec<u8>, Vec<u8>)>> {
        if self.pos >= self.entries.len() {
            return Ok(None);
        }
        let entry = self.entries[self.pos].clone();
        self.pos += 1;
        Ok(Some(entry))
    }
}
