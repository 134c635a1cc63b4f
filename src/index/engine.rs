//! The index engine
//!
//! Owns one storage dictionary and one specification per index. All writes
//! run inside a caller-supplied transaction; the engine never begins,
//! commits or aborts one, and never rolls back its own partial work — a
//! failed multi-key insert is undone by the caller aborting the
//! transaction.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::cursor::OrderedCursor;
use super::errors::{EngineError, EngineResult};
use crate::catalog::Catalog;
use crate::codec::{self, IndexKey};
use crate::observability::{Logger, Severity};
use crate::spec::{IndexDeclaration, IndexSpec, SpecCache};
use crate::store::{StorageDictionary, StoreError, TransactionalStore};
use crate::txn::TransactionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    Closed,
}

/// Engine for one open index.
///
/// The dictionary handle is exclusively owned and closed exactly once, on
/// `close` or `drop_index`; an engine instance is not reopenable.
pub struct IndexEngine {
    spec: Arc<IndexSpec>,
    dictionary: StorageDictionary,
    catalog: Arc<dyn Catalog>,
    cache: Arc<SpecCache>,
    state: Lifecycle,
}

impl fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexEngine")
            .field("index", &self.dictionary.id())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl IndexEngine {
    /// Open an index, creating its dictionary when `create_if_missing` is
    /// set.
    ///
    /// A catalog entry is registered only when the dictionary itself was
    /// newly created; reopening an existing index leaves the catalog
    /// untouched. Creation also evicts the collection's cached specs, since
    /// its index set changed. If registration fails, the just-created
    /// dictionary is dropped again before the error is returned.
    pub fn open(
        store: &dyn TransactionalStore,
        catalog: Arc<dyn Catalog>,
        cache: Arc<SpecCache>,
        declaration: IndexDeclaration,
        create_if_missing: bool,
    ) -> EngineResult<Self> {
        let index_ns = declaration.index_namespace();

        let opened = store
            .open_dictionary(&index_ns, create_if_missing)
            .map_err(|err| match err {
                StoreError::DictionaryNotFound(_) => {
                    EngineError::storage_open(index_ns.clone(), err.to_string())
                }
                other => EngineError::storage_engine(index_ns.clone(), other.to_string()),
            })?;

        if opened.created {
            if let Err(err) = catalog.register_index(declaration.clone()) {
                // Mirror the drop path's compensation: don't leave a
                // dictionary behind that the catalog never learned about.
                let _ = opened.dictionary.close();
                if let Err(drop_err) = store.drop_dictionary(&index_ns) {
                    Logger::index_event(
                        Severity::Fatal,
                        "index_open_cleanup_failed",
                        &index_ns,
                        &[("reason", &drop_err.to_string())],
                    );
                }
                return Err(EngineError::storage_engine(index_ns, err.to_string()));
            }
            cache.evict(declaration.ns());
        }

        Logger::index_event(
            Severity::Info,
            "index_open",
            &index_ns,
            &[("created", if opened.created { "true" } else { "false" })],
        );

        Ok(Self {
            spec: Arc::new(IndexSpec::from_declaration(declaration)),
            dictionary: StorageDictionary::new(index_ns, opened.dictionary),
            catalog,
            cache,
            state: Lifecycle::Open,
        })
    }

    /// Index namespace, e.g. `db.users.$email_1`
    pub fn index_namespace(&self) -> &str {
        self.dictionary.id()
    }

    /// Parent collection namespace
    pub fn collection_namespace(&self) -> &str {
        self.spec.declaration().ns()
    }

    /// Index name
    pub fn name(&self) -> &str {
        self.spec.declaration().name()
    }

    /// The shared specification for this index
    pub fn spec(&self) -> &Arc<IndexSpec> {
        &self.spec
    }

    /// True when duplicate secondary keys are rejected
    pub fn is_unique(&self) -> bool {
        self.spec.is_unique()
    }

    /// True when entries carry the full document
    pub fn is_clustering(&self) -> bool {
        self.spec.is_clustering()
    }

    /// True for the collection's id index
    pub fn is_id_index(&self) -> bool {
        self.spec.is_id_index()
    }

    /// Position of a field in the key pattern
    pub fn key_offset_of(&self, field: &str) -> Option<usize> {
        self.spec.key_offset_of(field)
    }

    /// Current multikey bit from the catalog
    pub fn is_multikey(&self) -> EngineResult<bool> {
        self.catalog
            .is_multikey(self.collection_namespace(), self.name())
            .map_err(|err| self.storage_err(err.to_string()))
    }

    /// Extract this index's secondary keys from a document.
    ///
    /// Duplicate keys collapse; more than one key in the result marks the
    /// index multikey on the next insert.
    pub fn derive_keys(&self, document: &Value) -> EngineResult<BTreeSet<IndexKey>> {
        self.spec
            .extract_keys(document)
            .map_err(|err| EngineError::key_extraction(self.index_namespace(), err.to_string()))
    }

    /// Index a document.
    ///
    /// One physical entry is written per derived key, laid out per the
    /// index kind. Unique indexes reject an existing secondary key: the id
    /// index through the store's no-overwrite put, the rest through a
    /// prefix probe before each put. The first conflicting key fails the
    /// whole call with ORDEX_DUPLICATE_KEY and earlier puts from this call
    /// are left for the transaction abort to undo.
    pub fn insert(
        &self,
        txn: &TransactionContext,
        document: &Value,
        primary_key: &IndexKey,
        overwrite_allowed: bool,
    ) -> EngineResult<()> {
        self.ensure_open()?;
        self.ensure_active(txn)?;

        let keys = self.derive_keys(document)?;
        if keys.len() > 1 {
            self.mark_multikey(keys.len())?;
        }

        let document_bytes = if self.is_id_index() || self.is_clustering() {
            serde_json::to_vec(document)
                .map_err(|err| self.storage_err(format!("document serialization: {}", err)))?
        } else {
            Vec::new()
        };
        let no_overwrite = self.is_unique() && !overwrite_allowed;

        for key in &keys {
            // The id index has no primary-key suffix, so the store's
            // no-overwrite put detects its conflicts directly. For other
            // unique indexes the suffix makes every physical key distinct;
            // conflicts on the secondary key are probed by prefix instead.
            if no_overwrite && !self.is_id_index() {
                self.ensure_no_duplicate(txn, key)?;
            }
            let physical = self.physical_key(key, primary_key);
            self.dictionary
                .put(txn, &physical, &document_bytes, no_overwrite)
                .map_err(|err| match err {
                    StoreError::Conflict { .. } => {
                        EngineError::duplicate_key(self.index_namespace(), key.clone())
                    }
                    other => {
                        Logger::index_event(
                            Severity::Fatal,
                            "storage_engine_error",
                            self.index_namespace(),
                            &[("op", "put"), ("reason", &other.to_string())],
                        );
                        self.storage_err(other.to_string())
                    }
                })?;
        }
        Ok(())
    }

    /// Unindex a document.
    ///
    /// Recomputes the keys from the document (callers must supply the same
    /// shape that was indexed) and deletes each physical entry. Deleting an
    /// absent entry succeeds silently: during partial-failure recovery or
    /// out-of-order replay a delete may arrive after the entry is gone.
    pub fn remove(
        &self,
        txn: &TransactionContext,
        document: &Value,
        primary_key: &IndexKey,
    ) -> EngineResult<()> {
        self.ensure_open()?;
        self.ensure_active(txn)?;

        let keys = self.derive_keys(document)?;
        for key in &keys {
            let physical = self.physical_key(key, primary_key);
            self.dictionary
                .delete(txn, &physical, true)
                .map_err(|err| {
                    Logger::index_event(
                        Severity::Fatal,
                        "storage_engine_error",
                        self.index_namespace(),
                        &[("op", "delete"), ("reason", &err.to_string())],
                    );
                    self.storage_err(err.to_string())
                })?;
        }
        Ok(())
    }

    /// Ordered scan over the index, bound to `txn`.
    ///
    /// The cursor must not outlive the transaction; it rejects every
    /// advance after the transaction ends.
    pub fn cursor(&self, txn: &TransactionContext) -> EngineResult<OrderedCursor> {
        self.ensure_open()?;
        if !txn.is_active() {
            return Err(EngineError::illegal_state(
                "cursor requires an active transaction",
            ));
        }
        let inner = self
            .dictionary
            .cursor(txn)
            .map_err(|err| self.storage_err(err.to_string()))?;
        Ok(OrderedCursor::new(
            inner,
            Arc::clone(&self.spec),
            self.index_namespace().to_string(),
            txn.active_flag(),
        ))
    }

    /// Close the engine. One-shot: a second close is a programming error.
    pub fn close(&mut self) -> EngineResult<()> {
        if self.state == Lifecycle::Closed {
            return Err(EngineError::illegal_state("index engine already closed"));
        }
        let index_ns = self.index_namespace().to_string();
        self.dictionary
            .close()
            .map_err(|err| EngineError::storage_engine(index_ns.clone(), err.to_string()))?;
        self.state = Lifecycle::Closed;
        Logger::index_event(Severity::Info, "index_close", &index_ns, &[]);
        Ok(())
    }

    /// Drop the index: evict the collection's cached specs, deregister the
    /// catalog entry, and remove the physical dictionary, as one logical
    /// unit.
    ///
    /// The catalog row is removed before the dictionary so a partial
    /// failure can only leave an orphan dictionary, never a catalog entry
    /// pointing at a missing one. If the physical drop fails, the captured
    /// declaration is re-registered to compensate.
    pub fn drop_index(mut self, store: &dyn TransactionalStore) -> EngineResult<()> {
        if self.state == Lifecycle::Closed {
            return Err(EngineError::illegal_state("index engine already closed"));
        }
        let index_ns = self.index_namespace().to_string();
        let collection_ns = self.collection_namespace().to_string();
        let name = self.name().to_string();

        self.dictionary
            .close()
            .map_err(|err| EngineError::storage_engine(index_ns.clone(), err.to_string()))?;
        self.state = Lifecycle::Closed;

        self.cache.evict(&collection_ns);

        // Exactly one catalog row must go away.
        let declaration = self
            .catalog
            .deregister_index(&collection_ns, &name)
            .map_err(|err| {
                EngineError::storage_engine(
                    index_ns.clone(),
                    format!("catalog did not remove exactly one row: {}", err),
                )
            })?;

        if let Err(err) = store.drop_dictionary(&index_ns) {
            // Compensate: restore the catalog entry so catalog and store
            // keep agreeing on the index's existence.
            if let Err(restore_err) = self.catalog.register_index(declaration) {
                Logger::index_event(
                    Severity::Fatal,
                    "index_drop_compensation_failed",
                    &index_ns,
                    &[("reason", &restore_err.to_string())],
                );
            }
            return Err(EngineError::storage_engine(index_ns, err.to_string()));
        }

        Logger::index_event(Severity::Info, "index_drop", &index_ns, &[]);
        Ok(())
    }

    /// Fail with ORDEX_DUPLICATE_KEY if any stored entry's key starts with
    /// this secondary key's encoding.
    ///
    /// The element encoding is prefix-free and every key in one index has
    /// the same arity, so a prefix match means an equal secondary key.
    fn ensure_no_duplicate(&self, txn: &TransactionContext, key: &IndexKey) -> EngineResult<()> {
        let prefix = codec::encode(key, None);
        let mut probe = self
            .dictionary
            .cursor_from(txn, &prefix)
            .map_err(|err| self.storage_err(err.to_string()))?;
        if let Some((existing, _)) = probe
            .next_entry()
            .map_err(|err| self.storage_err(err.to_string()))?
        {
            if existing.starts_with(&prefix) {
                return Err(EngineError::duplicate_key(
                    self.index_namespace(),
                    key.clone(),
                ));
            }
        }
        Ok(())
    }

    fn physical_key(&self, key: &IndexKey, primary_key: &IndexKey) -> Vec<u8> {
        if self.is_id_index() {
            codec::encode(key, None)
        } else {
            codec::encode(key, Some(primary_key))
        }
    }

    fn mark_multikey(&self, key_count: usize) -> EngineResult<()> {
        let collection_ns = self.collection_namespace();
        let name = self.name();
        let already = self
            .catalog
            .is_multikey(collection_ns, name)
            .map_err(|err| self.storage_err(err.to_string()))?;
        if !already {
            self.catalog
                .set_multikey(collection_ns, name)
                .map_err(|err| self.storage_err(err.to_string()))?;
            Logger::index_event(
                Severity::Info,
                "index_multikey",
                self.index_namespace(),
                &[("keys", &key_count.to_string())],
            );
        }
        Ok(())
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.state == Lifecycle::Open {
            Ok(())
        } else {
            Err(EngineError::illegal_state("index engine is closed"))
        }
    }

    fn ensure_active(&self, txn: &TransactionContext) -> EngineResult<()> {
        if txn.is_active() {
            Ok(())
        } else {
            Err(EngineError::illegal_state(
                "operation requires an active transaction",
            ))
        }
    }

    fn storage_err(&self, reason: String) -> EngineError {
        EngineError::storage_engine(self.index_namespace(), reason)
    }
}
