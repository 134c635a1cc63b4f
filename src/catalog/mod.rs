//! Catalog bridge for ordex
//!
//! The catalog owns index metadata: which indexes exist on a collection and
//! the per-index multikey bit. The engine registers an entry when it creates
//! a dictionary, deregisters it on drop, and flips the multikey bit the
//! first time a document produces more than one key. The bit is never
//! cleared here; only an index rebuild resets it.
//!
//! Production embedders back this trait with their real catalog;
//! `MemoryCatalog` serves tests and single-process setups.

mod errors;

pub use errors::{CatalogError, CatalogResult};

use std::collections::HashMap;
use std::sync::Mutex;

use crate::spec::IndexDeclaration;

/// Index metadata registry consumed by the engine.
pub trait Catalog: Send + Sync {
    /// Register a newly created index. Fails if an index with the same
    /// (namespace, name) identity already exists.
    fn register_index(&self, declaration: IndexDeclaration) -> CatalogResult<()>;

    /// Remove an index entry, returning the removed declaration.
    ///
    /// Exactly one row is removed per call; a missing entry fails with
    /// `CatalogError::IndexNotFound`.
    fn deregister_index(&self, ns: &str, name: &str) -> CatalogResult<IndexDeclaration>;

    /// Durably set the multikey bit for (namespace, index)
    fn set_multikey(&self, ns: &str, name: &str) -> CatalogResult<()>;

    /// Current multikey bit
    fn is_multikey(&self, ns: &str, name: &str) -> CatalogResult<bool>;

    /// Stored declaration for one index, if registered
    fn get_declaration(&self, ns: &str, name: &str) -> CatalogResult<Option<IndexDeclaration>>;

    /// All declarations for a collection, in registration order
    fn declarations_for(&self, ns: &str) -> CatalogResult<Vec<IndexDeclaration>>;
}

struct CatalogEntry {
    declaration: IndexDeclaration,
    multikey: bool,
}

/// In-memory implementation of [`Catalog`].
#[derive(Default)]
pub struct MemoryCatalog {
    // Keyed by (namespace, index name); insertion order is tracked
    // separately so declarations_for is deterministic.
    entries: Mutex<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    by_identity: HashMap<(String, String), CatalogEntry>,
    order: Vec<(String, String)>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CatalogResult<std::sync::MutexGuard<'_, CatalogState>> {
        self.entries
            .lock()
            .map_err(|_| CatalogError::LockPoisoned("catalog entries".to_string()))
    }
}

impl Catalog for MemoryCatalog {
    fn register_index(&self, declaration: IndexDeclaration) -> CatalogResult<()> {
        let identity = (
            declaration.ns().to_string(),
            declaration.name().to_string(),
        );
        let mut state = self.lock()?;
        if state.by_identity.contains_key(&identity) {
            return Err(CatalogError::DuplicateIndex {
                ns: identity.0,
                name: identity.1,
            });
        }
        state.order.push(identity.clone());
        state.by_identity.insert(
            identity,
            CatalogEntry {
                declaration,
                multikey: false,
            },
        );
        Ok(())
    }

    fn deregister_index(&self, ns: &str, name: &str) -> CatalogResult<IndexDeclaration> {
        let identity = (ns.to_string(), name.to_string());
        let mut state = self.lock()?;
        let entry = state
            .by_identity
            .remove(&identity)
            .ok_or_else(|| CatalogError::IndexNotFound {
                ns: ns.to_string(),
                name: name.to_string(),
            })?;
        state.order.retain(|id| *id != identity);
        Ok(entry.declaration)
    }

    fn set_multikey(&self, ns: &str, name: &str) -> CatalogResult<()> {
        let mut state = self.lock()?;
        let entry = state
            .by_identity
            .get_mut(&(ns.to_string(), name.to_string()))
            .ok_or_else(|| CatalogError::IndexNotFound {
                ns: ns.to_string(),
                name: name.to_string(),
            })?;
        entry.multikey = true;
        Ok(())
    }

    fn is_multikey(&self, ns: &str, name: &str) -> CatalogResult<bool> {
        let state = self.lock()?;
        state
            .by_identity
            .get(&(ns.to_string(), name.to_string()))
            .map(|entry| entry.multikey)
            .ok_or_else(|| CatalogError::IndexNotFound {
                ns: ns.to_string(),
                name: name.to_string(),
            })
    }

    fn get_declaration(&self, ns: &str, name: &str) -> CatalogResult<Option<IndexDeclaration>> {
        let state = self.lock()?;
        Ok(state
            .by_identity
            .get(&(ns.to_string(), name.to_string()))
            .map(|entry| entry.declaration.clone()))
    }

    fn declarations_for(&self, ns: &str) -> CatalogResult<Vec<IndexDeclaration>> {
        let state = self.lock()?;
        Ok(state
            .order
            .iter()
            .filter(|(entry_ns, _)| entry_ns == ns)
            .filter_map(|id| state.by_identity.get(id))
            .map(|entry| entry.declaration.clone())
            .collect())
    }
}
