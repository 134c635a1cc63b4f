//! Specification cache
//!
//! One entry per collection namespace, holding the derived `IndexSpec`s for
//! every index on that collection. Entries are built lazily on the first
//! lookup after a miss and evicted whenever the collection's index set
//! changes.
//!
//! Single-flight: concurrent lookups for the same namespace run the builder
//! once; the other callers block on the entry's slot lock and receive the
//! same `Arc` identity. The registry lock is only held to find or insert a
//! slot, never while a builder runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::errors::{SpecError, SpecResult};
use super::IndexSpec;

/// The cached specs for one collection, in catalog registration order.
pub struct CollectionSpecs {
    specs: Vec<Arc<IndexSpec>>,
}

impl CollectionSpecs {
    fn new(specs: Vec<IndexSpec>) -> Self {
        Self {
            specs: specs.into_iter().map(Arc::new).collect(),
        }
    }

    /// All index specs on the collection
    pub fn specs(&self) -> &[Arc<IndexSpec>] {
        &self.specs
    }

    /// Spec for one index by name
    pub fn spec_for(&self, index_name: &str) -> Option<&Arc<IndexSpec>> {
        self.specs
            .iter()
            .find(|spec| spec.declaration().name() == index_name)
    }
}

impl fmt::Debug for CollectionSpecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .specs
            .iter()
            .map(|spec| spec.declaration().name())
            .collect();
        f.debug_struct("CollectionSpecs")
            .field("indexes", &names)
            .finish()
    }
}

/// A slot holds the (eventually) built specs for one namespace. Builders
/// hold the slot lock for the duration of the build, which is what blocks
/// concurrent readers of the same namespace.
struct Slot {
    built: Mutex<Option<Arc<CollectionSpecs>>>,
}

/// Shared, mutex-guarded specification cache.
pub struct SpecCache {
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl Default for SpecCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the collection's specs, building them with `builder` on a
    /// miss. Exactly one builder runs per namespace at a time; a failed
    /// build leaves no entry behind, so the next lookup retries.
    pub fn get_or_build<F>(&self, ns: &str, builder: F) -> SpecResult<Arc<CollectionSpecs>>
    where
        F: FnOnce() -> SpecResult<Vec<IndexSpec>>,
    {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| SpecError::Catalog("spec cache lock poisoned".to_string()))?;
            Arc::clone(slots.entry(ns.to_string()).or_insert_with(|| {
                Arc::new(Slot {
                    built: Mutex::new(None),
                })
            }))
        };

        let mut built = slot
            .built
            .lock()
            .map_err(|_| SpecError::Catalog("spec slot lock poisoned".to_string()))?;
        if let Some(existing) = built.as_ref() {
            return Ok(Arc::clone(existing));
        }

        match builder() {
            Ok(specs) => {
                let specs = Arc::new(CollectionSpecs::new(specs));
                *built = Some(Arc::clone(&specs));
                Ok(specs)
            }
            Err(err) => {
                drop(built);
                self.evict(ns);
                Err(err)
            }
        }
    }

    /// Drop the collection's entry. An in-flight build publishes into its
    /// detached slot and stays invisible; the next lookup rebuilds.
    pub fn evict(&self, ns: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(ns);
        }
    }

    /// The cached entry, if one is fully built
    pub fn peek(&self, ns: &str) -> Option<Arc<CollectionSpecs>> {
        let slot = {
            let slots = self.slots.lock().ok()?;
            Arc::clone(slots.get(ns)?)
        };
        let built = slot.built.lock().ok()?;
        built.as_ref().map(Arc::clone)
    }
}
