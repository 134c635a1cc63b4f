//! Store layer for ordex
//!
//! The engine treats the underlying storage engine as an ordered
//! transactional key-value store with a minimal API: open-or-create a
//! dictionary, point put with optional no-overwrite, idempotent delete, and
//! an ordered cursor bound to a transaction. Concurrency control, durability
//! and the on-disk format all belong to the store behind the trait.
//!
//! `StorageDictionary` is the scoped-ownership wrapper the engine holds: one
//! owner, closed exactly once on every exit path.
//!
//! `MemoryStore` is the in-process reference backend used by embedders and
//! the test suites.

mod dictionary;
mod errors;
mod memory;
mod traits;

pub use dictionary::StorageDictionary;
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{Dictionary, OpenedDictionary, StoreCursor, TransactionalStore};
