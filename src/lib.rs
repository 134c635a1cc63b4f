//! ordex - A deterministic secondary-index engine over embedded
//! transactional key-value storage
//!
//! Layers, bottom up: order-preserving key codec, transactional store
//! contract, index specifications with a per-collection cache, catalog
//! bridge, and the index engine tying them together.

pub mod catalog;
pub mod codec;
pub mod index;
pub mod observability;
pub mod spec;
pub mod store;
pub mod txn;
