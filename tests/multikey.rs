//! Multikey Detection Tests
//!
//! Tests for the multikey flag:
//! - Set the first time a document produces more than one key
//! - Set before the entries land, never cleared by the write path
//! - Single-key documents never set it
//! - Parallel arrays are rejected, not fanned out

use ordex::catalog::{Catalog, MemoryCatalog};
use ordex::codec::{IndexKey, KeyElement};
use ordex::index::{EngineErrorCode, IndexEngine};
use ordex::spec::{IndexDeclaration, SpecCache};
use ordex::store::{MemoryStore, TransactionalStore};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn tags_engine(store: &MemoryStore, catalog: Arc<MemoryCatalog>) -> IndexEngine {
    let decl = IndexDeclaration::new("db.posts", "tags_1", vec!["tags".to_string()]).unwrap();
    IndexEngine::open(store, catalog, Arc::new(SpecCache::new()), decl, true).unwrap()
}

fn pk(n: i64) -> IndexKey {
    IndexKey::single(KeyElement::Int(n))
}

// =============================================================================
// Flag Transition Tests
// =============================================================================

/// An array value fans out to one entry per element and flips the flag.
#[test]
fn test_array_document_sets_multikey() {
    let store = MemoryStore::new();
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = tags_engine(&store, Arc::clone(&catalog));
    assert!(!engine.is_multikey().unwrap());

    let txn = store.begin();
    engine
        .insert(&txn, &json!({"tags": ["x", "y"]}), &pk(1), false)
        .unwrap();
    store.commit(&txn).unwrap();

    assert!(engine.is_multikey().unwrap());
    assert!(catalog.is_multikey("db.posts", "tags_1").unwrap());
}

/// Single-key documents never set the flag, and removing the only
/// multi-key document never clears it.
#[test]
fn test_flag_sticks_and_single_keys_dont_set_it() {
    let store = MemoryStore::new();
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = tags_engine(&store, Arc::clone(&catalog));

    let txn = store.begin();
    engine.insert(&txn, &json!({"tags": "solo"}), &pk(1), false).unwrap();
    store.commit(&txn).unwrap();
    assert!(!engine.is_multikey().unwrap());

    let doc = json!({"tags": ["x", "y"]});
    let txn = store.begin();
    engine.insert(&txn, &doc, &pk(2), false).unwrap();
    store.commit(&txn).unwrap();
    assert!(engine.is_multikey().unwrap());

    let txn = store.begin();
    engine.remove(&txn, &doc, &pk(2)).unwrap();
    store.commit(&txn).unwrap();
    assert!(engine.is_multikey().unwrap());
}

/// Duplicate array elements collapse into one key, so they do not count
/// as multikey on their own.
#[test]
fn test_duplicate_elements_collapse() {
    let store = MemoryStore::new();
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = tags_engine(&store, Arc::clone(&catalog));

    let txn = store.begin();
    engine
        .insert(&txn, &json!({"tags": ["same", "same"]}), &pk(1), false)
        .unwrap();
    store.commit(&txn).unwrap();

    assert!(!engine.is_multikey().unwrap());

    let keys = engine.derive_keys(&json!({"tags": ["same", "same"]})).unwrap();
    assert_eq!(keys.len(), 1);
}

/// The flag survives an aborted transaction: it is set durably before the
/// entries, and the write path never clears it.
#[test]
fn test_flag_survives_abort() {
    let store = MemoryStore::new();
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = tags_engine(&store, Arc::clone(&catalog));

    let txn = store.begin();
    engine
        .insert(&txn, &json!({"tags": ["x", "y"]}), &pk(1), false)
        .unwrap();
    store.abort(&txn).unwrap();

    assert!(engine.is_multikey().unwrap());
}

// =============================================================================
// Extraction Rejection Tests
// =============================================================================

/// Two array-valued fields in one compound pattern cannot be fanned out
/// into a meaningful cartesian product.
#[test]
fn test_parallel_arrays_rejected() {
    let store = MemoryStore::new();
    let decl = IndexDeclaration::new(
        "db.posts",
        "tags_cats_1",
        vec!["tags".to_string(), "cats".to_string()],
    )
    .unwrap();
    let engine = IndexEngine::open(
        &store,
        Arc::new(MemoryCatalog::new()),
        Arc::new(SpecCache::new()),
        decl,
        true,
    )
    .unwrap();

    let txn = store.begin();
    let err = engine
        .insert(
            &txn,
            &json!({"tags": ["a", "b"], "cats": ["c", "d"]}),
            &pk(1),
            false,
        )
        .unwrap_err();
    assert_eq!(err.code(), EngineErrorCode::KeyExtraction);
    store.abort(&txn).unwrap();

    // One array plus one scalar fans out fine.
    let txn = store.begin();
    let keys = engine
        .derive_keys(&json!({"tags": ["a", "b"], "cats": "c"}))
        .unwrap();
    assert_eq!(keys.len(), 2);
    store.commit(&txn).unwrap();
}
