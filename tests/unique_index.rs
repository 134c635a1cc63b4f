//! Unique Index Tests
//!
//! Tests for uniqueness enforcement:
//! - Duplicate secondary keys are rejected with the offending key attached
//! - Distinct keys and overwrite-allowed inserts succeed
//! - A failed insert leaves nothing behind once the transaction aborts

use ordex::catalog::MemoryCatalog;
use ordex::codec::{IndexKey, KeyElement};
use ordex::index::{EngineErrorCode, IndexEngine};
use ordex::spec::{IndexDeclaration, SpecCache};
use ordex::store::{MemoryStore, TransactionalStore};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn unique_engine(store: &MemoryStore) -> IndexEngine {
    let decl = IndexDeclaration::new("db.users", "a_1", vec!["a".to_string()])
        .unwrap()
        .unique(true);
    IndexEngine::open(
        store,
        Arc::new(MemoryCatalog::new()),
        Arc::new(SpecCache::new()),
        decl,
        true,
    )
    .unwrap()
}

fn pk(n: i64) -> IndexKey {
    IndexKey::single(KeyElement::Int(n))
}

fn scan_keys(engine: &IndexEngine, store: &MemoryStore) -> Vec<(IndexKey, Option<IndexKey>)> {
    let txn = store.begin();
    let mut cursor = engine.cursor(&txn).unwrap();
    let mut keys = Vec::new();
    while let Some(entry) = cursor.next_entry().unwrap() {
        keys.push((entry.secondary, entry.primary));
    }
    drop(cursor);
    store.commit(&txn).unwrap();
    keys
}

// =============================================================================
// Conflict Tests
// =============================================================================

/// Same key from a different document is rejected; a distinct key is not.
#[test]
fn test_duplicate_key_rejected() {
    let store = MemoryStore::new();
    let engine = unique_engine(&store);

    let txn = store.begin();
    engine.insert(&txn, &json!({"a": 1}), &pk(100), false).unwrap();

    let err = engine
        .insert(&txn, &json!({"a": 1}), &pk(101), false)
        .unwrap_err();
    assert_eq!(err.code(), EngineErrorCode::DuplicateKey);
    assert_eq!(err.index(), Some("db.users.$a_1"));
    assert_eq!(err.key(), Some(&IndexKey::single(KeyElement::Int(1))));

    engine.insert(&txn, &json!({"a": 2}), &pk(101), false).unwrap();
    store.commit(&txn).unwrap();

    assert_eq!(
        scan_keys(&engine, &store),
        vec![
            (IndexKey::single(KeyElement::Int(1)), Some(pk(100))),
            (IndexKey::single(KeyElement::Int(2)), Some(pk(101))),
        ]
    );
}

/// With overwrite allowed the conflicting entry is replaced, not rejected.
#[test]
fn test_overwrite_allowed_replaces() {
    let store = MemoryStore::new();
    let engine = unique_engine(&store);

    let txn = store.begin();
    engine.insert(&txn, &json!({"a": 1}), &pk(100), false).unwrap();
    engine.insert(&txn, &json!({"a": 1}), &pk(100), true).unwrap();
    store.commit(&txn).unwrap();

    assert_eq!(scan_keys(&engine, &store).len(), 1);
}

/// A non-unique index accepts the same key from different documents.
#[test]
fn test_non_unique_accepts_duplicates() {
    let store = MemoryStore::new();
    let decl = IndexDeclaration::new("db.users", "a_1", vec!["a".to_string()]).unwrap();
    let engine = IndexEngine::open(
        &store,
        Arc::new(MemoryCatalog::new()),
        Arc::new(SpecCache::new()),
        decl,
        true,
    )
    .unwrap();

    let txn = store.begin();
    engine.insert(&txn, &json!({"a": 1}), &pk(100), false).unwrap();
    engine.insert(&txn, &json!({"a": 1}), &pk(101), false).unwrap();
    store.commit(&txn).unwrap();

    assert_eq!(scan_keys(&engine, &store).len(), 2);
}

// =============================================================================
// Abort Tests
// =============================================================================

/// A multi-key insert that hits a conflict mid-way leaves no partial
/// entries once the caller aborts the transaction.
#[test]
fn test_abort_rolls_back_partial_insert() {
    let store = MemoryStore::new();
    let decl = IndexDeclaration::new("db.posts", "tags_1", vec!["tags".to_string()])
        .unwrap()
        .unique(true);
    let engine = IndexEngine::open(
        &store,
        Arc::new(MemoryCatalog::new()),
        Arc::new(SpecCache::new()),
        decl,
        true,
    )
    .unwrap();

    let setup = store.begin();
    engine
        .insert(&setup, &json!({"tags": ["m"]}), &pk(1), false)
        .unwrap();
    store.commit(&setup).unwrap();

    // ["a", "m", "z"]: "a" goes in, "m" conflicts, "z" is never written.
    let txn = store.begin();
    let err = engine
        .insert(&txn, &json!({"tags": ["a", "m", "z"]}), &pk(2), false)
        .unwrap_err();
    assert_eq!(err.code(), EngineErrorCode::DuplicateKey);
    store.abort(&txn).unwrap();

    assert_eq!(
        scan_keys(&engine, &store),
        vec![(IndexKey::single(KeyElement::from_string("m")), Some(pk(1)))]
    );
}
