//! Index specifications for ordex
//!
//! An `IndexDeclaration` is the raw, immutable description of an index:
//! identity (collection namespace, index name, key pattern) plus the
//! uniqueness and clustering flags. An `IndexSpec` is the derived form the
//! engine works with, carrying the key-extraction capability. Specs are
//! built lazily and shared through `SpecCache`, one entry per collection,
//! evicted whenever the collection's index set changes.

mod cache;
mod declaration;
mod errors;
mod extract;

pub use cache::{CollectionSpecs, SpecCache};
pub use declaration::IndexDeclaration;
pub use errors::{SpecError, SpecResult};
pub use extract::{KeyExtractor, PatternExtractor};

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::codec::IndexKey;

/// Derived, cached form of an index declaration.
///
/// Shared read-only across all operations on the index; the declaration and
/// its storage layout are fixed at creation.
pub struct IndexSpec {
    declaration: IndexDeclaration,
    extractor: Arc<dyn KeyExtractor>,
}

impl IndexSpec {
    /// Build a spec with the default pattern-driven extractor
    pub fn from_declaration(declaration: IndexDeclaration) -> Self {
        let extractor = Arc::new(PatternExtractor::new(declaration.pattern().to_vec()));
        Self {
            declaration,
            extractor,
        }
    }

    /// Build a spec with a caller-supplied extraction capability
    pub fn with_extractor(
        declaration: IndexDeclaration,
        extractor: Arc<dyn KeyExtractor>,
    ) -> Self {
        Self {
            declaration,
            extractor,
        }
    }

    /// The underlying declaration
    pub fn declaration(&self) -> &IndexDeclaration {
        &self.declaration
    }

    /// Extract this index's secondary keys from a document.
    ///
    /// Duplicate keys from one document collapse; more than one element in
    /// the result is what makes an index multikey.
    pub fn extract_keys(&self, document: &serde_json::Value) -> SpecResult<BTreeSet<IndexKey>> {
        self.extractor.extract_keys(document)
    }

    /// Number of fields in the key pattern (decode arity)
    pub fn pattern_len(&self) -> usize {
        self.declaration.pattern().len()
    }

    /// True when this index rejects duplicate secondary keys
    pub fn is_unique(&self) -> bool {
        self.declaration.is_unique()
    }

    /// True when entries store the full document as their value
    pub fn is_clustering(&self) -> bool {
        self.declaration.is_clustering()
    }

    /// True for the collection's id index
    pub fn is_id_index(&self) -> bool {
        self.declaration.is_id_index()
    }

    /// Position of a field in the key pattern
    pub fn key_offset_of(&self, field: &str) -> Option<usize> {
        self.declaration.key_offset_of(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::KeyElement;
    use serde_json::json;

    #[test]
    fn test_spec_extracts_pattern_keys() {
        let decl =
            IndexDeclaration::new("db.users", "age_1", vec!["age".to_string()]).unwrap();
        let spec = IndexSpec::from_declaration(decl);

        let keys = spec.extract_keys(&json!({"age": 30})).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(
            keys.iter().next().unwrap(),
            &IndexKey::single(KeyElement::Int(30))
        );
    }

    #[test]
    fn test_spec_classification_passthrough() {
        let decl = IndexDeclaration::new("db.users", "_id_", vec!["_id".to_string()]).unwrap();
        let spec = IndexSpec::from_declaration(decl);

        assert!(spec.is_id_index());
        assert!(spec.is_unique());
        assert!(!spec.is_clustering());
        assert_eq!(spec.key_offset_of("_id"), Some(0));
        assert_eq!(spec.key_offset_of("age"), None);
        assert_eq!(spec.pattern_len(), 1);
    }
}
