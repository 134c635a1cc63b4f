//! Index declarations
//!
//! The raw description of an index, immutable after construction. Identity
//! is (collection namespace, index name, key pattern); the uniqueness and
//! clustering flags fix the storage layout for the index's whole life.

use serde::{Deserialize, Serialize};

use super::errors::{SpecError, SpecResult};

/// Declared shape of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDeclaration {
    ns: String,
    name: String,
    pattern: Vec<String>,
    unique: bool,
    clustering: bool,
}

impl IndexDeclaration {
    /// Validate and build a declaration.
    ///
    /// The pattern must be non-empty and every field path non-empty; the
    /// namespace and name must be non-empty.
    pub fn new(
        ns: impl Into<String>,
        name: impl Into<String>,
        pattern: Vec<String>,
    ) -> SpecResult<Self> {
        let ns = ns.into();
        let name = name.into();
        if ns.is_empty() {
            return Err(SpecError::InvalidDeclaration(
                "collection namespace is empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(SpecError::InvalidDeclaration(
                "index name is empty".to_string(),
            ));
        }
        if pattern.is_empty() {
            return Err(SpecError::InvalidDeclaration(
                "key pattern is empty".to_string(),
            ));
        }
        if pattern.iter().any(String::is_empty) {
            return Err(SpecError::InvalidDeclaration(
                "key pattern contains an empty field path".to_string(),
            ));
        }
        Ok(Self {
            ns,
            name,
            pattern,
            unique: false,
            clustering: false,
        })
    }

    /// Mark the index unique
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Mark the index clustering (entries carry the full document)
    pub fn clustering(mut self, clustering: bool) -> Self {
        self.clustering = clustering;
        self
    }

    /// Parent collection namespace, e.g. `db.users`
    pub fn ns(&self) -> &str {
        &self.ns
    }

    /// Index name, e.g. `email_1`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key pattern field paths, in order
    pub fn pattern(&self) -> &[String] {
        &self.pattern
    }

    /// Dictionary identifier for this index, e.g. `db.users.$email_1`
    pub fn index_namespace(&self) -> String {
        format!("{}.${}", self.ns, self.name)
    }

    /// True for the collection's id index: key pattern exactly `_id`
    pub fn is_id_index(&self) -> bool {
        self.pattern.len() == 1 && self.pattern[0] == "_id"
    }

    /// True when duplicate secondary keys are rejected. The id index is
    /// always unique.
    pub fn is_unique(&self) -> bool {
        self.unique || self.is_id_index()
    }

    /// True when entries store the full document as their value
    pub fn is_clustering(&self) -> bool {
        self.clustering
    }

    /// Position of a field in the key pattern, or `None` when absent
    pub fn key_offset_of(&self, field: &str) -> Option<usize> {
        self.pattern.iter().position(|f| f == field)
    }
}
