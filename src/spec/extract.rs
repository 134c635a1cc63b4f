//! Key extraction
//!
//! Turns a document into the set of secondary keys an index stores for it.
//! The default extractor walks the key pattern's (dotted) field paths over a
//! JSON document:
//!
//! - a missing field or explicit null contributes a `Null` element;
//! - a scalar contributes its element form;
//! - an array fans out into one key per distinct member (this is what makes
//!   an index multikey);
//! - two array-valued fields in one compound pattern are rejected, since
//!   their cartesian product has no meaningful index form;
//! - objects (and arrays nested inside arrays) are not indexable.

use std::collections::BTreeSet;

use serde_json::Value;

use super::errors::{SpecError, SpecResult};
use crate::codec::{IndexKey, KeyElement};

/// Capability that turns a document into a set of secondary keys.
///
/// Supplied by the index declaration; may legitimately return more than one
/// key for array-valued fields.
pub trait KeyExtractor: Send + Sync {
    /// Extract the secondary keys this index stores for `document`
    fn extract_keys(&self, document: &Value) -> SpecResult<BTreeSet<IndexKey>>;
}

/// Default extractor driven by the index key pattern.
pub struct PatternExtractor {
    pattern: Vec<String>,
}

impl PatternExtractor {
    /// Build an extractor for the given pattern field paths
    pub fn new(pattern: Vec<String>) -> Self {
        Self { pattern }
    }

    /// Resolve a dotted path against a document
    fn resolve<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
        let mut current = document;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Candidate elements one field contributes to the key set
    fn field_candidates(path: &str, value: Option<&Value>) -> SpecResult<Vec<KeyElement>> {
        let Some(value) = value else {
            return Ok(vec![KeyElement::Null]);
        };
        match value {
            Value::Array(members) => {
                if members.is_empty() {
                    // An empty array indexes like a missing field.
                    return Ok(vec![KeyElement::Null]);
                }
                let mut seen = BTreeSet::new();
                for member in members {
                    let element = KeyElement::from_json(member).ok_or_else(|| {
                        SpecError::Unindexable {
                            path: path.to_string(),
                        }
                    })?;
                    seen.insert(element);
                }
                Ok(seen.into_iter().collect())
            }
            other => {
                let element =
                    KeyElement::from_json(other).ok_or_else(|| SpecError::Unindexable {
                        path: path.to_string(),
                    })?;
                Ok(vec![element])
            }
        }
    }
}

impl KeyExtractor for PatternExtractor {
    fn extract_keys(&self, document: &Value) -> SpecResult<BTreeSet<IndexKey>> {
        let mut per_field: Vec<Vec<KeyElement>> = Vec::with_capacity(self.pattern.len());
        let mut fanned_out: Option<&str> = None;

        for path in &self.pattern {
            let candidates =
                Self::field_candidates(path, Self::resolve(document, path))?;
            if candidates.len() > 1 {
                if let Some(first) = fanned_out {
                    return Err(SpecError::ParallelArrays {
                        first: first.to_string(),
                        second: path.clone(),
                    });
                }
                fanned_out = Some(path);
            }
            per_field.push(candidates);
        }

        // At most one field fans out, so this stays linear in the number of
        // produced keys.
        let mut keys: Vec<Vec<KeyElement>> = vec![Vec::with_capacity(self.pattern.len())];
        for candidates in per_field {
            let mut next = Vec::with_capacity(keys.len() * candidates.len());
            for partial in &keys {
                for candidate in &candidates {
                    let mut key = partial.clone();
                    key.push(candidate.clone());
                    next.push(key);
                }
            }
            keys = next;
        }

        Ok(keys.into_iter().map(IndexKey::new).collect())
    }
}
