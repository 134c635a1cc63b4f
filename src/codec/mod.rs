//! Key codec for ordex
//!
//! Serializes (secondary key, primary key) pairs into a single ordered byte
//! string and back. The encoding is canonical and order-preserving: comparing
//! two encoded keys byte-lexicographically gives the same result as comparing
//! the decoded element sequences, which is what lets range scans run directly
//! against the store's comparator.
//!
//! # API
//!
//! - `encode(secondary, primary)` - Compose a physical key
//! - `decode(bytes, secondary_len, has_primary_suffix)` - Split it back
//! - `KeyElement::from_json(value)` - Convert a document field to an element

mod errors;
mod key;

pub use errors::{CodecError, CodecResult};
pub use key::{decode, encode, IndexKey, KeyElement};
