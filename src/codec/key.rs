//! Typed key elements and the order-preserving byte encoding
//!
//! A secondary key is a sequence of `KeyElement`s, one per field of the index
//! key pattern. A primary key is likewise an element sequence. The physical
//! key for an index entry is the secondary key's encoding followed by the
//! primary key's encoding when the layout carries one.
//!
//! Type ordering is Null < Bool < Int < Float < String; within a type the
//! encoding preserves the natural ordering of values. The `KeyElement` enum
//! derives `Ord` in the same order, so in-memory comparison and encoded
//! comparison always agree.

use super::errors::{CodecError, CodecResult};

// Element tag bytes. Gaps left between tags for future types.
const TAG_NULL: u8 = 0x10;
const TAG_BOOL: u8 = 0x20;
const TAG_INT: u8 = 0x30;
const TAG_FLOAT: u8 = 0x40;
const TAG_STRING: u8 = 0x50;

/// A single typed component of an index or primary key.
///
/// Floats are held as total-order bits (negative values flip all bits,
/// positive values flip the sign bit) so the derived `Ord` is total and
/// matches the byte encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyElement {
    /// Missing or explicit null field
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as total-order bits)
    Float(u64),
    /// String value
    String(String),
}

impl KeyElement {
    /// Create an element from a float, converting to total-order bits.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits // Negative: flip all bits
        } else {
            bits ^ (1 << 63) // Positive: flip sign bit
        };
        KeyElement::Float(ordered)
    }

    /// Recover the float value from total-order bits.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            KeyElement::Float(ordered) => {
                let bits = if (ordered >> 63) == 0 {
                    !ordered
                } else {
                    ordered ^ (1 << 63)
                };
                Some(f64::from_bits(bits))
            }
            _ => None,
        }
    }

    /// Create an element from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        KeyElement::String(v.into())
    }

    /// Create an element from a scalar JSON value.
    ///
    /// Arrays and objects have no element form; the extractor fans arrays
    /// out into one key per array member before reaching the codec.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(KeyElement::Null),
            serde_json::Value::Bool(b) => Some(KeyElement::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(KeyElement::Int(i))
                } else {
                    n.as_f64().map(KeyElement::from_float)
                }
            }
            serde_json::Value::String(s) => Some(KeyElement::from_string(s)),
            _ => None,
        }
    }
}

/// An ordered sequence of key elements.
///
/// Comparison is element-wise, which agrees with byte-lexicographic
/// comparison of the encoded form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IndexKey(Vec<KeyElement>);

impl IndexKey {
    /// Build a key from its elements
    pub fn new(elements: Vec<KeyElement>) -> Self {
        IndexKey(elements)
    }

    /// Build a single-element key
    pub fn single(element: KeyElement) -> Self {
        IndexKey(vec![element])
    }

    /// The key's elements in pattern order
    pub fn elements(&self) -> &[KeyElement] {
        &self.0
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the key has no elements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<KeyElement>> for IndexKey {
    fn from(elements: Vec<KeyElement>) -> Self {
        IndexKey(elements)
    }
}

/// Encode a (secondary, primary) pair into one physical key.
///
/// The buffer is owned and growable; callers never manage key storage.
pub fn encode(secondary: &IndexKey, primary: Option<&IndexKey>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 * secondary.len());
    for element in secondary.elements() {
        encode_element(&mut buf, element);
    }
    if let Some(pk) = primary {
        for element in pk.elements() {
            encode_element(&mut buf, element);
        }
    }
    buf
}

/// Decode a physical key back into its (secondary, primary) pair.
///
/// `secondary_len` is the index key pattern's arity; the boundary between
/// secondary and primary elements is not recoverable from the bytes alone.
/// When `has_primary_suffix` is false the bytes must contain exactly the
/// secondary elements.
pub fn decode(
    bytes: &[u8],
    secondary_len: usize,
    has_primary_suffix: bool,
) -> CodecResult<(IndexKey, Option<IndexKey>)> {
    if secondary_len == 0 {
        return Err(CodecError::EmptyKey);
    }

    let mut pos = 0;
    let mut secondary = Vec::with_capacity(secondary_len);
    for _ in 0..secondary_len {
        let (element, next) = decode_element(bytes, pos)?;
        secondary.push(element);
        pos = next;
    }

    if !has_primary_suffix {
        if pos != bytes.len() {
            return Err(CodecError::TrailingBytes {
                remaining: bytes.len() - pos,
            });
        }
        return Ok((IndexKey(secondary), None));
    }

    // The primary key runs to the end of the buffer.
    let mut primary = Vec::new();
    while pos < bytes.len() {
        let (element, next) = decode_element(bytes, pos)?;
        primary.push(element);
        pos = next;
    }
    if primary.is_empty() {
        return Err(CodecError::EmptyKey);
    }
    Ok((IndexKey(secondary), Some(IndexKey(primary))))
}

fn encode_element(buf: &mut Vec<u8>, element: &KeyElement) {
    match element {
        KeyElement::Null => buf.push(TAG_NULL),
        KeyElement::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(u8::from(*b));
        }
        KeyElement::Int(v) => {
            buf.push(TAG_INT);
            // Flip the sign bit so negative values sort below positive.
            buf.extend_from_slice(&((*v as u64) ^ (1 << 63)).to_be_bytes());
        }
        KeyElement::Float(ordered) => {
            buf.push(TAG_FLOAT);
            buf.extend_from_slice(&ordered.to_be_bytes());
        }
        KeyElement::String(s) => {
            buf.push(TAG_STRING);
            // 0x00 is escaped as 0x00 0xFF; the terminator 0x00 0x00 then
            // sorts any string below every proper extension of it.
            for byte in s.as_bytes() {
                if *byte == 0x00 {
                    buf.push(0x00);
                    buf.push(0xff);
                } else {
                    buf.push(*byte);
                }
            }
            buf.push(0x00);
            buf.push(0x00);
        }
    }
}

fn decode_element(bytes: &[u8], start: usize) -> CodecResult<(KeyElement, usize)> {
    let tag = *bytes
        .get(start)
        .ok_or(CodecError::Truncated { offset: start })?;
    let mut pos = start + 1;
    match tag {
        TAG_NULL => Ok((KeyElement::Null, pos)),
        TAG_BOOL => {
            let b = *bytes.get(pos).ok_or(CodecError::Truncated { offset: pos })?;
            Ok((KeyElement::Bool(b != 0), pos + 1))
        }
        TAG_INT => {
            let raw = read_u64(bytes, pos)?;
            Ok((KeyElement::Int((raw ^ (1 << 63)) as i64), pos + 8))
        }
        TAG_FLOAT => {
            let raw = read_u64(bytes, pos)?;
            Ok((KeyElement::Float(raw), pos + 8))
        }
        TAG_STRING => {
            let mut payload = Vec::new();
            loop {
                let byte = *bytes.get(pos).ok_or(CodecError::Truncated { offset: pos })?;
                pos += 1;
                if byte != 0x00 {
                    payload.push(byte);
                    continue;
                }
                let next = *bytes.get(pos).ok_or(CodecError::Truncated { offset: pos })?;
                pos += 1;
                match next {
                    0x00 => break, // terminator
                    0xff => payload.push(0x00),
                    _ => {
                        return Err(CodecError::UnknownTag {
                            tag: next,
                            offset: pos - 1,
                        })
                    }
                }
            }
            let s = String::from_utf8(payload)
                .map_err(|_| CodecError::InvalidUtf8 { offset: start })?;
            Ok((KeyElement::String(s), pos))
        }
        other => Err(CodecError::UnknownTag {
            tag: other,
            offset: start,
        }),
    }
}

fn read_u64(bytes: &[u8], pos: usize) -> CodecResult<u64> {
    let slice = bytes
        .get(pos..pos + 8)
        .ok_or(CodecError::Truncated { offset: pos })?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(slice);
    Ok(u64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ik(elements: Vec<KeyElement>) -> IndexKey {
        IndexKey::new(elements)
    }

    #[test]
    fn test_element_type_ordering() {
        let elements = vec![
            KeyElement::Null,
            KeyElement::Bool(false),
            KeyElement::Bool(true),
            KeyElement::Int(-100),
            KeyElement::Int(0),
            KeyElement::Int(100),
            KeyElement::from_float(-1.5),
            KeyElement::from_float(0.0),
            KeyElement::from_float(2.25),
            KeyElement::from_string("aaa"),
            KeyElement::from_string("zzz"),
        ];
        for i in 1..elements.len() {
            assert!(elements[i - 1] < elements[i], "elements must be ordered");
        }
    }

    #[test]
    fn test_encoding_matches_element_ordering() {
        let keys = vec![
            ik(vec![KeyElement::Null]),
            ik(vec![KeyElement::Bool(true)]),
            ik(vec![KeyElement::Int(i64::MIN)]),
            ik(vec![KeyElement::Int(-1)]),
            ik(vec![KeyElement::Int(0)]),
            ik(vec![KeyElement::Int(i64::MAX)]),
            ik(vec![KeyElement::from_float(-3.5)]),
            ik(vec![KeyElement::from_float(10.0)]),
            ik(vec![KeyElement::from_string("a")]),
            ik(vec![KeyElement::from_string("ab")]),
            ik(vec![KeyElement::from_string("b")]),
        ];
        for i in 1..keys.len() {
            let prev = encode(&keys[i - 1], None);
            let curr = encode(&keys[i], None);
            assert!(prev < curr, "encoded order must match key order");
        }
    }

    #[test]
    fn test_round_trip_with_primary() {
        let secondary = ik(vec![
            KeyElement::from_string("alice"),
            KeyElement::Int(42),
        ]);
        let primary = IndexKey::single(KeyElement::Int(1001));

        let bytes = encode(&secondary, Some(&primary));
        let (s, p) = decode(&bytes, 2, true).unwrap();

        assert_eq!(s, secondary);
        assert_eq!(p, Some(primary));
    }

    #[test]
    fn test_round_trip_without_primary() {
        let secondary = ik(vec![KeyElement::from_float(-0.25)]);

        let bytes = encode(&secondary, None);
        let (s, p) = decode(&bytes, 1, false).unwrap();

        assert_eq!(s, secondary);
        assert_eq!(p, None);
    }

    #[test]
    fn test_string_with_embedded_nul_round_trips() {
        let secondary = ik(vec![KeyElement::from_string("a\0b")]);
        let primary = IndexKey::single(KeyElement::from_string("pk\0"));

        let bytes = encode(&secondary, Some(&primary));
        let (s, p) = decode(&bytes, 1, true).unwrap();

        assert_eq!(s, secondary);
        assert_eq!(p, Some(primary));
    }

    #[test]
    fn test_string_prefix_sorts_first() {
        // "a" < "a\0" < "aa" must hold through the escaping scheme.
        let a = encode(&ik(vec![KeyElement::from_string("a")]), None);
        let a_nul = encode(&ik(vec![KeyElement::from_string("a\0")]), None);
        let aa = encode(&ik(vec![KeyElement::from_string("aa")]), None);
        assert!(a < a_nul);
        assert!(a_nul < aa);
    }

    #[test]
    fn test_float_round_trip() {
        for v in [-1e300, -2.5, -0.0, 0.0, 1.0, 3.14159, 1e300] {
            let element = KeyElement::from_float(v);
            assert_eq!(element.as_float(), Some(v));
        }
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let bytes = encode(&ik(vec![KeyElement::Int(7)]), None);
        let err = decode(&bytes[..4], 1, false).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        let err = decode(&[0x99], 1, false).unwrap_err();
        assert_eq!(err, CodecError::UnknownTag { tag: 0x99, offset: 0 });
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode(&ik(vec![KeyElement::Bool(true)]), None);
        bytes.push(0x00);
        let err = decode(&bytes, 1, false).unwrap_err();
        assert_eq!(err, CodecError::TrailingBytes { remaining: 1 });
    }

    #[test]
    fn test_decode_rejects_missing_primary() {
        let bytes = encode(&ik(vec![KeyElement::Int(1)]), None);
        let err = decode(&bytes, 1, true).unwrap_err();
        assert_eq!(err, CodecError::EmptyKey);
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(
            KeyElement::from_json(&serde_json::json!(null)),
            Some(KeyElement::Null)
        );
        assert_eq!(
            KeyElement::from_json(&serde_json::json!(true)),
            Some(KeyElement::Bool(true))
        );
        assert_eq!(
            KeyElement::from_json(&serde_json::json!(42)),
            Some(KeyElement::Int(42))
        );
        assert_eq!(
            KeyElement::from_json(&serde_json::json!("hello")),
            Some(KeyElement::from_string("hello"))
        );
        assert_eq!(KeyElement::from_json(&serde_json::json!([1, 2])), None);
        assert_eq!(KeyElement::from_json(&serde_json::json!({"a": 1})), None);
    }
}
