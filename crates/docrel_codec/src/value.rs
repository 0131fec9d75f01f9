//! Dynamic document value type.

use crate::object_id::ObjectId;
use std::cmp::Ordering;

/// A dynamic document value.
///
/// This is the schemaless representation of stored documents and query
/// filters. Floats are intentionally not supported so that every value has
/// exactly one canonical encoding and can be used as a hash key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (supports full i64 range).
    Integer(i64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string (UTF-8).
    Text(String),
    /// Typed document identifier.
    ObjectId(ObjectId),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of key-value pairs.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a map value with sorted keys.
    ///
    /// Keys are sorted by their canonical CBOR encoding (bytewise comparison).
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
        Value::Map(pairs)
    }

    /// Create a map value from text keys.
    pub fn document<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::map(
            pairs
                .into_iter()
                .map(|(k, v)| (Value::Text(k.into()), v))
                .collect(),
        )
    }

    /// Create an empty map value.
    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }

    /// Compare two values for canonical ordering.
    ///
    /// This implements the bytewise comparison of canonical CBOR encodings,
    /// which is required for map key sorting.
    #[allow(clippy::match_same_arms)]
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        let self_type = self.major_type();
        let other_type = other.major_type();

        if self_type != other_type {
            return self_type.cmp(&other_type);
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Null, Value::Bool(_)) => Ordering::Greater,
            (Value::Bool(_), Value::Null) => Ordering::Less,
            (Value::Integer(a), Value::Integer(b)) => {
                // Positive and negative integers have different major types,
                // so both operands share a sign here.
                #[allow(clippy::cast_sign_loss)]
                if *a >= 0 {
                    Self::cmp_unsigned_canonical(*a as u64, *b as u64)
                } else {
                    // CBOR encodes a negative n as the argument -1 - n.
                    Self::cmp_unsigned_canonical((-1 - *a) as u64, (-1 - *b) as u64)
                }
            }
            (Value::Bytes(a), Value::Bytes(b)) => Self::cmp_length_first(a, b),
            (Value::Text(a), Value::Text(b)) => Self::cmp_length_first(a.as_bytes(), b.as_bytes()),
            (Value::ObjectId(a), Value::ObjectId(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => match a.len().cmp(&b.len()) {
                Ordering::Equal => a
                    .iter()
                    .zip(b.iter())
                    .map(|(av, bv)| av.cmp_canonical(bv))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal),
                ord => ord,
            },
            (Value::Map(a), Value::Map(b)) => match a.len().cmp(&b.len()) {
                Ordering::Equal => {
                    for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                        let key_ord = ak.cmp_canonical(bk);
                        if key_ord != Ordering::Equal {
                            return key_ord;
                        }
                        let val_ord = av.cmp_canonical(bv);
                        if val_ord != Ordering::Equal {
                            return val_ord;
                        }
                    }
                    Ordering::Equal
                }
                ord => ord,
            },
            _ => Ordering::Equal,
        }
    }

    fn cmp_length_first(a: &[u8], b: &[u8]) -> Ordering {
        match a.len().cmp(&b.len()) {
            Ordering::Equal => a.cmp(b),
            ord => ord,
        }
    }

    /// Compare two unsigned integers by their canonical CBOR encoding.
    ///
    /// Comparison is length-first, then numeric (which equals lexicographic
    /// for big-endian arguments of the same length).
    fn cmp_unsigned_canonical(a: u64, b: u64) -> Ordering {
        match Self::cbor_uint_encoded_len(a).cmp(&Self::cbor_uint_encoded_len(b)) {
            Ordering::Equal => a.cmp(&b),
            ord => ord,
        }
    }

    /// Returns the encoded length (in bytes) of an unsigned integer in CBOR.
    fn cbor_uint_encoded_len(n: u64) -> usize {
        if n <= 23 {
            1
        } else if n <= 0xFF {
            2
        } else if n <= 0xFFFF {
            3
        } else if n <= 0xFFFF_FFFF {
            5
        } else {
            9
        }
    }

    /// Get the CBOR major type for this value.
    fn major_type(&self) -> u8 {
        match self {
            Value::Integer(n) if *n >= 0 => 0,
            Value::Integer(_) => 1,
            Value::Bytes(_) => 2,
            Value::Text(_) => 3,
            Value::Array(_) => 4,
            Value::Map(_) => 5,
            Value::ObjectId(_) => 6, // tagged byte string
            Value::Bool(_) | Value::Null => 7,
        }
    }

    /// Short name of this value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::ObjectId(_) => "object id",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as bytes, if it is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an object identifier, if it is one.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a mutable array, if it is one.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get this value as a mutable map, if it is one.
    pub fn as_map_mut(&mut self) -> Option<&mut Vec<(Value, Value)>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a text key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }

    /// Look up a text key in this map value, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.as_map_mut()?
            .iter_mut()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }

    /// Insert or replace a text key in this map value.
    ///
    /// Returns the previous value under the key. Does nothing and returns
    /// `None` if this value is not a map.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        let pairs = self.as_map_mut()?;
        if let Some((_, slot)) = pairs.iter_mut().find(|(k, _)| k.as_text() == Some(&key)) {
            return Some(std::mem::replace(slot, value));
        }
        pairs.push((Value::Text(key), value));
        pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
        None
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::ObjectId(id)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}
