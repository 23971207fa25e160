//! The bencode value model.
//!
//! [`Value`] is the common currency of the decoder and encoder. Byte strings
//! are opaque (`Bytes`, never assumed to be UTF-8), integers are arbitrary
//! precision, and dictionaries are `BTreeMap`s keyed by raw bytes so that
//! iteration order is exactly the canonical encoding order.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Name and sole field of the struct the serde bridge uses to carry
/// integers wider than 128 bits as decimal text.
pub(crate) const BIGINT_TOKEN: &str = "$bencoding::BigInt";

/// A decoded bencode value.
///
/// ```
/// use bencoding::Value;
///
/// let v = Value::List(vec![Value::string("spam"), Value::from(42)]);
/// assert_eq!(v.as_list().map(|l| l.len()), Some(2));
/// assert_eq!(v.as_list().unwrap()[1].as_i64(), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Raw byte string.
    Bytes(Bytes),
    Integer(BigInt),
    List(Vec<Value>),
    /// Keys are unique and iterate in unsigned byte order.
    Dict(BTreeMap<Bytes, Value>),
}

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bytes,
    Integer,
    List,
    Dict,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Bytes => "byte string",
            ValueKind::Integer => "integer",
            ValueKind::List => "list",
            ValueKind::Dict => "dictionary",
        })
    }
}

impl Value {
    /// Byte string holding the UTF-8 bytes of `s`.
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    pub fn bytes(b: impl Into<Bytes>) -> Self {
        Value::Bytes(b.into())
    }

    pub fn integer(n: impl Into<BigInt>) -> Self {
        Value::Integer(n.into())
    }

    /// An empty dictionary.
    pub fn dict() -> Self {
        Value::Dict(BTreeMap::new())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Integer(_) => ValueKind::Integer,
            Value::List(_) => ValueKind::List,
            Value::Dict(_) => ValueKind::Dict,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The byte string as UTF-8, if it is one and the bytes are valid UTF-8.
    ///
    /// This is a convenience view; the codec itself never interprets bytes
    /// as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// The integer, if it is one and fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer()?.to_i64()
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Consumes the value and returns the dictionary without cloning.
    pub fn into_dict(self) -> Option<BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up `key` if this value is a dictionary.
    ///
    /// ```
    /// use bencoding::decode;
    ///
    /// let v = decode(b"d3:cow3:mooe").unwrap();
    /// assert_eq!(v.get(b"cow").and_then(|v| v.as_str()), Some("moo"));
    /// assert!(v.get(b"pig").is_none());
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    /// Exact number of bytes [`encode`](crate::encode) would produce.
    pub fn encoded_len(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![self];
        while let Some(value) = pending.pop() {
            total += match value {
                Value::Bytes(b) => bytestring_len(b),
                Value::Integer(n) => n.to_str_radix(10).len() + 2,
                Value::List(items) => {
                    pending.extend(items);
                    2
                }
                Value::Dict(entries) => {
                    let mut len = 2;
                    for (k, v) in entries {
                        len += bytestring_len(k);
                        pending.push(v);
                    }
                    len
                }
            };
        }
        total
    }
}

fn bytestring_len(b: &[u8]) -> usize {
    decimal_digits(b.len()) + 1 + b.len()
}

fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<Bytes, Value>> for Value {
    fn from(d: BTreeMap<Bytes, Value>) -> Self {
        Value::Dict(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        let v = Value::from(42i64);
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.kind(), ValueKind::Integer);
        assert!(v.as_bytes().is_none());

        let v = Value::string("test");
        assert_eq!(v.as_str(), Some("test"));
        assert!(v.as_integer().is_none());

        let v = Value::List(vec![]);
        assert!(v.as_list().is_some());
        assert!(v.as_dict().is_none());

        let v = Value::dict();
        assert_eq!(v.kind(), ValueKind::Dict);
        assert_eq!(v.into_dict().map(|d| d.len()), Some(0));
    }

    #[test]
    fn as_str_rejects_invalid_utf8() {
        let v = Value::bytes(vec![0xff, 0xfe]);
        assert!(v.as_bytes().is_some());
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn as_i64_is_none_when_out_of_range() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        let v = Value::integer(big.clone());
        assert_eq!(v.as_integer(), Some(&big));
        assert_eq!(v.as_i64(), None);
    }

    #[test]
    fn encoded_len_counts_every_byte() {
        assert_eq!(Value::string("spam").encoded_len(), 6);
        assert_eq!(Value::string("").encoded_len(), 2);
        assert_eq!(Value::bytes(vec![0u8; 10]).encoded_len(), 13);
        assert_eq!(Value::from(0i64).encoded_len(), 3);
        assert_eq!(Value::from(-42i64).encoded_len(), 5);

        let mut d = BTreeMap::new();
        d.insert(Bytes::from_static(b"cow"), Value::string("moo"));
        assert_eq!(Value::Dict(d).encoded_len(), b"d3:cow3:mooe".len());
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ValueKind::Bytes.to_string(), "byte string");
        assert_eq!(ValueKind::Dict.to_string(), "dictionary");
    }
}
