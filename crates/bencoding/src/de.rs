//! Serde deserialization: `Deserialize for Value`, and a `Deserializer`
//! over an owned [`Value`] so derived types can be read from bencode.
//!
//! Byte strings are handed to visitors as text when a string is requested
//! and the bytes are valid UTF-8, and as raw bytes otherwise. Integers go to
//! the narrowest of `i64`, `u64`, `i128`, `u128` that holds them; wider ones
//! only deserialize into [`Value`]. `bool` accepts `0` and `1`. A field that
//! is present is always `Some`; absent `Option` fields come out as `None`
//! through serde's usual defaulting.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, Unexpected,
    VariantAccess, Visitor,
};
use serde::de::value::{BorrowedStrDeserializer, StringDeserializer};
use serde::forward_to_deserialize_any;
use serde::{Deserialize, Deserializer};

use crate::decoder::decode;
use crate::error::{BencodeError, Result};
use crate::types::{Value, BIGINT_TOKEN};

/// Build any `DeserializeOwned` type from a [`Value`].
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(value)
}

/// Decode bencode bytes straight into a `DeserializeOwned` type.
///
/// ```
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Peer {
///     ip: String,
///     port: u16,
/// }
///
/// let peer: Peer = bencoding::from_bytes(b"d2:ip9:127.0.0.14:porti6881ee").unwrap();
/// assert_eq!(peer.ip, "127.0.0.1");
/// assert_eq!(peer.port, 6881);
/// ```
pub fn from_bytes<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    from_value(decode(input)?)
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte string, integer, list, or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::from(i64::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<Value, E> {
        Ok(Value::Integer(BigInt::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Value, E> {
        Ok(Value::Integer(BigInt::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::string(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
        let mut entries = BTreeMap::new();
        let Some(KeyBytes(first)) = map.next_key()? else {
            return Ok(Value::Dict(entries));
        };
        if first == BIGINT_TOKEN.as_bytes() {
            let digits: String = map.next_value()?;
            return BigInt::parse_bytes(digits.as_bytes(), 10)
                .map(Value::Integer)
                .ok_or_else(|| {
                    de::Error::invalid_value(Unexpected::Str(&digits), &"a decimal integer")
                });
        }
        entries.insert(first, map.next_value()?);
        while let Some((KeyBytes(key), value)) = map.next_entry()? {
            entries.insert(key, value);
        }
        Ok(Value::Dict(entries))
    }
}

/// A dictionary key read from a foreign format: text or bytes.
struct KeyBytes(Bytes);

impl<'de> Deserialize<'de> for KeyBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = KeyBytes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or byte string key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<KeyBytes, E> {
                Ok(KeyBytes(Bytes::copy_from_slice(v.as_bytes())))
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<KeyBytes, E> {
                Ok(KeyBytes(Bytes::copy_from_slice(v)))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<KeyBytes, E> {
                Ok(KeyBytes(Bytes::from(v)))
            }
        }

        deserializer.deserialize_bytes(KeyVisitor)
    }
}

impl Value {
    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Bytes(b) => Unexpected::Bytes(b),
            Value::Integer(n) => match n.to_i64() {
                Some(n) => Unexpected::Signed(n),
                None => Unexpected::Other("big integer"),
            },
            Value::List(_) => Unexpected::Seq,
            Value::Dict(_) => Unexpected::Map,
        }
    }

    fn invalid_type<E: de::Error>(&self, exp: &dyn de::Expected) -> E {
        E::invalid_type(self.unexpected(), exp)
    }
}

fn visit_integer<'de, V: Visitor<'de>>(n: BigInt, visitor: V) -> Result<V::Value> {
    if let Some(v) = n.to_i64() {
        visitor.visit_i64(v)
    } else if let Some(v) = n.to_u64() {
        visitor.visit_u64(v)
    } else if let Some(v) = n.to_i128() {
        visitor.visit_i128(v)
    } else if let Some(v) = n.to_u128() {
        visitor.visit_u128(v)
    } else {
        visitor.visit_map(BigIntDeserializer {
            digits: Some(n.to_str_radix(10)),
        })
    }
}

/// Presents an integer wider than 128 bits as the one-entry map
/// `{ BIGINT_TOKEN: "<decimal>" }`, which `Value`'s visitor turns back into
/// an integer. Other visitors see a map and fail with a type error.
struct BigIntDeserializer {
    digits: Option<String>,
}

impl<'de> MapAccess<'de> for BigIntDeserializer {
    type Error = BencodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        if self.digits.is_none() {
            return Ok(None);
        }
        seed.deserialize(BorrowedStrDeserializer::new(BIGINT_TOKEN)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let digits = self
            .digits
            .take()
            .ok_or_else(|| BencodeError::Message("next_value called before next_key".into()))?;
        seed.deserialize(StringDeserializer::new(digits))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(usize::from(self.digits.is_some()))
    }
}

fn visit_text<'de, V: Visitor<'de>>(b: Bytes, visitor: V) -> Result<V::Value> {
    match String::from_utf8(Vec::from(b)) {
        Ok(s) => visitor.visit_string(s),
        Err(e) => visitor.visit_byte_buf(e.into_bytes()),
    }
}

impl<'de> Deserializer<'de> for Value {
    type Error = BencodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Bytes(b) => visitor.visit_byte_buf(Vec::from(b)),
            Value::Integer(n) => visit_integer(n, visitor),
            Value::List(items) => visitor.visit_seq(SeqDeserializer {
                iter: items.into_iter(),
            }),
            Value::Dict(entries) => visitor.visit_map(MapDeserializer {
                iter: entries.into_iter(),
                value: None,
            }),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.as_i64() {
            Some(0) => visitor.visit_bool(false),
            Some(1) => visitor.visit_bool(true),
            Some(n) => Err(de::Error::invalid_value(Unexpected::Signed(n), &"0 or 1")),
            None => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Bytes(b) => visit_text(b, visitor),
            other => Err(other.invalid_type(&visitor)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            Value::Bytes(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Dict(entries) if entries.len() == 1 => {
                let mut entries = entries.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(de::Error::invalid_length(0, &"a single-key dictionary")),
                }
            }
            Value::Dict(entries) => Err(de::Error::invalid_length(
                entries.len(),
                &"a single-key dictionary",
            )),
            other => Err(other.invalid_type(&"a byte string or single-key dictionary")),
        }
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 bytes byte_buf unit
        unit_struct seq tuple tuple_struct map struct ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = BencodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        self.iter.next().map(|v| seed.deserialize(v)).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: std::collections::btree_map::IntoIter<Bytes, Value>,
    value: Option<Value>,
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = BencodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(KeyDeserializer(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self
            .value
            .take()
            .ok_or_else(|| BencodeError::Message("next_value called before next_key".into()))?;
        seed.deserialize(value)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Dictionary keys: text when valid UTF-8, so field identifiers and
/// `String` keys match; raw bytes otherwise.
struct KeyDeserializer(Bytes);

impl<'de> Deserializer<'de> for KeyDeserializer {
    type Error = BencodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visit_text(self.0, visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(Vec::from(self.0))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(Vec::from(self.0))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        option unit unit_struct seq tuple tuple_struct map struct enum
        identifier ignored_any
    }
}

struct EnumDeserializer {
    variant: Bytes,
    value: Option<Value>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = BencodeError;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, VariantDeserializer)> {
        let variant = seed.deserialize(KeyDeserializer(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = BencodeError;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None => Ok(()),
            Some(value) => Err(value.invalid_type(&"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        match self.value {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &"newtype variant")),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            Some(Value::List(items)) => visitor.visit_seq(SeqDeserializer {
                iter: items.into_iter(),
            }),
            Some(other) => Err(other.invalid_type(&"tuple variant")),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &"tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Some(Value::Dict(entries)) => visitor.visit_map(MapDeserializer {
                iter: entries.into_iter(),
                value: None,
            }),
            Some(other) => Err(other.invalid_type(&"struct variant")),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &"struct variant")),
        }
    }
}
