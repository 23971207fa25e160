//! Serde serialization: `Serialize for Value`, and any `Serialize` type into
//! a [`Value`] or straight to bencode bytes.
//!
//! Bencode has no null, boolean or float. The mapping used here:
//!
//! | Rust | Bencode |
//! |------|---------|
//! | integers, `bool` | integer (`true` is `1`) |
//! | `str`, `char`, `[u8]` | byte string |
//! | sequences, tuples | list |
//! | maps, structs | dictionary |
//! | `Some(x)` | `x` |
//! | `None`, `()` | omitted from dictionaries, an error elsewhere |
//! | unit variant | byte string of the variant name |
//! | other variants | `{ name: payload }` |
//! | `f32`, `f64` | [`BencodeError::UnsupportedType`] |
//!
//! Map keys must serialize to byte strings; integer keys are written in
//! decimal. A key emitted twice is [`BencodeError::DuplicateKey`].

use std::collections::BTreeMap;

use bytes::Bytes;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::ser::{
    self, Impossible, Serialize, SerializeMap, SerializeSeq, SerializeStruct, Serializer,
};

use crate::encoder::encode;
use crate::error::{BencodeError, Result};
use crate::types::{Value, BIGINT_TOKEN};

/// Convert any `Serialize` type into a [`Value`].
///
/// ```
/// use bencoding::{to_value, Value};
///
/// let v = to_value(&("spam", 42u8)).unwrap();
/// assert_eq!(v, Value::List(vec![Value::string("spam"), Value::from(42)]));
/// ```
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value
        .serialize(ValueSerializer)?
        .ok_or_else(|| unsupported("a missing value (None or unit) at the top level"))
}

/// Serialize any `Serialize` type to canonical bencode.
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(encode(&to_value(value)?))
}

fn unsupported(what: impl Into<String>) -> BencodeError {
    BencodeError::UnsupportedType(what.into())
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Bytes(b) => serialize_byte_string(b, serializer),
            Value::Integer(n) => {
                if let Some(n) = n.to_i64() {
                    serializer.serialize_i64(n)
                } else if let Some(n) = n.to_u64() {
                    serializer.serialize_u64(n)
                } else if let Some(n) = n.to_i128() {
                    serializer.serialize_i128(n)
                } else if let Some(n) = n.to_u128() {
                    serializer.serialize_u128(n)
                } else if serializer.is_human_readable() {
                    serializer.serialize_str(&n.to_str_radix(10))
                } else {
                    let mut s = serializer.serialize_struct(BIGINT_TOKEN, 1)?;
                    s.serialize_field(BIGINT_TOKEN, &n.to_str_radix(10))?;
                    s.end()
                }
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&ByteString(key), value)?;
                }
                map.end()
            }
        }
    }
}

/// Byte string shown as text to human-readable formats when it is UTF-8.
struct ByteString<'a>(&'a [u8]);

impl Serialize for ByteString<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_byte_string(self.0, serializer)
    }
}

fn serialize_byte_string<S: Serializer>(b: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match std::str::from_utf8(b) {
        Ok(s) if serializer.is_human_readable() => serializer.serialize_str(s),
        _ => serializer.serialize_bytes(b),
    }
}

/// Serializer producing a [`Value`], or `None` for values bencode cannot
/// hold (which containers then skip or reject).
struct ValueSerializer;

impl Serializer for ValueSerializer {
    type Ok = Option<Value>;
    type Error = BencodeError;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = VariantSerializer<SeqSerializer>;
    type SerializeMap = MapSerializer;
    type SerializeStruct = MapSerializer;
    type SerializeStructVariant = VariantSerializer<MapSerializer>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<Option<Value>> {
        Ok(Some(Value::from(i64::from(v))))
    }

    fn serialize_i8(self, v: i8) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Option<Value>> {
        Ok(Some(Value::from(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Option<Value>> {
        Ok(Some(Value::Integer(BigInt::from(v))))
    }

    fn serialize_u8(self, v: u8) -> Result<Option<Value>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Option<Value>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Option<Value>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Option<Value>> {
        Ok(Some(Value::from(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Option<Value>> {
        Ok(Some(Value::Integer(BigInt::from(v))))
    }

    fn serialize_f32(self, _v: f32) -> Result<Option<Value>> {
        Err(unsupported("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<Option<Value>> {
        Err(unsupported("f64"))
    }

    fn serialize_char(self, v: char) -> Result<Option<Value>> {
        let mut buf = [0u8; 4];
        Ok(Some(Value::string(v.encode_utf8(&mut buf))))
    }

    fn serialize_str(self, v: &str) -> Result<Option<Value>> {
        Ok(Some(Value::string(v)))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Option<Value>> {
        Ok(Some(Value::from(v)))
    }

    fn serialize_none(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Option<Value>> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Option<Value>> {
        Ok(Some(Value::string(variant)))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Option<Value>> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Option<Value>> {
        let inner = value
            .serialize(ValueSerializer)?
            .ok_or_else(|| unsupported(format!("a missing value in variant `{variant}`")))?;
        Ok(Some(single_entry(variant, inner)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer> {
        Ok(SeqSerializer {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSerializer<SeqSerializer>> {
        Ok(VariantSerializer {
            variant,
            inner: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer> {
        Ok(MapSerializer {
            entries: BTreeMap::new(),
            key: None,
            bigint: false,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<MapSerializer> {
        let mut map = self.serialize_map(Some(len))?;
        map.bigint = name == BIGINT_TOKEN;
        Ok(map)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSerializer<MapSerializer>> {
        Ok(VariantSerializer {
            variant,
            inner: self.serialize_map(Some(len))?,
        })
    }
}

fn single_entry(key: &str, value: Value) -> Value {
    let mut entries = BTreeMap::new();
    entries.insert(Bytes::copy_from_slice(key.as_bytes()), value);
    Value::Dict(entries)
}

struct SeqSerializer {
    items: Vec<Value>,
}

impl SeqSerializer {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let item = value
            .serialize(ValueSerializer)?
            .ok_or_else(|| unsupported("a missing value (None or unit) inside a list"))?;
        self.items.push(item);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Option<Value>;
    type Error = BencodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(Value::List(self.items)))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Option<Value>;
    type Error = BencodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Option<Value>;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        ser::SerializeSeq::end(self)
    }
}

struct MapSerializer {
    entries: BTreeMap<Bytes, Value>,
    key: Option<Bytes>,
    /// Set for the single-field struct `Value` uses to carry an integer
    /// wider than 128 bits as decimal text.
    bigint: bool,
}

impl MapSerializer {
    fn insert(&mut self, key: Bytes, value: Option<Value>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        if self.entries.contains_key(&key) {
            tracing::debug!(key = %String::from_utf8_lossy(&key), "duplicate key while serializing map");
            return Err(BencodeError::DuplicateKey(key));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    fn finish(self) -> Value {
        Value::Dict(self.entries)
    }

    fn finish_struct(self) -> Result<Value> {
        if !self.bigint {
            return Ok(self.finish());
        }
        let digits = self
            .entries
            .get(BIGINT_TOKEN.as_bytes())
            .and_then(Value::as_bytes)
            .ok_or_else(|| BencodeError::Message("malformed big integer".into()))?;
        BigInt::parse_bytes(digits, 10)
            .map(Value::Integer)
            .ok_or_else(|| BencodeError::Message("malformed big integer".into()))
    }
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Option<Value>;
    type Error = BencodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self
            .key
            .take()
            .ok_or_else(|| BencodeError::Message("serialize_value called before serialize_key".into()))?;
        let value = value.serialize(ValueSerializer)?;
        self.insert(key, value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(self.finish()))
    }
}

impl ser::SerializeStruct for MapSerializer {
    type Ok = Option<Value>;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let value = value.serialize(ValueSerializer)?;
        self.insert(Bytes::from_static(key.as_bytes()), value)
    }

    fn end(self) -> Result<Option<Value>> {
        self.finish_struct().map(Some)
    }
}

/// Wraps a tuple or struct variant's payload as `{ variant: payload }`.
struct VariantSerializer<S> {
    variant: &'static str,
    inner: S,
}

impl ser::SerializeTupleVariant for VariantSerializer<SeqSerializer> {
    type Ok = Option<Value>;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.inner.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(single_entry(self.variant, Value::List(self.inner.items))))
    }
}

impl ser::SerializeStructVariant for VariantSerializer<MapSerializer> {
    type Ok = Option<Value>;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(single_entry(self.variant, self.inner.finish())))
    }
}

/// Serializer for dictionary keys, which must become byte strings.
struct KeySerializer;

fn key_must_be_bytes(found: &str) -> BencodeError {
    unsupported(format!("dictionary key must be a byte string, found {found}"))
}

impl Serializer for KeySerializer {
    type Ok = Bytes;
    type Error = BencodeError;

    type SerializeSeq = Impossible<Bytes, BencodeError>;
    type SerializeTuple = Impossible<Bytes, BencodeError>;
    type SerializeTupleStruct = Impossible<Bytes, BencodeError>;
    type SerializeTupleVariant = Impossible<Bytes, BencodeError>;
    type SerializeMap = Impossible<Bytes, BencodeError>;
    type SerializeStruct = Impossible<Bytes, BencodeError>;
    type SerializeStructVariant = Impossible<Bytes, BencodeError>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, _v: bool) -> Result<Bytes> {
        Err(key_must_be_bytes("bool"))
    }

    fn serialize_i8(self, v: i8) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_i16(self, v: i16) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_i32(self, v: i32) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_i64(self, v: i64) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_i128(self, v: i128) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_u8(self, v: u8) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_u16(self, v: u16) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_u32(self, v: u32) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_u64(self, v: u64) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_u128(self, v: u128) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_f32(self, _v: f32) -> Result<Bytes> {
        Err(key_must_be_bytes("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<Bytes> {
        Err(key_must_be_bytes("f64"))
    }

    fn serialize_char(self, v: char) -> Result<Bytes> {
        Ok(Bytes::from(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(v.as_bytes()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(v))
    }

    fn serialize_none(self) -> Result<Bytes> {
        Err(key_must_be_bytes("None"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Bytes> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Bytes> {
        Err(key_must_be_bytes("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Bytes> {
        Err(key_must_be_bytes(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Bytes> {
        Ok(Bytes::from_static(variant.as_bytes()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Bytes> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Bytes> {
        Err(key_must_be_bytes(name))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_bytes("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_bytes("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_bytes(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_bytes(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_bytes("map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_bytes(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_bytes(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn floats_are_unsupported() {
        assert!(matches!(to_value(&1.5f64), Err(BencodeError::UnsupportedType(_))));
        assert!(matches!(to_value(&vec![1.0f32]), Err(BencodeError::UnsupportedType(_))));
    }

    #[test]
    fn none_is_rejected_outside_dicts() {
        assert!(matches!(to_value(&None::<u8>), Err(BencodeError::UnsupportedType(_))));
        assert!(matches!(to_value(&()), Err(BencodeError::UnsupportedType(_))));
        assert!(matches!(
            to_value(&vec![Some(1), None]),
            Err(BencodeError::UnsupportedType(_))
        ));
    }

    #[test]
    fn none_values_are_omitted_from_maps() {
        let mut map = HashMap::new();
        map.insert("present", Some(1));
        map.insert("absent", None);
        assert_eq!(to_bytes(&map).unwrap(), b"d7:presenti1ee");
    }

    #[test]
    fn integer_keys_are_written_in_decimal() {
        let mut map = BTreeMap::new();
        map.insert(10u32, "ten");
        map.insert(9u32, "nine");
        // Byte order, not numeric order.
        assert_eq!(to_bytes(&map).unwrap(), b"d2:103:ten1:94:ninee");
    }

    #[test]
    fn non_bytes_keys_are_unsupported() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(to_value(&map), Err(BencodeError::UnsupportedType(_))));
    }

    #[test]
    fn repeated_keys_are_rejected() {
        struct Pairs;
        impl Serialize for Pairs {
            fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                let mut map = s.serialize_map(Some(2))?;
                map.serialize_entry("cow", &1)?;
                map.serialize_entry("cow", &2)?;
                map.end()
            }
        }
        match to_value(&Pairs) {
            Err(BencodeError::DuplicateKey(key)) => assert_eq!(&key[..], b"cow"),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn bool_and_char() {
        assert_eq!(to_bytes(&true).unwrap(), b"i1e");
        assert_eq!(to_bytes(&false).unwrap(), b"i0e");
        assert_eq!(to_bytes(&'é').unwrap(), "2:é".as_bytes());
    }

    #[test]
    fn value_serializes_to_readable_json() {
        let value = crate::decode(b"d3:cowl3:mooi-1ee4:spami42ee").unwrap();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"cow":["moo",-1],"spam":42}"#);
    }

    #[test]
    fn wide_integers_survive_to_value() {
        let cases = [
            "123456789012345678901234567890",
            "-170141183460469231731687303715884105729",
        ];
        for digits in cases {
            let n: BigInt = digits.parse().unwrap();
            let value = Value::Integer(n);
            assert_eq!(to_value(&value).unwrap(), value);
        }

        let sixty = "9".repeat(60);
        let input = format!("i{sixty}e");
        let value = crate::decode(input.as_bytes()).unwrap();
        assert_eq!(to_value(&value).unwrap(), value);
        assert_eq!(to_bytes(&value).unwrap(), input.as_bytes());
    }

    #[test]
    fn malformed_big_integer_struct_is_an_error() {
        struct Bogus;
        impl Serialize for Bogus {
            fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                let mut st = s.serialize_struct(BIGINT_TOKEN, 1)?;
                st.serialize_field(BIGINT_TOKEN, "12x")?;
                st.end()
            }
        }
        assert!(matches!(to_value(&Bogus), Err(BencodeError::Message(_))));
    }

    #[test]
    fn huge_integers_serialize_as_decimal_text() {
        let wide: BigInt = "-99999999999999999999".parse().unwrap();
        let json = serde_json::to_string(&Value::Integer(wide)).unwrap();
        assert_eq!(json, "-99999999999999999999");

        let huge: BigInt = format!("-{}", "9".repeat(45)).parse().unwrap();
        let json = serde_json::to_string(&Value::Integer(huge)).unwrap();
        assert_eq!(json, format!(r#""-{}""#, "9".repeat(45)));
    }
}
