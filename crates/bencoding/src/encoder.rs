//! Bencode encoder: writes a [`Value`] tree in canonical form.
//!
//! Canonical form is the single valid encoding of a value:
//!
//! - **Byte strings**: `<len>:<bytes>`, length in decimal without padding
//! - **Integers**: `i<n>e`, no leading zeros, `-` only for negatives, `i0e`
//!   for zero
//! - **Lists**: `l<items>e` in their original order
//! - **Dictionaries**: `d<key><value>...e`, keys ascending by unsigned byte
//!   comparison
//!
//! Dictionary order falls out of `BTreeMap<Bytes, _>`, whose `Ord` is the
//! byte-wise order bencode requires. Nested containers are walked with an
//! explicit stack, so encoding depth is bounded by heap, not by the thread's
//! call stack.
//!
//! # Example
//! ```
//! use std::collections::BTreeMap;
//! use bytes::Bytes;
//! use bencoding::{encode, Value};
//!
//! let mut dict = BTreeMap::new();
//! dict.insert(Bytes::from_static(b"spam"), Value::from(1));
//! dict.insert(Bytes::from_static(b"cow"), Value::from(2));
//! assert_eq!(encode(&Value::Dict(dict)), b"d3:cowi2e4:spami1ee");
//! ```

use std::collections::btree_map;
use std::io::Write;
use std::slice;

use bytes::Bytes;

use crate::error::Result;
use crate::types::Value;

/// Encode a value into a fresh buffer sized exactly for it.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.encoded_len());
    encode_into(value, &mut out);
    out
}

/// Append the encoding of `value` to `out`.
pub fn encode_into(value: &Value, out: &mut Vec<u8>) {
    tracing::trace!(kind = %value.kind(), "encoding bencode value");

    let mut stack: Vec<Open<'_>> = Vec::new();
    let mut next = Some(value);
    loop {
        if let Some(value) = next.take() {
            match value {
                Value::Bytes(b) => write_bytes(b, out),
                Value::Integer(n) => {
                    out.push(b'i');
                    out.extend_from_slice(n.to_str_radix(10).as_bytes());
                    out.push(b'e');
                }
                Value::List(items) => {
                    out.push(b'l');
                    stack.push(Open::List(items.iter()));
                }
                Value::Dict(entries) => {
                    out.push(b'd');
                    stack.push(Open::Dict(entries.iter()));
                }
            }
        }

        let Some(top) = stack.last_mut() else {
            return;
        };
        next = match top {
            Open::List(items) => items.next(),
            Open::Dict(entries) => entries.next().map(|(key, value)| {
                write_bytes(key, out);
                value
            }),
        };
        if next.is_none() {
            out.push(b'e');
            stack.pop();
        }
    }
}

/// Encode `value` straight into a writer.
pub fn encode_to<W: Write>(value: &Value, mut writer: W) -> Result<()> {
    writer.write_all(&encode(value))?;
    Ok(())
}

/// A container whose remaining children have not been written yet.
enum Open<'a> {
    List(slice::Iter<'a, Value>),
    Dict(btree_map::Iter<'a, Bytes, Value>),
}

fn write_bytes(b: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(b.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(b);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_into_appends() {
        let mut out = b"prefix".to_vec();
        encode_into(&Value::from(1), &mut out);
        encode_into(&Value::string("x"), &mut out);
        assert_eq!(out, b"prefixi1e1:x");
    }

    #[test]
    fn encode_to_writer() {
        let mut out = Vec::new();
        let value = Value::List(vec![Value::from(-1), Value::List(vec![])]);
        encode_to(&value, &mut out).unwrap();
        assert_eq!(out, b"li-1elee");
    }

    #[test]
    fn capacity_matches_output() {
        let value = Value::List(vec![Value::string("spam"), Value::from(123456)]);
        let out = encode(&value);
        assert_eq!(out.len(), value.encoded_len());
        assert_eq!(out.capacity(), out.len());
    }
}
