//! Bencode decoder: turns a byte source into a [`Value`] tree.
//!
//! The decoder dispatches on one marker byte per value:
//!
//! - `0`–`9`: byte string, `<len>:<bytes>`
//! - `i`: integer, `i<digits>e`
//! - `l`: list, `l<values>e`
//! - `d`: dictionary, `d(<bytestring><value>)*e`
//!
//! # Key design decisions
//!
//! - **Explicit work stack**: open lists and dictionaries live in a `Vec` of
//!   frames instead of on the call stack, so adversarial nesting can only
//!   grow the heap, and only up to [`Limits::max_depth`].
//! - **Permissive dictionaries**: key order and uniqueness are not checked.
//!   A repeated key keeps its last value. Use [`decode_canonical`] when the
//!   input must be byte-for-byte canonical (e.g. before hashing an info dict).
//! - **Strict integers**: `i-0e`, `i03e`, `ie` and `i-e` are rejected.
//! - **Positions everywhere**: every error carries the byte offset at which
//!   it was detected.

use std::collections::BTreeMap;
use std::io::Read;

use bytes::Bytes;
use num_bigint::BigInt;

use crate::encoder::encode;
use crate::error::{BencodeError, Result};
use crate::limits::Limits;
use crate::source::{ByteSource, ReaderSource, SliceSource};
use crate::types::Value;

/// Decode the bencoded value at the start of `input`.
///
/// Uses [`Limits::DEFAULT`]. Like the stream entry points, decoding stops at
/// the end of the first value and any bytes after it are ignored. Use
/// [`decode_exact`] when the buffer must hold exactly one value.
///
/// ```
/// use bencoding::{decode, Value};
///
/// let v = decode(b"l4:spami42ee").unwrap();
/// assert_eq!(v, Value::List(vec![Value::string("spam"), Value::from(42)]));
/// assert_eq!(decode(b"4:spamXYZ").unwrap(), Value::string("spam"));
/// ```
pub fn decode(input: &[u8]) -> Result<Value> {
    Decoder::default().decode(input)
}

/// Decode a buffer holding exactly one bencoded value.
///
/// Bytes after the value fail with [`BencodeError::TrailingData`].
pub fn decode_exact(input: &[u8]) -> Result<Value> {
    Decoder::default().decode_exact(input)
}

/// Decode the first value in `input`, returning it with the number of bytes
/// it occupied.
pub fn decode_prefix(input: &[u8]) -> Result<(Value, usize)> {
    Decoder::default().decode_prefix(input)
}

/// Decode one value from an arbitrary [`ByteSource`], leaving the source
/// positioned just after it.
pub fn decode_from<S: ByteSource>(source: &mut S) -> Result<Value> {
    Decoder::default().decode_from(source)
}

/// Decode one value from a blocking reader.
///
/// Reads exactly the bytes of one value and nothing more.
pub fn decode_reader<R: Read>(reader: R) -> Result<Value> {
    Decoder::default().decode_reader(reader)
}

/// Decode `input` and require it to be the canonical encoding of the result.
///
/// Fails with [`BencodeError::NonCanonical`] pointing at the first byte that
/// differs from the canonical form, which catches unsorted or repeated
/// dictionary keys and zero-padded length prefixes.
pub fn decode_canonical(input: &[u8]) -> Result<Value> {
    Decoder::default().decode_canonical(input)
}

/// A decoder configured with non-default [`Limits`].
///
/// ```
/// use bencoding::{BencodeError, Decoder, Limits};
///
/// let decoder = Decoder::new(Limits::DEFAULT.with_max_depth(1));
/// assert!(decoder.decode(b"li1ee").is_ok());
/// assert!(matches!(
///     decoder.decode(b"llee"),
///     Err(BencodeError::NestingTooDeep { offset: 1, limit: 1 })
/// ));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    limits: Limits,
}

/// An open container waiting for more elements.
enum Frame {
    List(Vec<Value>),
    /// `key` holds a decoded key (and its offset) still waiting for a value.
    Dict {
        entries: BTreeMap<Bytes, Value>,
        key: Option<(Bytes, usize)>,
    },
}

impl Frame {
    fn into_value(self) -> Value {
        match self {
            Frame::List(items) => Value::List(items),
            Frame::Dict { entries, .. } => Value::Dict(entries),
        }
    }
}

/// Enough decimal digits for any `usize` length prefix. Longer prefixes,
/// zero padding included, are rejected before the colon is found.
const MAX_LENGTH_DIGITS: usize = 20;

/// What the next marker byte is expected to start.
#[derive(Clone, Copy)]
enum Slot {
    Root,
    Element,
    Key,
    DictValue,
}

impl Decoder {
    pub const fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn decode(&self, input: &[u8]) -> Result<Value> {
        self.decode_from(&mut SliceSource::new(input))
    }

    pub fn decode_exact(&self, input: &[u8]) -> Result<Value> {
        let (value, used) = self.decode_prefix(input)?;
        if used < input.len() {
            tracing::debug!(offset = used, trailing = input.len() - used, "trailing data after bencode value");
            return Err(BencodeError::TrailingData { offset: used });
        }
        Ok(value)
    }

    pub fn decode_prefix(&self, input: &[u8]) -> Result<(Value, usize)> {
        let mut source = SliceSource::new(input);
        let value = self.decode_from(&mut source)?;
        Ok((value, source.position()))
    }

    pub fn decode_reader<R: Read>(&self, reader: R) -> Result<Value> {
        self.decode_from(&mut ReaderSource::new(reader))
    }

    pub fn decode_canonical(&self, input: &[u8]) -> Result<Value> {
        let value = self.decode_exact(input)?;
        let canonical = encode(&value);
        if canonical != input {
            let offset = input
                .iter()
                .zip(&canonical)
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| input.len().min(canonical.len()));
            tracing::debug!(offset, "bencode input is not canonical");
            return Err(BencodeError::NonCanonical { offset });
        }
        Ok(value)
    }

    pub fn decode_from<S: ByteSource>(&self, source: &mut S) -> Result<Value> {
        let start = source.position();
        tracing::trace!(start, max_depth = self.limits.max_depth, "decoding bencode value");
        self.parse(source).inspect_err(|e| {
            tracing::debug!(error = %e, offset = ?e.offset(), "bencode decode failed");
        })
    }

    fn parse<S: ByteSource>(&self, src: &mut S) -> Result<Value> {
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let slot = match stack.last() {
                None => Slot::Root,
                Some(Frame::List(_)) => Slot::Element,
                Some(Frame::Dict { key: None, .. }) => Slot::Key,
                Some(Frame::Dict { key: Some(_), .. }) => Slot::DictValue,
            };

            let offset = src.position();
            let Some(marker) = src.next_byte()? else {
                if let Some(Frame::Dict {
                    key: Some((_, key_offset)),
                    ..
                }) = stack.last()
                {
                    return Err(BencodeError::MalformedDict {
                        offset: *key_offset,
                    });
                }
                return Err(BencodeError::EndOfInput { offset });
            };

            let value = match (slot, marker) {
                (Slot::Element | Slot::Key, b'e') => {
                    let frame = stack
                        .pop()
                        .ok_or(BencodeError::InvalidMarker { offset, byte: marker })?;
                    frame.into_value()
                }
                (Slot::Key, b'0'..=b'9') => {
                    let key = self.parse_bytes(src, marker, offset)?;
                    if let Some(Frame::Dict { key: pending, .. }) = stack.last_mut() {
                        *pending = Some((key, offset));
                    }
                    continue;
                }
                (Slot::Key, byte) => return Err(BencodeError::InvalidMarker { offset, byte }),
                (_, b'0'..=b'9') => Value::Bytes(self.parse_bytes(src, marker, offset)?),
                (_, b'i') => Value::Integer(self.parse_integer(src, offset)?),
                (_, b'l' | b'd') => {
                    if stack.len() >= self.limits.max_depth {
                        tracing::debug!(offset, limit = self.limits.max_depth, "bencode nesting limit reached");
                        return Err(BencodeError::NestingTooDeep {
                            offset,
                            limit: self.limits.max_depth,
                        });
                    }
                    stack.push(if marker == b'l' {
                        Frame::List(Vec::new())
                    } else {
                        Frame::Dict {
                            entries: BTreeMap::new(),
                            key: None,
                        }
                    });
                    continue;
                }
                (_, byte) => return Err(BencodeError::InvalidMarker { offset, byte }),
            };

            match stack.last_mut() {
                None => return Ok(value),
                Some(Frame::List(items)) => items.push(value),
                Some(Frame::Dict { entries, key }) => {
                    if let Some((k, _)) = key.take() {
                        entries.insert(k, value);
                    }
                }
            }
        }
    }

    /// Reads the rest of a `<len>:<bytes>` string whose first digit was
    /// `first` at `offset`.
    fn parse_bytes<S: ByteSource>(&self, src: &mut S, first: u8, offset: usize) -> Result<Bytes> {
        let mut prefix = vec![first];
        let rest = src
            .read_until(b':', MAX_LENGTH_DIGITS - 1)?
            .ok_or(BencodeError::InvalidLength { offset })?;
        prefix.extend(rest);

        let len = parse_length(&prefix).ok_or(BencodeError::InvalidLength { offset })?;
        if len > self.limits.max_string_len {
            tracing::debug!(offset, len, limit = self.limits.max_string_len, "bencode string limit reached");
            return Err(BencodeError::StringTooLong {
                offset,
                len,
                limit: self.limits.max_string_len,
            });
        }

        Ok(Bytes::from(src.read_exact(len)?))
    }

    /// Reads an integer literal whose `i` marker was at `offset`.
    fn parse_integer<S: ByteSource>(&self, src: &mut S, offset: usize) -> Result<BigInt> {
        let limit = self.limits.max_integer_len;
        let Some(literal) = src.read_until(b'e', limit)? else {
            tracing::debug!(offset, limit, "bencode integer limit reached");
            return Err(BencodeError::IntegerTooLong { offset, limit });
        };
        if !is_valid_integer(&literal) {
            return Err(BencodeError::InvalidInteger { offset });
        }
        BigInt::parse_bytes(&literal, 10).ok_or(BencodeError::InvalidInteger { offset })
    }
}

/// `-?(0|[1-9][0-9]*)`, excluding `-0`.
fn is_valid_integer(literal: &[u8]) -> bool {
    let digits = literal.strip_prefix(b"-").unwrap_or(literal);
    match digits {
        [] => false,
        [b'0'] => digits.len() == literal.len(),
        [b'0', ..] => false,
        _ => digits.iter().all(u8::is_ascii_digit),
    }
}

fn parse_length(prefix: &[u8]) -> Option<usize> {
    if !prefix.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(prefix).ok()?.parse().ok()
}
