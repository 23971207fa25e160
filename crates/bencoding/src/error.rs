//! Error types for bencode decoding and encoding.

use std::fmt::Display;

use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while decoding, encoding, or bridging through serde.
///
/// Every decode error that points at the input carries the byte `offset`
/// at which it was detected, counted from the start of the source.
#[derive(Error, Debug)]
pub enum BencodeError {
    /// The source ran out of bytes in the middle of a value.
    #[error("unexpected end of input at offset {offset}")]
    EndOfInput { offset: usize },

    /// An `i...e` literal that is not `-?(0|[1-9][0-9]*)`, or is `-0`.
    /// `offset` points at the `i` marker.
    #[error("invalid integer literal at offset {offset}")]
    InvalidInteger { offset: usize },

    /// A byte-string length prefix that is not a non-negative decimal
    /// fitting in `usize`. `offset` points at its first digit.
    #[error("invalid byte string length at offset {offset}")]
    InvalidLength { offset: usize },

    /// A byte that cannot start a value at this point in the input.
    #[error("invalid marker byte 0x{byte:02x} at offset {offset}")]
    InvalidMarker { offset: usize, byte: u8 },

    /// A dictionary key with no value after it before the input ended.
    #[error("dictionary key at offset {offset} has no value")]
    MalformedDict { offset: usize },

    #[error("nesting deeper than {limit} levels at offset {offset}")]
    NestingTooDeep { offset: usize, limit: usize },

    /// An integer literal longer than the configured limit. `offset` points
    /// at the `i` marker.
    #[error("integer literal at offset {offset} is longer than {limit} bytes")]
    IntegerTooLong { offset: usize, limit: usize },

    #[error("byte string of {len} bytes at offset {offset} exceeds limit of {limit}")]
    StringTooLong {
        offset: usize,
        len: usize,
        limit: usize,
    },

    /// Bytes left over after a complete value in a single-value buffer.
    #[error("trailing data after value at offset {offset}")]
    TrailingData { offset: usize },

    /// The input decoded, but is not the canonical encoding of its value.
    #[error("input is not canonical bencode, first difference at offset {offset}")]
    NonCanonical { offset: usize },

    /// A Rust type with no bencode representation was serialized.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A serialized map produced the same key twice.
    #[error("duplicate dictionary key: {}", String::from_utf8_lossy(.0))]
    DuplicateKey(Bytes),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Free-form error raised by a `Serialize`/`Deserialize` implementation.
    #[error("{0}")]
    Message(String),
}

impl BencodeError {
    /// Byte offset into the input this error refers to, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            BencodeError::EndOfInput { offset }
            | BencodeError::InvalidInteger { offset }
            | BencodeError::InvalidLength { offset }
            | BencodeError::InvalidMarker { offset, .. }
            | BencodeError::MalformedDict { offset }
            | BencodeError::NestingTooDeep { offset, .. }
            | BencodeError::IntegerTooLong { offset, .. }
            | BencodeError::StringTooLong { offset, .. }
            | BencodeError::TrailingData { offset }
            | BencodeError::NonCanonical { offset } => Some(*offset),
            BencodeError::UnsupportedType(_)
            | BencodeError::DuplicateKey(_)
            | BencodeError::Io(_)
            | BencodeError::Message(_) => None,
        }
    }
}

impl serde::ser::Error for BencodeError {
    fn custom<T: Display>(msg: T) -> Self {
        BencodeError::Message(msg.to_string())
    }
}

impl serde::de::Error for BencodeError {
    fn custom<T: Display>(msg: T) -> Self {
        BencodeError::Message(msg.to_string())
    }
}

/// Convenience alias used throughout bencoding.
pub type Result<T> = std::result::Result<T, BencodeError>;
