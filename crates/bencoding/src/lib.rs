//! # bencoding
//!
//! Decoder and canonical encoder for **bencode**, the serialization format of
//! BitTorrent `.torrent` files, tracker responses and DHT/peer messages
//! ([BEP-3]).
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Byte string | `<length>:<bytes>` | `4:spam` |
//! | Integer | `i<n>e` | `i-3e` |
//! | List | `l<values>e` | `l4:spami42ee` |
//! | Dictionary | `d(<key><value>)*e` | `d3:cow3:mooe` |
//!
//! ## Quick start
//!
//! ```rust
//! use bencoding::{decode, encode, Value};
//!
//! let value = decode(b"d4:spaml1:a1:be3:cowi2ee").unwrap();
//! assert_eq!(value.get(b"cow").and_then(Value::as_i64), Some(2));
//!
//! // Keys come back out sorted: the encoding is canonical.
//! assert_eq!(encode(&value), b"d3:cowi2e4:spaml1:a1:bee");
//! ```
//!
//! Streams are decoded one value at a time without reading past its end:
//!
//! ```rust
//! use std::io::Cursor;
//! use bencoding::decode_reader;
//!
//! let mut wire = Cursor::new(b"i1ei2e".to_vec());
//! assert_eq!(decode_reader(&mut wire).unwrap().as_i64(), Some(1));
//! assert_eq!(decode_reader(&mut wire).unwrap().as_i64(), Some(2));
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: bytes or stream → [`Value`], with [`Limits`]
//! - [`encoder`]: [`Value`] → canonical bytes
//! - [`source`]: the [`ByteSource`] cursors the decoder reads from
//! - [`types`]: the [`Value`] model
//! - [`ser`] / [`de`]: serde bridge (`to_bytes`, `from_bytes`)
//! - [`error`]: [`BencodeError`] and the crate `Result`
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

pub mod de;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod limits;
pub mod ser;
pub mod source;
pub mod types;

pub use de::{from_bytes, from_value};
pub use decoder::{
    decode, decode_canonical, decode_exact, decode_from, decode_prefix, decode_reader, Decoder,
};
pub use encoder::{encode, encode_into, encode_to};
pub use error::{BencodeError, Result};
pub use limits::Limits;
pub use ser::{to_bytes, to_value};
pub use source::{ByteSource, ReaderSource, SliceSource};
pub use types::{Value, ValueKind};
