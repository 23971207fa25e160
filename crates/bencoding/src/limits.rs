//! Resource limits applied while decoding untrusted input.
//!
//! Bencode carries no size information up front, so a hostile peer can send
//! a length prefix claiming gigabytes or a run of `l` markers nested
//! thousands deep. [`Limits`] caps both. The defaults are generous enough for
//! any real `.torrent` file; [`Limits::strict`] suits peer-wire messages.

use serde::{Deserialize, Serialize};

/// Decoder limits. Cheap to copy; pass by value.
///
/// Deserializable with missing fields filled from [`Limits::DEFAULT`], so a
/// host application can embed it in its own config file:
///
/// ```
/// use bencoding::Limits;
///
/// let limits: Limits = serde_json::from_str(r#"{"max_depth": 16}"#).unwrap();
/// assert_eq!(limits.max_depth, 16);
/// assert_eq!(limits.max_string_len, Limits::DEFAULT.max_string_len);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of simultaneously open lists and dictionaries.
    pub max_depth: usize,
    /// Maximum length of a single byte string, in bytes.
    pub max_string_len: usize,
    /// Maximum length of an integer literal between `i` and `e`, sign
    /// included.
    pub max_integer_len: usize,
}

impl Limits {
    pub const DEFAULT: Limits = Limits {
        max_depth: 512,
        max_string_len: 64 * 1024 * 1024, // 64 MiB
        max_integer_len: 1024,
    };

    /// Tight limits for small protocol messages (tracker responses, DHT,
    /// extension handshakes).
    pub const fn strict() -> Self {
        Self {
            max_depth: 64,
            max_string_len: 1024 * 1024, // 1 MiB
            max_integer_len: 64,
        }
    }

    /// No string limit and a depth limit that only guards the stack of
    /// whoever later drops the tree.
    pub const fn unbounded() -> Self {
        Self {
            max_depth: 4096,
            max_string_len: usize::MAX,
            max_integer_len: usize::MAX,
        }
    }

    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub const fn with_max_string_len(mut self, max_string_len: usize) -> Self {
        self.max_string_len = max_string_len;
        self
    }

    pub const fn with_max_integer_len(mut self, max_integer_len: usize) -> Self {
        self.max_integer_len = max_integer_len;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
