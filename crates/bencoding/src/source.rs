//! Position-tracked byte cursors the decoder reads from.
//!
//! [`ByteSource`] is the decoder's only view of its input. Two sources are
//! provided:
//!
//! - [`SliceSource`] scans an in-memory buffer without copying until a value
//!   is materialized.
//! - [`ReaderSource`] pulls from any blocking [`std::io::Read`]. It never
//!   reads past the end of the value being decoded, so the reader can be
//!   handed back to the caller with the next message intact.
//!
//! Offsets are counted from where the source started, and every short read
//! reports the offset at which that read began.

use std::io::{self, Read};

use crate::error::{BencodeError, Result};

/// A sequential, byte-exact input for the decoder.
pub trait ByteSource {
    /// Consumes and returns the next byte, or `None` if the source is
    /// exhausted.
    fn next_byte(&mut self) -> Result<Option<u8>>;

    /// Consumes exactly `n` bytes.
    ///
    /// Fails with [`BencodeError::EndOfInput`] carrying the offset where the
    /// read began if fewer than `n` bytes remain.
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Consumes bytes up to and including the next `delimiter`, returning
    /// everything before it.
    ///
    /// Returns `Ok(None)` once more than `limit` bytes have been scanned
    /// without finding the delimiter. The source is then left somewhere
    /// inside the scanned bytes.
    fn read_until(&mut self, delimiter: u8, limit: usize) -> Result<Option<Vec<u8>>>;

    /// Number of bytes consumed so far.
    fn position(&self) -> usize;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        (**self).next_byte()
    }

    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        (**self).read_exact(n)
    }

    fn read_until(&mut self, delimiter: u8, limit: usize) -> Result<Option<Vec<u8>>> {
        (**self).read_until(delimiter, limit)
    }

    fn position(&self) -> usize {
        (**self).position()
    }
}

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let rest = self.remaining();
        if rest.len() < n {
            return Err(BencodeError::EndOfInput { offset: self.pos });
        }
        self.pos += n;
        Ok(rest[..n].to_vec())
    }

    fn read_until(&mut self, delimiter: u8, limit: usize) -> Result<Option<Vec<u8>>> {
        let rest = self.remaining();
        let window = &rest[..rest.len().min(limit.saturating_add(1))];
        match window.iter().position(|&b| b == delimiter) {
            Some(idx) => {
                self.pos += idx + 1;
                Ok(Some(rest[..idx].to_vec()))
            }
            None if rest.len() > limit => {
                self.pos += limit;
                Ok(None)
            }
            None => Err(BencodeError::EndOfInput { offset: self.pos }),
        }
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// Source pulling from a blocking reader one byte at a time.
///
/// Wrap slow readers (sockets, files) in a [`std::io::BufReader`] first;
/// this type adds no buffering of its own so it never over-reads.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    pos: usize,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, pos: 0 }
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns the underlying reader, positioned just after the last byte
    /// consumed.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_one(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.read_one()?;
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let start = self.pos;
        // Grow with the bytes actually received rather than trusting `n`.
        let mut buf = Vec::new();
        let got = (&mut self.reader).take(n as u64).read_to_end(&mut buf)?;
        self.pos += got;
        if got < n {
            return Err(BencodeError::EndOfInput { offset: start });
        }
        Ok(buf)
    }

    fn read_until(&mut self, delimiter: u8, limit: usize) -> Result<Option<Vec<u8>>> {
        let start = self.pos;
        let mut buf = Vec::new();
        loop {
            match self.read_one()? {
                Some(b) => {
                    self.pos += 1;
                    if b == delimiter {
                        return Ok(Some(buf));
                    }
                    if buf.len() >= limit {
                        return Ok(None);
                    }
                    buf.push(b);
                }
                None => return Err(BencodeError::EndOfInput { offset: start }),
            }
        }
    }

    fn position(&self) -> usize {
        self.pos
    }
}
