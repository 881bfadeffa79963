//! `ByteBuf` - a growable byte buffer with a read cursor.
//!
//! Writes append at the end, reads consume from the front. Consumed bytes
//! stay in the allocation until the next write needs the room, which is what
//! makes [`ByteBuf::unread_byte`] and [`ByteBuf::unread_char`] possible.
//!
//! # Layout
//! ```text
//!  0          off                  buf.len()        buf.capacity()
//!  | consumed  |      unread        |      spare      |
//! ```

use crate::error::PoolError;
use core::{cmp, fmt};
use std::io;

/// Room reserved before handing the spare capacity to a reader.
const MIN_READ: usize = 512;

/// What the last operation was, for the unread methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastRead {
    Invalid,
    Read,
    /// A `read_char` that consumed this many bytes.
    Char(usize),
}

/// A growable read/write byte buffer.
pub struct ByteBuf {
    buf: Vec<u8>,
    off: usize,
    last_read: LastRead,
}

impl ByteBuf {
    /// Creates an empty buffer without allocating.
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            off: 0,
            last_read: LastRead::Invalid,
        }
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Wraps `buf`; its contents become the unread portion.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self {
            buf,
            off: 0,
            last_read: LastRead::Invalid,
        }
    }

    /// Gives back the backing allocation.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len() - self.off
    }

    /// Returns `true` when nothing is left to read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.len() <= self.off
    }

    /// Total bytes the allocation can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The unread portion. Valid until the next mutation.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.off..]
    }

    /// Empties the buffer, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.off = 0;
        self.last_read = LastRead::Invalid;
    }

    /// Keeps only the first `n` unread bytes.
    pub fn truncate(&mut self, n: usize) -> Result<(), PoolError> {
        if n == 0 {
            self.reset();
            return Ok(());
        }
        self.last_read = LastRead::Invalid;
        let len = self.len();
        if n > len {
            return Err(PoolError::TruncateOutOfRange { len, requested: n });
        }
        self.buf.truncate(self.off + n);
        Ok(())
    }

    /// Guarantees room for `n` more bytes without another allocation.
    pub fn grow(&mut self, n: usize) {
        self.make_room(n);
    }

    fn make_room(&mut self, n: usize) {
        if self.is_empty() && self.off != 0 {
            self.reset();
        }
        if self.buf.capacity() - self.buf.len() >= n {
            return;
        }
        if self.off > 0 {
            self.buf.drain(..self.off);
            self.off = 0;
        }
        self.buf.reserve(n);
    }

    /// Appends `p`, returning its length.
    pub fn write(&mut self, p: &[u8]) -> usize {
        self.last_read = LastRead::Invalid;
        self.make_room(p.len());
        self.buf.extend_from_slice(p);
        p.len()
    }

    /// Appends the bytes of `s`.
    pub fn write_str(&mut self, s: &str) -> usize {
        self.write(s.as_bytes())
    }

    /// Appends one byte.
    pub fn write_byte(&mut self, byte: u8) {
        self.last_read = LastRead::Invalid;
        self.make_room(1);
        self.buf.push(byte);
    }

    /// Appends the UTF-8 encoding of `c`, returning its width.
    pub fn write_char(&mut self, c: char) -> usize {
        let mut utf8 = [0u8; 4];
        self.write(c.encode_utf8(&mut utf8).as_bytes())
    }

    /// Copies up to `p.len()` unread bytes into `p`. Returns 0 once drained.
    pub fn read(&mut self, p: &mut [u8]) -> usize {
        self.last_read = LastRead::Invalid;
        if self.is_empty() {
            self.reset();
            return 0;
        }
        let n = cmp::min(p.len(), self.len());
        p[..n].copy_from_slice(&self.buf[self.off..self.off + n]);
        self.off += n;
        if n > 0 {
            self.last_read = LastRead::Read;
        }
        n
    }

    /// Consumes and returns up to `n` unread bytes.
    pub fn next(&mut self, n: usize) -> &[u8] {
        self.last_read = LastRead::Invalid;
        let m = cmp::min(n, self.len());
        let start = self.off;
        self.off += m;
        if m > 0 {
            self.last_read = LastRead::Read;
        }
        &self.buf[start..start + m]
    }

    /// Consumes one byte.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.is_empty() {
            self.reset();
            return None;
        }
        let byte = self.buf[self.off];
        self.off += 1;
        self.last_read = LastRead::Read;
        Some(byte)
    }

    /// Consumes one UTF-8 encoded character and reports its width.
    ///
    /// An invalid encoding consumes a single byte and yields
    /// `U+FFFD REPLACEMENT CHARACTER` with width 1.
    pub fn read_char(&mut self) -> Option<(char, usize)> {
        if self.is_empty() {
            self.reset();
            return None;
        }
        let (c, width) = decode_char(&self.buf[self.off..]);
        self.off += width;
        self.last_read = LastRead::Char(width);
        Some((c, width))
    }

    /// Steps back over the last byte of the most recent successful read.
    pub fn unread_byte(&mut self) -> Result<(), PoolError> {
        if self.last_read == LastRead::Invalid {
            return Err(PoolError::InvalidUnread);
        }
        self.last_read = LastRead::Invalid;
        if self.off > 0 {
            self.off -= 1;
        }
        Ok(())
    }

    /// Steps back over the character returned by the last `read_char`.
    pub fn unread_char(&mut self) -> Result<(), PoolError> {
        let LastRead::Char(width) = self.last_read else {
            return Err(PoolError::InvalidUnread);
        };
        self.last_read = LastRead::Invalid;
        if self.off >= width {
            self.off -= width;
        }
        Ok(())
    }

    /// Consumes bytes up to and including the first `delim`.
    ///
    /// When `delim` never occurs, everything left is returned; the result ends
    /// with `delim` exactly when it was found.
    pub fn read_until(&mut self, delim: u8) -> Vec<u8> {
        let rest = &self.buf[self.off..];
        let end = rest
            .iter()
            .position(|&b| b == delim)
            .map_or(rest.len(), |i| i + 1);
        let out = rest[..end].to_vec();
        self.off += end;
        self.last_read = LastRead::Read;
        out
    }

    /// Appends everything `reader` yields until end of stream.
    pub fn read_from<R: io::Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<u64> {
        self.last_read = LastRead::Invalid;
        self.make_room(MIN_READ);
        let n = reader.read_to_end(&mut self.buf)?;
        Ok(n as u64)
    }

    /// Drains the unread bytes into `writer`.
    ///
    /// Bytes accepted by the writer are consumed even when a later write fails.
    pub fn write_to<W: io::Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<u64> {
        self.last_read = LastRead::Invalid;
        let mut written = 0u64;
        while self.off < self.buf.len() {
            match writer.write(&self.buf[self.off..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => {
                    self.off += n;
                    written += n as u64;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        self.reset();
        Ok(written)
    }
}

fn decode_char(bytes: &[u8]) -> (char, usize) {
    let first = bytes[0];
    if first < 0x80 {
        return (char::from(first), 1);
    }
    let width = match first {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return (char::REPLACEMENT_CHARACTER, 1),
    };
    bytes
        .get(..width)
        .and_then(|seq| core::str::from_utf8(seq).ok())
        .and_then(|s| s.chars().next())
        .map_or((char::REPLACEMENT_CHARACTER, 1), |c| (c, width))
}

impl Default for ByteBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ByteBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuf")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("offset", &self.off)
            .finish()
    }
}

impl io::Read for ByteBuf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(ByteBuf::read(self, buf))
    }
}

impl io::Write for ByteBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(ByteBuf::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
