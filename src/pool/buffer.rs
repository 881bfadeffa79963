//! `BufferFactory` and `Buffer` - pooled byte buffers that return exactly once.
//!
//! A [`Buffer`] owns its [`ByteBuf`] storage while it is live. Returning it,
//! through [`BufferFactory::put`] or [`Buffer::close`], moves the storage
//! back into the factory's store and leaves the handle empty for good. Every
//! later call on the handle fails softly: reads see an empty buffer, writes
//! and fallible reads get [`PoolError::BufferReturned`]. The `must_*`
//! siblings panic with that error instead.
//!
//! # Example
//! ```rust
//! use latchpool::pool::BufferFactory;
//!
//! let factory = BufferFactory::new();
//! let mut buf = factory.get();
//! buf.write(b"hello").unwrap();
//! assert_eq!(buf.bytes(), b"hello");
//!
//! factory.put(&mut buf).unwrap();
//! assert!(factory.put(&mut buf).is_err());
//! assert!(buf.write(b"again").is_err());
//! ```

use super::byte_buf::ByteBuf;
use super::latch::ReturnLatch;
use super::shared::SharedBuffer;
use super::store::{PoolConfig, Store, StatsSnapshot};
use crate::error::{must, PoolError};
use core::fmt;
use std::io;
use std::sync::Arc;

/// A pool of reusable byte buffers.
///
/// Clones share the same store, so a factory can be handed to many threads.
#[derive(Clone)]
pub struct BufferFactory {
    store: Arc<Store<Vec<u8>>>,
}

impl BufferFactory {
    /// Creates a factory whose fresh buffers start with no reserved capacity.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Creates a factory whose fresh buffers reserve `size` bytes.
    ///
    /// Recycled buffers keep whatever capacity they grew to.
    pub fn sized(size: usize) -> Self {
        Self::with_config(PoolConfig::sized(size))
    }

    /// Creates a factory from an explicit configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            store: Arc::new(Store::new(config)),
        }
    }

    /// Hands out an empty buffer, recycled when possible.
    pub fn get(&self) -> Buffer {
        Buffer {
            inner: Some(ByteBuf::from_vec(self.store.take())),
            returned: ReturnLatch::new(),
            parent: None,
        }
    }

    /// Returns `buf` to the pool.
    ///
    /// The storage is reset before it is pooled and the handle is emptied.
    /// Fails with [`PoolError::BufferReturned`] on every call after the first.
    pub fn put(&self, buf: &mut Buffer) -> Result<(), PoolError> {
        if !buf.returned.consume() {
            self.reject();
            return Err(PoolError::BufferReturned);
        }
        match buf.inner.take() {
            Some(inner) => {
                self.recycle(inner);
                Ok(())
            }
            None => Err(PoolError::BufferReturned),
        }
    }

    /// Same as [`put`](Self::put) but panics if `buf` was already returned.
    #[track_caller]
    pub fn must_put(&self, buf: &mut Buffer) {
        must(self.put(buf));
    }

    /// Returns a shared buffer to the pool while holding its lock.
    pub fn safe_put(&self, buf: &SharedBuffer) -> Result<(), PoolError> {
        let mut inner = buf.lock();
        if !buf.returned.consume() {
            self.reject();
            return Err(PoolError::BufferReturned);
        }
        match inner.take() {
            Some(storage) => {
                self.recycle(storage);
                Ok(())
            }
            None => Err(PoolError::BufferReturned),
        }
    }

    /// Number of idle buffers waiting in the pool.
    pub fn idle(&self) -> usize {
        self.store.idle()
    }

    /// Counters for this factory and all its clones.
    pub fn stats(&self) -> StatsSnapshot {
        self.store.stats().snapshot()
    }

    /// The configuration the factory was built with.
    pub fn config(&self) -> PoolConfig {
        *self.store.config()
    }

    pub(crate) fn recycle(&self, storage: ByteBuf) {
        self.store.give(storage.into_vec());
    }

    pub(crate) fn reject(&self) {
        self.store.stats().record_rejected();
        debug_event!("rejected return of a buffer that was already returned");
    }
}

impl Default for BufferFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferFactory")
            .field("config", self.store.config())
            .field("idle", &self.store.idle())
            .finish()
    }
}

/// Parent link that lets a buffer close itself.
struct Parent {
    factory: BufferFactory,
    closed: ReturnLatch,
}

/// A byte buffer checked out of a [`BufferFactory`].
pub struct Buffer {
    inner: Option<ByteBuf>,
    returned: ReturnLatch,
    parent: Option<Parent>,
}

impl Buffer {
    #[inline]
    fn live(&self) -> Result<&ByteBuf, PoolError> {
        self.inner.as_ref().ok_or(PoolError::BufferReturned)
    }

    #[inline]
    fn live_mut(&mut self) -> Result<&mut ByteBuf, PoolError> {
        self.inner.as_mut().ok_or(PoolError::BufferReturned)
    }

    /// Records `factory` as the buffer's parent, enabling [`close`](Self::close).
    pub fn with_parent(mut self, factory: &BufferFactory) -> Self {
        self.parent = Some(Parent {
            factory: factory.clone(),
            closed: ReturnLatch::new(),
        });
        self
    }

    /// Converts the buffer into a [`SharedBuffer`] guarded by a mutex, with
    /// `factory` as its parent.
    pub fn with_mutex(mut self, factory: &BufferFactory) -> SharedBuffer {
        let returned = self.returned.is_spent();
        SharedBuffer::new(self.inner.take(), returned, factory.clone())
    }

    /// Returns `true` once the buffer has been put back or closed.
    pub fn is_returned(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns `true` if the buffer knows its parent and has been returned.
    ///
    /// A buffer without a parent always reports `false`.
    pub fn is_closed(&self) -> bool {
        self.parent.is_some() && self.inner.is_none()
    }

    /// Returns the buffer to its parent factory.
    ///
    /// Uses a latch of its own, separate from the one [`BufferFactory::put`]
    /// consumes, so a second `close` fails without touching the pool.
    pub fn close(&mut self) -> Result<(), PoolError> {
        if self.inner.is_none() {
            return Err(PoolError::BufferReturned);
        }
        let Some(parent) = self.parent.as_ref() else {
            return Err(PoolError::NoParent);
        };
        if !parent.closed.consume() {
            parent.factory.reject();
            return Err(PoolError::BufferReturned);
        }
        let factory = parent.factory.clone();
        factory.put(self)
    }

    /// The unread bytes; empty once returned.
    pub fn bytes(&self) -> &[u8] {
        self.inner.as_ref().map(ByteBuf::as_bytes).unwrap_or_default()
    }

    /// Same as [`bytes`](Self::bytes) but panics once returned.
    #[track_caller]
    pub fn must_bytes(&self) -> &[u8] {
        must(self.live()).as_bytes()
    }

    /// The unread bytes as text (lossy); panics once returned.
    #[track_caller]
    pub fn must_string(&self) -> String {
        String::from_utf8_lossy(must(self.live()).as_bytes()).into_owned()
    }

    /// Number of unread bytes; 0 once returned.
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, ByteBuf::len)
    }

    /// Same as [`len`](Self::len) but panics once returned.
    #[track_caller]
    pub fn must_len(&self) -> usize {
        must(self.live()).len()
    }

    /// Returns `true` when there is nothing to read (always, once returned).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the storage; 0 once returned.
    pub fn cap(&self) -> usize {
        self.inner.as_ref().map_or(0, ByteBuf::capacity)
    }

    /// Empties the buffer, keeping its storage.
    pub fn reset(&mut self) -> Result<(), PoolError> {
        self.live_mut()?.reset();
        Ok(())
    }

    /// Same as [`reset`](Self::reset) but panics once returned.
    #[track_caller]
    pub fn must_reset(&mut self) {
        must(self.reset());
    }

    /// Appends `p`.
    pub fn write(&mut self, p: &[u8]) -> Result<usize, PoolError> {
        Ok(self.live_mut()?.write(p))
    }

    /// Same as [`write`](Self::write) but panics once returned.
    #[track_caller]
    pub fn must_write(&mut self, p: &[u8]) {
        must(self.write(p));
    }

    /// Appends the bytes of `s`.
    pub fn write_str(&mut self, s: &str) -> Result<usize, PoolError> {
        Ok(self.live_mut()?.write_str(s))
    }

    /// Same as [`write_str`](Self::write_str) but panics once returned.
    #[track_caller]
    pub fn must_write_str(&mut self, s: &str) {
        must(self.write_str(s));
    }

    /// Appends the UTF-8 encoding of `c`, returning its width.
    pub fn write_char(&mut self, c: char) -> Result<usize, PoolError> {
        Ok(self.live_mut()?.write_char(c))
    }

    /// Same as [`write_char`](Self::write_char) but panics once returned.
    #[track_caller]
    pub fn must_write_char(&mut self, c: char) {
        must(self.write_char(c));
    }

    /// Appends one byte.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), PoolError> {
        self.live_mut()?.write_byte(byte);
        Ok(())
    }

    /// Same as [`write_byte`](Self::write_byte) but panics once returned.
    #[track_caller]
    pub fn must_write_byte(&mut self, byte: u8) {
        must(self.write_byte(byte));
    }

    /// Guarantees room for `n` more bytes.
    pub fn grow(&mut self, n: usize) -> Result<(), PoolError> {
        self.live_mut()?.grow(n);
        Ok(())
    }

    /// Same as [`grow`](Self::grow) but panics once returned.
    #[track_caller]
    pub fn must_grow(&mut self, n: usize) {
        must(self.grow(n));
    }

    /// Keeps only the first `n` unread bytes.
    pub fn truncate(&mut self, n: usize) -> Result<(), PoolError> {
        self.live_mut()?.truncate(n)
    }

    /// Same as [`truncate`](Self::truncate) but panics on any error.
    #[track_caller]
    pub fn must_truncate(&mut self, n: usize) {
        must(self.truncate(n));
    }

    /// Reads unread bytes into `p`; `Ok(0)` once drained.
    pub fn read(&mut self, p: &mut [u8]) -> Result<usize, PoolError> {
        Ok(self.live_mut()?.read(p))
    }

    /// Consumes one byte; `Ok(None)` once drained.
    pub fn read_byte(&mut self) -> Result<Option<u8>, PoolError> {
        Ok(self.live_mut()?.read_byte())
    }

    /// Consumes one UTF-8 character and its width; `Ok(None)` once drained.
    pub fn read_char(&mut self) -> Result<Option<(char, usize)>, PoolError> {
        Ok(self.live_mut()?.read_char())
    }

    /// Steps back over the last byte read.
    pub fn unread_byte(&mut self) -> Result<(), PoolError> {
        self.live_mut()?.unread_byte()
    }

    /// Steps back over the last character returned by [`read_char`](Self::read_char).
    pub fn unread_char(&mut self) -> Result<(), PoolError> {
        self.live_mut()?.unread_char()
    }

    /// Consumes bytes up to and including `delim`, or everything left.
    pub fn read_until(&mut self, delim: u8) -> Result<Vec<u8>, PoolError> {
        Ok(self.live_mut()?.read_until(delim))
    }

    /// Consumes up to `n` bytes; empty once returned.
    pub fn next(&mut self, n: usize) -> &[u8] {
        match self.inner.as_mut() {
            Some(inner) => inner.next(n),
            None => &[],
        }
    }

    /// Appends everything `reader` yields until end of stream.
    pub fn read_from<R: io::Read + ?Sized>(&mut self, reader: &mut R) -> Result<u64, PoolError> {
        Ok(self.live_mut()?.read_from(reader)?)
    }

    /// Same as [`read_from`](Self::read_from) but panics on any error.
    #[track_caller]
    pub fn must_read_from<R: io::Read + ?Sized>(&mut self, reader: &mut R) -> u64 {
        must(self.read_from(reader))
    }

    /// Drains the unread bytes into `writer`.
    pub fn write_to<W: io::Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64, PoolError> {
        Ok(self.live_mut()?.write_to(writer)?)
    }

    /// Same as [`write_to`](Self::write_to) but panics on any error.
    #[track_caller]
    pub fn must_write_to<W: io::Write + ?Sized>(&mut self, writer: &mut W) -> u64 {
        must(self.write_to(writer))
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // A live buffer that knows its parent goes home instead of being freed.
        if let (Some(inner), Some(parent)) = (self.inner.take(), self.parent.as_ref()) {
            if self.returned.consume() {
                parent.factory.recycle(inner);
            }
        }
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.bytes()))
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("inner", &self.inner)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl io::Read for Buffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(Buffer::read(self, buf)?)
    }
}

impl io::BufRead for Buffer {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.live()?.as_bytes())
    }

    fn consume(&mut self, amt: usize) {
        self.next(amt);
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Buffer::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.live()?;
        Ok(())
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Buffer::write_str(self, s).map(drop).map_err(|_| fmt::Error)
    }
}
