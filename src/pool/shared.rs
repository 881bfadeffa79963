//! `SharedBuffer` - a pooled buffer whose every operation takes a lock.
//!
//! A plain [`Buffer`](super::Buffer) is owned by one caller and mutated through
//! `&mut self`. When a single checked-out buffer has to be used from several
//! threads, convert it with [`Buffer::with_mutex`](super::Buffer::with_mutex):
//! the result wraps the storage in a mutex and exposes `safe_*` methods on
//! `&self`, each of which locks, checks the buffer is still live, operates,
//! and unlocks before returning. Share it behind an `Arc` or a scoped borrow.
//!
//! Because the lock is part of the type, there is no way to call a `safe_*`
//! method on a buffer that lacks one.

use super::buffer::BufferFactory;
use super::byte_buf::ByteBuf;
use super::latch::ReturnLatch;
use crate::error::PoolError;
use core::fmt;
use parking_lot::{Mutex, MutexGuard};
use std::io;

/// A mutex-guarded pooled buffer that knows its parent factory.
pub struct SharedBuffer {
    inner: Mutex<Option<ByteBuf>>,
    pub(crate) returned: ReturnLatch,
    closed: ReturnLatch,
    parent: BufferFactory,
}

impl SharedBuffer {
    pub(crate) fn new(inner: Option<ByteBuf>, returned: bool, parent: BufferFactory) -> Self {
        let returned = if returned || inner.is_none() {
            ReturnLatch::spent()
        } else {
            ReturnLatch::new()
        };
        Self {
            inner: Mutex::new(inner),
            returned,
            closed: ReturnLatch::new(),
            parent,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<ByteBuf>> {
        self.inner.lock()
    }

    /// Runs `f` on the live storage while holding the lock.
    ///
    /// Use this when several steps must happen without another thread
    /// interleaving, e.g. check-then-write.
    pub fn with_locked<R>(&self, f: impl FnOnce(&mut ByteBuf) -> R) -> Result<R, PoolError> {
        let mut guard = self.inner.lock();
        guard.as_mut().map(f).ok_or(PoolError::BufferReturned)
    }

    /// Locked [`Buffer::write`](super::Buffer::write).
    pub fn safe_write(&self, p: &[u8]) -> Result<usize, PoolError> {
        self.with_locked(|b| b.write(p))
    }

    /// Locked [`Buffer::write_str`](super::Buffer::write_str).
    pub fn safe_write_str(&self, s: &str) -> Result<usize, PoolError> {
        self.with_locked(|b| b.write_str(s))
    }

    /// Locked [`Buffer::read`](super::Buffer::read).
    pub fn safe_read(&self, p: &mut [u8]) -> Result<usize, PoolError> {
        self.with_locked(|b| b.read(p))
    }

    /// A copy of the unread bytes; empty once returned.
    ///
    /// The bytes are copied because the lock is released before returning.
    pub fn safe_bytes(&self) -> Vec<u8> {
        self.with_locked(|b| b.as_bytes().to_vec()).unwrap_or_default()
    }

    /// The unread bytes as text (lossy); empty once returned.
    pub fn safe_string(&self) -> String {
        self.with_locked(|b| String::from_utf8_lossy(b.as_bytes()).into_owned())
            .unwrap_or_default()
    }

    /// Locked [`Buffer::reset`](super::Buffer::reset).
    pub fn safe_reset(&self) -> Result<(), PoolError> {
        self.with_locked(ByteBuf::reset)
    }

    /// Locked [`Buffer::truncate`](super::Buffer::truncate).
    pub fn safe_truncate(&self, n: usize) -> Result<(), PoolError> {
        self.with_locked(|b| b.truncate(n))?
    }

    /// Consumes up to `n` bytes and returns a copy; empty once returned.
    pub fn safe_next(&self, n: usize) -> Vec<u8> {
        self.with_locked(|b| b.next(n).to_vec()).unwrap_or_default()
    }

    /// Locked [`Buffer::read_from`](super::Buffer::read_from).
    ///
    /// The lock is held while `reader` is drained.
    pub fn safe_read_from<R: io::Read + ?Sized>(&self, reader: &mut R) -> Result<u64, PoolError> {
        Ok(self.with_locked(|b| b.read_from(reader))??)
    }

    /// Locked [`Buffer::write_to`](super::Buffer::write_to).
    ///
    /// The lock is held while `writer` accepts the bytes.
    pub fn safe_write_to<W: io::Write + ?Sized>(&self, writer: &mut W) -> Result<u64, PoolError> {
        Ok(self.with_locked(|b| b.write_to(writer))??)
    }

    /// Locked [`Buffer::read_byte`](super::Buffer::read_byte).
    pub fn safe_read_byte(&self) -> Result<Option<u8>, PoolError> {
        self.with_locked(ByteBuf::read_byte)
    }

    /// Locked [`Buffer::unread_byte`](super::Buffer::unread_byte).
    pub fn safe_unread_byte(&self) -> Result<(), PoolError> {
        self.with_locked(ByteBuf::unread_byte)?
    }

    /// Number of unread bytes; 0 once returned.
    pub fn safe_len(&self) -> usize {
        self.with_locked(|b| b.len()).unwrap_or(0)
    }

    /// Capacity of the storage; 0 once returned.
    pub fn safe_cap(&self) -> usize {
        self.with_locked(|b| b.capacity()).unwrap_or(0)
    }

    /// Returns the buffer to its parent factory while holding the lock.
    ///
    /// Only the first of `safe_close` and [`BufferFactory::safe_put`] succeeds.
    pub fn safe_close(&self) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        if inner.is_none() || !self.closed.consume() || !self.returned.consume() {
            self.parent.reject();
            return Err(PoolError::BufferReturned);
        }
        if let Some(storage) = inner.take() {
            self.parent.recycle(storage);
        }
        Ok(())
    }

    /// Returns `true` once the buffer has been returned.
    ///
    /// Only tries the lock: while another caller holds it the answer is `false`.
    pub fn safe_is_closed(&self) -> bool {
        self.inner.try_lock().is_some_and(|inner| inner.is_none())
    }

    /// The factory this buffer returns to.
    pub fn parent(&self) -> &BufferFactory {
        &self.parent
    }
}

impl Drop for SharedBuffer {
    fn drop(&mut self) {
        if let Some(storage) = self.inner.get_mut().take() {
            if self.returned.consume() {
                self.parent.recycle(storage);
            }
        }
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("returned", &self.returned.is_spent())
            .field("closed", &self.closed.is_spent())
            .finish_non_exhaustive()
    }
}
