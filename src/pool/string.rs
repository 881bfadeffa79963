//! `StringFactory` and `PooledString` - pooled string builders.
//!
//! The same return-once discipline as [`Buffer`](super::Buffer) applied to a
//! `String`, with a narrower surface: no locked variant and no self-close.

use super::latch::ReturnLatch;
use super::store::{PoolConfig, Store, StatsSnapshot};
use crate::error::{must, PoolError};
use core::fmt;
use std::sync::Arc;

/// A pool of reusable string builders.
#[derive(Clone)]
pub struct StringFactory {
    store: Arc<Store<String>>,
}

impl StringFactory {
    /// Creates a factory whose fresh strings start with no reserved capacity.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Creates a factory whose fresh strings reserve `size` bytes.
    pub fn sized(size: usize) -> Self {
        Self::with_config(PoolConfig::sized(size))
    }

    /// Creates a factory from an explicit configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            store: Arc::new(Store::new(config)),
        }
    }

    /// Hands out an empty string, recycled when possible.
    pub fn get(&self) -> PooledString {
        PooledString {
            inner: Some(self.store.take()),
            returned: ReturnLatch::new(),
        }
    }

    /// Resets `s` and returns its storage to the pool.
    ///
    /// Fails with [`PoolError::BufferReturned`] on every call after the first.
    pub fn put(&self, s: &mut PooledString) -> Result<(), PoolError> {
        if !s.returned.consume() {
            self.store.stats().record_rejected();
            debug_event!("rejected return of a string that was already returned");
            return Err(PoolError::BufferReturned);
        }
        let inner = s.inner.take().ok_or(PoolError::BufferReturned)?;
        self.store.give(inner);
        Ok(())
    }

    /// Same as [`put`](Self::put) but panics if `s` was already returned.
    #[track_caller]
    pub fn must_put(&self, s: &mut PooledString) {
        must(self.put(s));
    }

    /// Number of idle strings waiting in the pool.
    pub fn idle(&self) -> usize {
        self.store.idle()
    }

    /// Counters for this factory and all its clones.
    pub fn stats(&self) -> StatsSnapshot {
        self.store.stats().snapshot()
    }
}

impl Default for StringFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringFactory")
            .field("config", self.store.config())
            .field("idle", &self.store.idle())
            .finish()
    }
}

/// A string builder checked out of a [`StringFactory`].
#[derive(Debug)]
pub struct PooledString {
    inner: Option<String>,
    returned: ReturnLatch,
}

impl PooledString {
    #[inline]
    fn live(&self) -> Result<&String, PoolError> {
        self.inner.as_ref().ok_or(PoolError::BufferReturned)
    }

    #[inline]
    fn live_mut(&mut self) -> Result<&mut String, PoolError> {
        self.inner.as_mut().ok_or(PoolError::BufferReturned)
    }

    /// Returns `true` once the string has been put back.
    pub fn is_returned(&self) -> bool {
        self.inner.is_none()
    }

    /// The accumulated text; empty once returned.
    pub fn as_str(&self) -> &str {
        self.inner.as_deref().unwrap_or_default()
    }

    /// A copy of the accumulated text; panics once returned.
    #[track_caller]
    pub fn must_string(&self) -> String {
        must(self.live()).clone()
    }

    /// Length in bytes; 0 once returned.
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, String::len)
    }

    /// Same as [`len`](Self::len) but panics once returned.
    #[track_caller]
    pub fn must_len(&self) -> usize {
        must(self.live()).len()
    }

    /// Returns `true` when no text has been written (always, once returned).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity in bytes; 0 once returned.
    pub fn cap(&self) -> usize {
        self.inner.as_ref().map_or(0, String::capacity)
    }

    /// Same as [`cap`](Self::cap) but panics once returned.
    #[track_caller]
    pub fn must_cap(&self) -> usize {
        must(self.live()).capacity()
    }

    /// Appends `p`, which must be valid UTF-8.
    pub fn write(&mut self, p: &[u8]) -> Result<usize, PoolError> {
        let inner = self.live_mut()?;
        let text = core::str::from_utf8(p).map_err(|_| PoolError::InvalidUtf8)?;
        inner.push_str(text);
        Ok(p.len())
    }

    /// Same as [`write`](Self::write) but panics on any error.
    #[track_caller]
    pub fn must_write(&mut self, p: &[u8]) {
        must(self.write(p));
    }

    /// Appends `s`.
    pub fn write_str(&mut self, s: &str) -> Result<usize, PoolError> {
        self.live_mut()?.push_str(s);
        Ok(s.len())
    }

    /// Same as [`write_str`](Self::write_str) but panics once returned.
    #[track_caller]
    pub fn must_write_str(&mut self, s: &str) {
        must(self.write_str(s));
    }

    /// Appends `c`, returning its UTF-8 width.
    pub fn write_char(&mut self, c: char) -> Result<usize, PoolError> {
        self.live_mut()?.push(c);
        Ok(c.len_utf8())
    }

    /// Same as [`write_char`](Self::write_char) but panics once returned.
    #[track_caller]
    pub fn must_write_char(&mut self, c: char) {
        must(self.write_char(c));
    }

    /// Appends one ASCII byte; other bytes are not valid UTF-8 on their own.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), PoolError> {
        let inner = self.live_mut()?;
        if !byte.is_ascii() {
            return Err(PoolError::InvalidUtf8);
        }
        inner.push(char::from(byte));
        Ok(())
    }

    /// Same as [`write_byte`](Self::write_byte) but panics on any error.
    #[track_caller]
    pub fn must_write_byte(&mut self, byte: u8) {
        must(self.write_byte(byte));
    }

    /// Guarantees room for `n` more bytes.
    pub fn grow(&mut self, n: usize) -> Result<(), PoolError> {
        self.live_mut()?.reserve(n);
        Ok(())
    }

    /// Same as [`grow`](Self::grow) but panics once returned.
    #[track_caller]
    pub fn must_grow(&mut self, n: usize) {
        must(self.grow(n));
    }

    /// Empties the string, keeping its storage.
    pub fn reset(&mut self) -> Result<(), PoolError> {
        self.live_mut()?.clear();
        Ok(())
    }

    /// Same as [`reset`](Self::reset) but panics once returned.
    #[track_caller]
    pub fn must_reset(&mut self) {
        must(self.reset());
    }
}

impl fmt::Display for PooledString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Write for PooledString {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        PooledString::write_str(self, s).map(drop).map_err(|_| fmt::Error)
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        PooledString::write_char(self, c).map(drop).map_err(|_| fmt::Error)
    }
}
