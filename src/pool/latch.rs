//! `ReturnLatch` - a one-shot consumable flag.
//!
//! The first [`consume`](ReturnLatch::consume) wins and returns `true`; every
//! later call, from any thread, observes the latch as spent and returns
//! `false`. There is no way to re-arm a latch.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

/// A single-use latch backed by an atomic compare-exchange.
#[repr(transparent)]
pub struct ReturnLatch {
    spent: AtomicBool,
}

impl ReturnLatch {
    /// Creates an armed latch.
    #[inline]
    pub const fn new() -> Self {
        Self {
            spent: AtomicBool::new(false),
        }
    }

    /// Creates a latch that is already spent.
    #[inline]
    pub(crate) const fn spent() -> Self {
        Self {
            spent: AtomicBool::new(true),
        }
    }

    /// Consumes the latch. Returns `true` only for the first caller.
    #[inline]
    pub fn consume(&self) -> bool {
        self.spent
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns `true` once the latch has been consumed.
    #[inline]
    pub fn is_spent(&self) -> bool {
        self.spent.load(Ordering::Acquire)
    }
}

impl Default for ReturnLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReturnLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReturnLatch")
            .field("spent", &self.is_spent())
            .finish()
    }
}
