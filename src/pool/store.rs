//! The shared backing store behind every factory.
//!
//! A [`Store`] is an unbounded, lock-free queue of idle storage objects plus
//! the configuration and counters that govern it. Factories hand out storage
//! with [`Store::take`] and receive it back, already cleared, through
//! [`Store::give`]. Nothing in the queue ever carries content from a previous
//! checkout.

use core::sync::atomic::{AtomicU64, Ordering};
use crossbeam_queue::SegQueue;
use crossbeam_utils::CachePadded;
use serde::{Deserialize, Serialize};

/// Storage that can be recycled through a [`Store`].
pub trait Recyclable: Send {
    /// Allocates empty storage able to hold `capacity` bytes.
    fn with_capacity(capacity: usize) -> Self;
    /// Empties the storage, keeping its allocation.
    fn clear(&mut self);
    /// Bytes the storage can hold without reallocating.
    fn capacity(&self) -> usize;
}

impl Recyclable for Vec<u8> {
    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    #[inline]
    fn clear(&mut self) {
        Vec::clear(self);
    }

    #[inline]
    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}

impl Recyclable for String {
    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        String::with_capacity(capacity)
    }

    #[inline]
    fn clear(&mut self) {
        String::clear(self);
    }

    #[inline]
    fn capacity(&self) -> usize {
        String::capacity(self)
    }
}

/// Tuning knobs for a factory's store.
///
/// The default keeps everything that is returned and allocates fresh storage
/// with no reserved capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity reserved by freshly allocated storage.
    pub initial_capacity: usize,
    /// Storage that grew beyond this many bytes is dropped instead of pooled.
    pub max_retained_capacity: Option<usize>,
    /// Upper bound on idle storage kept in the pool.
    pub max_idle: Option<usize>,
}

impl PoolConfig {
    /// A configuration whose fresh storage reserves `capacity` bytes.
    pub const fn sized(capacity: usize) -> Self {
        Self {
            initial_capacity: capacity,
            max_retained_capacity: None,
            max_idle: None,
        }
    }
}

/// Live counters for a store.
///
/// Each counter sits on its own cache line; hot `get`/`put` paths on
/// different threads touch different counters.
#[derive(Default)]
pub struct PoolStats {
    acquired: CachePadded<AtomicU64>,
    fresh: CachePadded<AtomicU64>,
    returned: CachePadded<AtomicU64>,
    rejected: CachePadded<AtomicU64>,
    discarded: CachePadded<AtomicU64>,
}

impl PoolStats {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        Self::bump(&self.rejected);
    }

    /// Takes a point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        let acquired = self.acquired.load(Ordering::Relaxed);
        let fresh = self.fresh.load(Ordering::Relaxed);
        StatsSnapshot {
            acquired,
            fresh,
            recycled: acquired.saturating_sub(fresh),
            returned: self.returned.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// A copy of [`PoolStats`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Objects handed out by `get`.
    pub acquired: u64,
    /// `get` calls that had to allocate.
    pub fresh: u64,
    /// `get` calls served from idle storage.
    pub recycled: u64,
    /// Successful returns (put or close).
    pub returned: u64,
    /// Returns refused because the object was already returned.
    pub rejected: u64,
    /// Returned storage dropped by the retention limits.
    pub discarded: u64,
}

/// Idle storage shared by all clones of a factory.
pub struct Store<T> {
    idle: SegQueue<T>,
    config: PoolConfig,
    stats: PoolStats,
}

impl<T: Recyclable> Store<T> {
    /// Creates an empty store.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            idle: SegQueue::new(),
            config,
            stats: PoolStats::default(),
        }
    }

    /// Hands out idle storage, or allocates when none is idle.
    pub fn take(&self) -> T {
        PoolStats::bump(&self.stats.acquired);
        if let Some(item) = self.idle.pop() {
            return item;
        }
        PoolStats::bump(&self.stats.fresh);
        trace_event!(capacity = self.config.initial_capacity, "allocating fresh pool storage");
        T::with_capacity(self.config.initial_capacity)
    }

    /// Clears `item` and keeps it for a later [`take`](Self::take), unless a
    /// retention limit says to drop it.
    pub fn give(&self, mut item: T) {
        item.clear();
        PoolStats::bump(&self.stats.returned);

        let oversized = self
            .config
            .max_retained_capacity
            .is_some_and(|max| item.capacity() > max);
        let full = self.config.max_idle.is_some_and(|max| self.idle.len() >= max);
        if oversized || full {
            PoolStats::bump(&self.stats.discarded);
            trace_event!(capacity = item.capacity(), oversized, full, "discarding returned storage");
            return;
        }
        self.idle.push(item);
    }

    /// Number of idle storage objects waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Live counters.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}
