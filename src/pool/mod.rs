//! Pools of reusable buffers that can be returned at most once.
//!
//! - [`BufferFactory`] / [`Buffer`]: growable byte buffers.
//! - [`SharedBuffer`]: a checked-out buffer guarded by a mutex, for use from
//!   several threads at once.
//! - [`StringFactory`] / [`PooledString`]: string builders.
//!
//! Each checked-out object carries a [`ReturnLatch`]. The first return
//! consumes it and moves the storage back into the pool; every later return
//! fails with [`PoolError::BufferReturned`](crate::PoolError::BufferReturned)
//! and every later operation sees an empty object.

pub mod buffer;
pub mod byte_buf;
pub mod latch;
pub mod shared;
pub mod store;
pub mod string;

pub use buffer::{Buffer, BufferFactory};
pub use byte_buf::ByteBuf;
pub use latch::ReturnLatch;
pub use shared::SharedBuffer;
pub use store::{PoolConfig, PoolStats, Recyclable, StatsSnapshot, Store};
pub use string::{PooledString, StringFactory};

use crate::error::{must, PoolError};

/// Acquire/release pair shared by every factory.
///
/// Lets code be written once against "something that hands out objects and
/// takes them back exactly once".
pub trait Recycler {
    /// The checked-out object.
    type Item;

    /// Hands out an empty object.
    fn get(&self) -> Self::Item;

    /// Returns `item`; fails if it was already returned.
    fn put(&self, item: &mut Self::Item) -> Result<(), PoolError>;

    /// Same as [`put`](Self::put) but panics with the error as payload.
    #[track_caller]
    fn must_put(&self, item: &mut Self::Item) {
        must(self.put(item));
    }
}

impl Recycler for BufferFactory {
    type Item = Buffer;

    fn get(&self) -> Buffer {
        BufferFactory::get(self)
    }

    fn put(&self, item: &mut Buffer) -> Result<(), PoolError> {
        BufferFactory::put(self, item)
    }
}

impl Recycler for StringFactory {
    type Item = PooledString;

    fn get(&self) -> PooledString {
        StringFactory::get(self)
    }

    fn put(&self, item: &mut PooledString) -> Result<(), PoolError> {
        StringFactory::put(self, item)
    }
}
