//! # `latchpool` - Return-Once Buffer Pools and a Locking List
//!
//! Two small concurrency utilities built around the same idea: an object
//! knows who owns it, and misuse is reported instead of corrupting shared
//! state.
//!
//! ## Pools
//!
//! [`BufferFactory`] and [`StringFactory`] hand out reusable byte buffers and
//! string builders. Each checked-out object can be returned **at most once**:
//!
//! - the first `put` (or `close`) consumes a one-shot latch and moves the
//!   storage back into the pool, cleared;
//! - every later `put` fails with [`PoolError::BufferReturned`];
//! - every later read or write sees an empty object (plain methods) or
//!   panics with the error as payload (`must_*` methods).
//!
//! A single buffer that must be shared between threads is converted with
//! [`Buffer::with_mutex`] into a [`SharedBuffer`], whose `safe_*` methods
//! each take its lock.
//!
//! ## List
//!
//! [`LockingList`] is a doubly linked list behind one reader-writer lock.
//! Its [`Element`] handles carry a back-reference to their list, so
//! handing an element to the wrong list yields [`ListError::ElementNotInList`]
//! and leaves both lists untouched.
//!
//! ```
//! use latchpool::{BufferFactory, PoolError};
//!
//! let factory = BufferFactory::new();
//! let mut buf = factory.get();
//! buf.write_str("hello").unwrap();
//! assert_eq!(buf.bytes(), b"hello");
//!
//! factory.put(&mut buf).unwrap();
//! assert!(matches!(factory.put(&mut buf), Err(PoolError::BufferReturned)));
//! assert!(buf.bytes().is_empty());
//! ```
//!
//! ## Features
//!
//! - `tracing` (default): emit `debug`/`trace` events for rejected returns,
//!   pool growth, and lazy list initialization.

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod trace;

pub mod error;
pub mod list;
pub mod pool;

pub use error::{ListError, PoolError};
pub use list::{Element, LockingList, ShallowEq};
pub use pool::{
    Buffer, BufferFactory, PoolConfig, PooledString, Recycler, SharedBuffer, StatsSnapshot,
    StringFactory,
};

// Layout checks for the per-object bookkeeping.
const _: () = {
    use core::mem;

    // The return latch is a single atomic flag.
    assert!(mem::size_of::<pool::ReturnLatch>() == 1);

    // An element is a list pointer plus an (index, generation) pair.
    assert!(mem::size_of::<Element<'static, u64>>() <= mem::size_of::<usize>() * 4);
};
