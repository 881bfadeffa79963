//! Error types shared by the pool and list modules.
//!
//! Every fallible operation has a plain form returning one of these values
//! and, for buffers and strings, a `must_*` form that panics with the same
//! value as the panic payload. Recover it with
//! `payload.downcast::<PoolError>()` after `std::panic::catch_unwind`.

use core::fmt;
use std::io;

/// Errors reported by pooled buffers and strings.
#[derive(Debug)]
pub enum PoolError {
    /// The object was already returned to its pool (put or closed).
    BufferReturned,
    /// `close` was called on a buffer that does not know its parent factory.
    NoParent,
    /// `truncate` asked to keep more bytes than are unread.
    TruncateOutOfRange {
        /// Unread bytes at the time of the call.
        len: usize,
        /// Bytes the caller asked to keep.
        requested: usize,
    },
    /// `unread_byte`/`unread_char` without a preceding successful read.
    InvalidUnread,
    /// Bytes written to a pooled string were not valid UTF-8.
    InvalidUtf8,
    /// The reader or writer handed to `read_from`/`write_to` failed.
    Io(io::Error),
}

impl PoolError {
    /// Returns `true` for [`PoolError::BufferReturned`].
    pub fn is_returned(&self) -> bool {
        matches!(self, Self::BufferReturned)
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferReturned => f.write_str("buffer already returned"),
            Self::NoParent => f.write_str(
                "buffer does not know its parent pool and cannot return itself, use Buffer::with_parent",
            ),
            Self::TruncateOutOfRange { len, requested } => {
                write!(f, "truncation out of range: keep {requested} of {len} unread bytes")
            }
            Self::InvalidUnread => f.write_str("previous operation was not a successful read"),
            Self::InvalidUtf8 => f.write_str("written bytes are not valid UTF-8"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PoolError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<PoolError> for io::Error {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Io(inner) => inner,
            PoolError::InvalidUtf8 => io::Error::new(io::ErrorKind::InvalidData, PoolError::InvalidUtf8),
            other => io::Error::other(other),
        }
    }
}

/// Errors reported by [`LockingList`](crate::list::LockingList).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListError {
    /// The element does not belong to the list it was handed to.
    ElementNotInList,
    /// The insertion or move mark does not belong to the list.
    MarkNotInList,
    /// The list has never been initialized.
    Uninitialized,
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ElementNotInList => "element not in list",
            Self::MarkNotInList => "mark not in list",
            Self::Uninitialized => "uninitialized list",
        })
    }
}

impl std::error::Error for ListError {}

/// Unwraps `result`, panicking with the error itself as payload.
#[inline]
#[track_caller]
pub(crate) fn must<T>(result: Result<T, PoolError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => std::panic::panic_any(err),
    }
}
