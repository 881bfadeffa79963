//! `LockingList` - a doubly linked list behind one reader-writer lock.
//!
//! Every node handed out as an [`Element`] remembers the list it came from.
//! Operations that take an element or a mark check that back-reference
//! against the receiving list and report [`ListError::ElementNotInList`] or
//! [`ListError::MarkNotInList`] instead of touching either list. Removed nodes
//! bump a generation counter, so stale clones of a removed element are
//! rejected even after their slot is reused.
//!
//! The zero value ([`LockingList::default`]) has no backing storage. Mutating
//! calls initialize it on demand; explicit [`lock`](LockingList::lock) and
//! [`read_lock`](LockingList::read_lock) report
//! [`ListError::Uninitialized`] instead.
//!
//! ```
//! use latchpool::list::LockingList;
//!
//! let list = LockingList::new();
//! list.push(1);
//! let two = list.push_back(2);
//! list.insert_before(0, &two).unwrap();
//!
//! assert_eq!(list.values(), vec![0, 1, 2]);
//! assert_eq!(list.pop(), Some(0));
//! ```

mod chain;
mod element;
mod shallow;

pub use chain::Iter;
pub use element::Element;
pub use shallow::ShallowEq;

use crate::error::ListError;
use chain::{Chain, NodeRef};
use core::fmt;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

/// A thread-safe doubly linked list.
pub struct LockingList<T> {
    chain: RwLock<Option<Chain<T>>>,
}

/// Shared access to an initialized list. Dropping it releases the read lock.
pub struct ListReadGuard<'a, T> {
    chain: MappedRwLockReadGuard<'a, Chain<T>>,
}

/// Exclusive access to an initialized list. Dropping it releases the lock.
pub struct ListWriteGuard<'a, T> {
    chain: MappedRwLockWriteGuard<'a, Chain<T>>,
}

impl<T> ListReadGuard<'_, T> {
    pub(crate) fn chain(&self) -> &Chain<T> {
        &self.chain
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.chain.len() == 0
    }

    /// Front-to-back iterator over the values.
    pub fn iter(&self) -> Iter<'_, T> {
        self.chain.iter()
    }

    /// The first value.
    pub fn front(&self) -> Option<&T> {
        self.chain.front_value()
    }

    /// The last value.
    pub fn back(&self) -> Option<&T> {
        self.chain.back_value()
    }
}

impl<T> ListWriteGuard<'_, T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.chain.len() == 0
    }

    /// Front-to-back iterator over the values.
    pub fn iter(&self) -> Iter<'_, T> {
        self.chain.iter()
    }

    /// The first value.
    pub fn front(&self) -> Option<&T> {
        self.chain.front_value()
    }

    /// The last value.
    pub fn back(&self) -> Option<&T> {
        self.chain.back_value()
    }

    /// Appends `value`.
    pub fn push_back(&mut self, value: T) {
        self.chain.push_back(value);
    }

    /// Prepends `value`.
    pub fn push_front(&mut self, value: T) {
        self.chain.push_front(value);
    }

    /// Removes and returns the front value.
    pub fn pop(&mut self) -> Option<T> {
        self.chain.pop_front()
    }

    /// Removes every value. Outstanding elements become detached.
    pub fn clear(&mut self) {
        self.chain.clear();
    }
}

impl<T> LockingList<T> {
    /// Creates an empty, initialized list.
    pub const fn new() -> Self {
        Self {
            chain: RwLock::new(Some(Chain::new())),
        }
    }

    /// Acquires the read lock.
    ///
    /// Fails with [`ListError::Uninitialized`] on a list that has never been
    /// initialized.
    pub fn read_lock(&self) -> Result<ListReadGuard<'_, T>, ListError> {
        RwLockReadGuard::try_map(self.chain.read(), Option::as_ref)
            .map(|chain| ListReadGuard { chain })
            .map_err(|_| ListError::Uninitialized)
    }

    /// Acquires the write lock.
    ///
    /// Fails with [`ListError::Uninitialized`] on a list that has never been
    /// initialized.
    pub fn lock(&self) -> Result<ListWriteGuard<'_, T>, ListError> {
        RwLockWriteGuard::try_map(self.chain.write(), Option::as_mut)
            .map(|chain| ListWriteGuard { chain })
            .map_err(|_| ListError::Uninitialized)
    }

    /// Write lock on the backing storage, creating it if absent.
    fn write_init(&self) -> MappedRwLockWriteGuard<'_, Chain<T>> {
        RwLockWriteGuard::map(self.chain.write(), |slot| {
            if slot.is_none() {
                debug_event!("initializing zero-value list");
            }
            slot.get_or_insert_with(Chain::new)
        })
    }

    fn check_element(&self, chain: &Chain<T>, element: &Element<'_, T>) -> Result<NodeRef, ListError> {
        match (element.list, element.node) {
            (Some(owner), Some(node)) if core::ptr::eq(owner, self) && chain.is_live(node) => Ok(node),
            _ => {
                debug_event!("rejected element that does not belong to this list");
                Err(ListError::ElementNotInList)
            }
        }
    }

    fn check_mark(&self, chain: &Chain<T>, mark: &Element<'_, T>) -> Result<NodeRef, ListError> {
        self.check_element(chain, mark)
            .map_err(|_| ListError::MarkNotInList)
    }

    /// Initializes the list, or clears it if it already holds elements.
    ///
    /// Every element handed out before the call becomes detached.
    pub fn init(&self) -> &Self {
        self.write_init().clear();
        self
    }

    /// Number of elements; 0 for an uninitialized list.
    pub fn len(&self) -> usize {
        self.chain.read().as_ref().map_or(0, Chain::len)
    }

    /// Returns `true` if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prepends `value` and returns its element.
    pub fn push_front(&self, value: T) -> Element<'_, T> {
        let node = self.write_init().push_front(value);
        Element::new(self, node)
    }

    /// Appends `value` and returns its element.
    pub fn push_back(&self, value: T) -> Element<'_, T> {
        let node = self.write_init().push_back(value);
        Element::new(self, node)
    }

    /// Appends `value`; the queue-style counterpart of [`pop`](Self::pop).
    pub fn push(&self, value: T) {
        self.write_init().push_back(value);
    }

    /// Removes and returns the front value, or `None` when empty.
    pub fn pop(&self) -> Option<T> {
        self.chain.write().as_mut()?.pop_front()
    }

    /// Removes `element` and returns its value.
    ///
    /// On success `element` is cleared so it can no longer reach any list.
    /// On failure neither this list nor the element's own list is touched.
    pub fn remove(&self, element: &mut Element<'_, T>) -> Result<T, ListError> {
        let mut guard = self.chain.write();
        let chain = guard.as_mut().ok_or(ListError::Uninitialized)?;
        let node = self.check_element(chain, element)?;
        let value = chain.remove(node).ok_or(ListError::ElementNotInList)?;
        element.clear();
        Ok(value)
    }

    /// Inserts `value` right before `mark`.
    pub fn insert_before(&self, value: T, mark: &Element<'_, T>) -> Result<Element<'_, T>, ListError> {
        let mut chain = self.write_init();
        let mark = self.check_mark(&chain, mark)?;
        let node = chain.insert_before(value, mark);
        Ok(Element::new(self, node))
    }

    /// Inserts `value` right after `mark`.
    pub fn insert_after(&self, value: T, mark: &Element<'_, T>) -> Result<Element<'_, T>, ListError> {
        let mut chain = self.write_init();
        let mark = self.check_mark(&chain, mark)?;
        let node = chain.insert_after(value, mark);
        Ok(Element::new(self, node))
    }

    /// Moves `element` to the front.
    pub fn move_to_front(&self, element: &Element<'_, T>) -> Result<(), ListError> {
        let mut chain = self.write_init();
        let node = self.check_element(&chain, element)?;
        chain.move_to_front(node);
        Ok(())
    }

    /// Moves `element` to the back.
    pub fn move_to_back(&self, element: &Element<'_, T>) -> Result<(), ListError> {
        let mut chain = self.write_init();
        let node = self.check_element(&chain, element)?;
        chain.move_to_back(node);
        Ok(())
    }

    /// Moves `element` right after `mark`. Moving an element after itself
    /// leaves the list unchanged.
    pub fn move_after(&self, element: &Element<'_, T>, mark: &Element<'_, T>) -> Result<(), ListError> {
        let mut chain = self.write_init();
        let node = self.check_element(&chain, element)?;
        let mark = self.check_mark(&chain, mark)?;
        chain.move_after(node, mark);
        Ok(())
    }

    /// Moves `element` right before `mark`. Moving an element before itself
    /// leaves the list unchanged.
    pub fn move_before(&self, element: &Element<'_, T>, mark: &Element<'_, T>) -> Result<(), ListError> {
        let mut chain = self.write_init();
        let node = self.check_element(&chain, element)?;
        let mark = self.check_mark(&chain, mark)?;
        chain.move_before(node, mark);
        Ok(())
    }

    /// The first element, or `None` when empty or uninitialized.
    pub fn front(&self) -> Option<Element<'_, T>> {
        let node = self.chain.read().as_ref()?.front()?;
        Some(Element::new(self, node))
    }

    /// The last element, or `None` when empty or uninitialized.
    pub fn back(&self) -> Option<Element<'_, T>> {
        let node = self.chain.read().as_ref()?.back()?;
        Some(Element::new(self, node))
    }

    /// Moves the front element to the back and returns it.
    pub fn rotate(&self) -> Option<Element<'_, T>> {
        let mut chain = self.write_init();
        let node = chain.front()?;
        chain.move_to_back(node);
        Some(Element::new(self, node))
    }

    /// Returns `true` if any value is [shallow-equal](ShallowEq) to `value`.
    ///
    /// Holds the read lock for the whole front-to-back scan.
    pub fn contains(&self, value: &T) -> bool
    where
        T: ShallowEq,
    {
        self.chain
            .read()
            .as_ref()
            .is_some_and(|chain| chain.iter().any(|v| v.shallow_eq(value)))
    }

    /// Returns `true` if any value is structurally equal to `value`.
    ///
    /// Holds the read lock for the whole front-to-back scan.
    pub fn contains_deep(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.chain
            .read()
            .as_ref()
            .is_some_and(|chain| chain.iter().any(|v| v == value))
    }
}

impl<T: Clone> LockingList<T> {
    /// A front-to-back copy of the values.
    pub fn values(&self) -> Vec<T> {
        self.chain
            .read()
            .as_ref()
            .map(|chain| chain.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends a copy of `other`'s values. `other` may be this list, in
    /// which case its contents are doubled.
    pub fn push_back_list(&self, other: &LockingList<T>) {
        let values = other.values();
        let mut chain = self.write_init();
        for value in values {
            chain.push_back(value);
        }
    }

    /// Prepends a copy of `other`'s values, keeping their order. `other` may
    /// be this list, in which case its contents are doubled.
    pub fn push_front_list(&self, other: &LockingList<T>) {
        let values = other.values();
        let mut chain = self.write_init();
        for value in values.into_iter().rev() {
            chain.push_front(value);
        }
    }
}

impl<T> Default for LockingList<T> {
    /// The zero value: no backing storage until first mutated.
    fn default() -> Self {
        Self {
            chain: RwLock::new(None),
        }
    }
}

impl<T> FromIterator<T> for LockingList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Chain::new();
        for value in iter {
            chain.push_back(value);
        }
        Self {
            chain: RwLock::new(Some(chain)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LockingList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chain.try_read() {
            Some(guard) => match guard.as_ref() {
                Some(chain) => f.debug_tuple("LockingList").field(chain).finish(),
                None => f.write_str("LockingList(<uninitialized>)"),
            },
            None => f.write_str("LockingList(<locked>)"),
        }
    }
}
