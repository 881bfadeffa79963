//! `Element` - a handle to one node of a [`LockingList`].

use super::chain::NodeRef;
use super::LockingList;
use core::fmt;

/// A handle to a node, tagged with the list that owns it.
///
/// Handles are cheap to clone. Once the node is removed, through this handle
/// or any clone of it, every handle to it is detached: reads return `None`
/// and mutations through any list fail with
/// [`ListError::ElementNotInList`](crate::ListError::ElementNotInList).
pub struct Element<'a, T> {
    pub(crate) list: Option<&'a LockingList<T>>,
    pub(crate) node: Option<NodeRef>,
}

impl<'a, T> Element<'a, T> {
    pub(crate) fn new(list: &'a LockingList<T>, node: NodeRef) -> Self {
        Self {
            list: Some(list),
            node: Some(node),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.list = None;
        self.node = None;
    }

    /// Returns `true` if this handle still belongs to `list`.
    ///
    /// Checks both the back-reference and that the node has not been
    /// removed since the handle was made.
    pub fn belongs_to(&self, list: &LockingList<T>) -> bool {
        match (self.list, self.node) {
            (Some(owner), Some(node)) => {
                core::ptr::eq(owner, list)
                    && list.read_lock().is_ok_and(|chain| chain.chain().is_live(node))
            }
            _ => false,
        }
    }

    /// Returns `true` once the node has been removed.
    pub fn is_detached(&self) -> bool {
        match (self.list, self.node) {
            (Some(owner), Some(node)) => !owner
                .read_lock()
                .is_ok_and(|chain| chain.chain().is_live(node)),
            _ => true,
        }
    }

    /// Runs `f` on the value under the list's read lock.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.list?.read_lock().ok()?;
        guard.chain().get(self.node?).map(f)
    }

    /// The element after this one, or `None` at the back or once detached.
    pub fn next(&self) -> Option<Element<'a, T>> {
        let list = self.list?;
        let next = list.read_lock().ok()?.chain().next_of(self.node?)?;
        Some(Element::new(list, next))
    }

    /// The element before this one, or `None` at the front or once detached.
    pub fn prev(&self) -> Option<Element<'a, T>> {
        let list = self.list?;
        let prev = list.read_lock().ok()?.chain().prev_of(self.node?)?;
        Some(Element::new(list, prev))
    }
}

impl<T: Clone> Element<'_, T> {
    /// A copy of the value, or `None` once detached.
    pub fn value(&self) -> Option<T> {
        self.with_value(T::clone)
    }
}

impl<T> Clone for Element<'_, T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            node: self.node,
        }
    }
}

impl<T> fmt::Debug for Element<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("list", &self.list.map(|l| l as *const LockingList<T>))
            .field("node", &self.node)
            .finish()
    }
}
