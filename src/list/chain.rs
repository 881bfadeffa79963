//! `Chain` - a doubly linked list stored in a generational slot arena.
//!
//! Nodes live in a `Vec` of slots and link to each other by index. Freed
//! slots go on a free list and are reused; each slot carries a generation
//! that is bumped on free, so a [`NodeRef`] taken before a removal never
//! resolves to whatever later reuses its slot.

use core::fmt;

/// Index plus generation of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeRef {
    index: usize,
    generation: u32,
}

enum Link<T> {
    Occupied {
        value: T,
        prev: Option<usize>,
        next: Option<usize>,
    },
    /// Next free slot.
    Free(Option<usize>),
}

struct Slot<T> {
    generation: u32,
    link: Link<T>,
}

pub(crate) struct Chain<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> Chain<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            free_head: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if `node` still names a live node.
    #[inline]
    pub(crate) fn is_live(&self, node: NodeRef) -> bool {
        matches!(
            self.slots.get(node.index),
            Some(Slot { generation, link: Link::Occupied { .. } }) if *generation == node.generation
        )
    }

    #[inline]
    fn node_ref(&self, index: usize) -> NodeRef {
        NodeRef {
            index,
            generation: self.slots[index].generation,
        }
    }

    pub(crate) fn get(&self, node: NodeRef) -> Option<&T> {
        match self.slots.get(node.index)? {
            Slot {
                generation,
                link: Link::Occupied { value, .. },
            } if *generation == node.generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn front(&self) -> Option<NodeRef> {
        self.head.map(|i| self.node_ref(i))
    }

    pub(crate) fn back(&self) -> Option<NodeRef> {
        self.tail.map(|i| self.node_ref(i))
    }

    pub(crate) fn front_value(&self) -> Option<&T> {
        self.front().and_then(|n| self.get(n))
    }

    pub(crate) fn back_value(&self) -> Option<&T> {
        self.back().and_then(|n| self.get(n))
    }

    pub(crate) fn next_of(&self, node: NodeRef) -> Option<NodeRef> {
        if !self.is_live(node) {
            return None;
        }
        self.links(node.index).1.map(|i| self.node_ref(i))
    }

    pub(crate) fn prev_of(&self, node: NodeRef) -> Option<NodeRef> {
        if !self.is_live(node) {
            return None;
        }
        self.links(node.index).0.map(|i| self.node_ref(i))
    }

    fn links(&self, index: usize) -> (Option<usize>, Option<usize>) {
        match &self.slots[index].link {
            Link::Occupied { prev, next, .. } => (*prev, *next),
            Link::Free(_) => panic!("Corrupted chain: link to free slot"),
        }
    }

    fn set_links(&mut self, index: usize, new_prev: Option<usize>, new_next: Option<usize>) {
        if let Link::Occupied { prev, next, .. } = &mut self.slots[index].link {
            *prev = new_prev;
            *next = new_next;
        }
    }

    fn set_prev(&mut self, index: usize, new_prev: Option<usize>) {
        if let Link::Occupied { prev, .. } = &mut self.slots[index].link {
            *prev = new_prev;
        }
    }

    fn set_next(&mut self, index: usize, new_next: Option<usize>) {
        if let Link::Occupied { next, .. } = &mut self.slots[index].link {
            *next = new_next;
        }
    }

    fn alloc(&mut self, value: T) -> usize {
        let link = Link::Occupied {
            value,
            prev: None,
            next: None,
        };
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index];
            self.free_head = match slot.link {
                Link::Free(next) => next,
                Link::Occupied { .. } => panic!("Corrupted free list"),
            };
            slot.link = link;
            index
        } else {
            self.slots.push(Slot { generation: 0, link });
            self.slots.len() - 1
        }
    }

    /// Detaches `index` from its neighbours, leaving it unlinked but occupied.
    fn unlink(&mut self, index: usize) {
        let (prev, next) = self.links(index);
        match prev {
            Some(p) => self.set_next(p, next),
            None => self.head = next,
        }
        match next {
            Some(n) => self.set_prev(n, prev),
            None => self.tail = prev,
        }
        self.set_links(index, None, None);
    }

    /// Links an unlinked `index` between `prev` and `next`.
    fn link_between(&mut self, index: usize, prev: Option<usize>, next: Option<usize>) {
        self.set_links(index, prev, next);
        match prev {
            Some(p) => self.set_next(p, Some(index)),
            None => self.head = Some(index),
        }
        match next {
            Some(n) => self.set_prev(n, Some(index)),
            None => self.tail = Some(index),
        }
    }

    pub(crate) fn push_front(&mut self, value: T) -> NodeRef {
        let index = self.alloc(value);
        self.link_between(index, None, self.head);
        self.len += 1;
        self.node_ref(index)
    }

    pub(crate) fn push_back(&mut self, value: T) -> NodeRef {
        let index = self.alloc(value);
        self.link_between(index, self.tail, None);
        self.len += 1;
        self.node_ref(index)
    }

    /// Inserts after `mark`, which must be live.
    pub(crate) fn insert_after(&mut self, value: T, mark: NodeRef) -> NodeRef {
        debug_assert!(self.is_live(mark));
        let next = self.links(mark.index).1;
        let index = self.alloc(value);
        self.link_between(index, Some(mark.index), next);
        self.len += 1;
        self.node_ref(index)
    }

    /// Inserts before `mark`, which must be live.
    pub(crate) fn insert_before(&mut self, value: T, mark: NodeRef) -> NodeRef {
        debug_assert!(self.is_live(mark));
        let prev = self.links(mark.index).0;
        let index = self.alloc(value);
        self.link_between(index, prev, Some(mark.index));
        self.len += 1;
        self.node_ref(index)
    }

    /// Removes `node` and returns its value, or `None` if it is stale.
    pub(crate) fn remove(&mut self, node: NodeRef) -> Option<T> {
        if !self.is_live(node) {
            return None;
        }
        self.unlink(node.index);
        let slot = &mut self.slots[node.index];
        slot.generation = slot.generation.wrapping_add(1);
        let link = core::mem::replace(&mut slot.link, Link::Free(self.free_head));
        self.free_head = Some(node.index);
        self.len -= 1;
        match link {
            Link::Occupied { value, .. } => Some(value),
            Link::Free(_) => None,
        }
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        let head = self.front()?;
        self.remove(head)
    }

    pub(crate) fn move_to_front(&mut self, node: NodeRef) {
        if self.head == Some(node.index) {
            return;
        }
        self.unlink(node.index);
        self.link_between(node.index, None, self.head);
    }

    pub(crate) fn move_to_back(&mut self, node: NodeRef) {
        if self.tail == Some(node.index) {
            return;
        }
        self.unlink(node.index);
        self.link_between(node.index, self.tail, None);
    }

    pub(crate) fn move_after(&mut self, node: NodeRef, mark: NodeRef) {
        if node.index == mark.index {
            return;
        }
        self.unlink(node.index);
        let next = self.links(mark.index).1;
        self.link_between(node.index, Some(mark.index), next);
    }

    pub(crate) fn move_before(&mut self, node: NodeRef, mark: NodeRef) {
        if node.index == mark.index {
            return;
        }
        self.unlink(node.index);
        let prev = self.links(mark.index).0;
        self.link_between(node.index, prev, Some(mark.index));
    }

    /// Removes every node. Outstanding `NodeRef`s all go stale.
    pub(crate) fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            chain: self,
            current: self.head,
            remaining: self.len,
        }
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Front-to-back iterator over chain values.
pub struct Iter<'a, T> {
    chain: &'a Chain<T>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        match &self.chain.slots[index].link {
            Link::Occupied { value, next, .. } => {
                self.current = *next;
                self.remaining -= 1;
                Some(value)
            }
            Link::Free(_) => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
