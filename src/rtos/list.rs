//! Intrusive circular doubly-linked list
//!
//! Nodes are not pointers but stable indices into a task table. The table
//! stores one [`Link`] per task and hands it out through [`LinkStore`], so the
//! same container serves the ready lists, the delayed list and every wait list.
//! A task's index is its own owner back-reference.

use crate::types::TaskId;

/// Link embedded in every TCB
///
/// `next`/`prev` are only meaningful while the owning task is on a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub next: TaskId,
    pub prev: TaskId,
}

impl Link {
    pub const fn new(owner: TaskId) -> Self {
        Link {
            next: owner,
            prev: owner,
        }
    }
}

/// Storage that owns the links addressed by a list
pub trait LinkStore {
    fn link(&self, id: TaskId) -> &Link;
    fn link_mut(&mut self, id: TaskId) -> &mut Link;
}

impl LinkStore for [Link] {
    #[inline(always)]
    fn link(&self, id: TaskId) -> &Link {
        &self[id.index()]
    }

    #[inline(always)]
    fn link_mut(&mut self, id: TaskId) -> &mut Link {
        &mut self[id.index()]
    }
}

/// Circular list head
#[derive(Debug, Clone, Copy)]
pub struct OsList {
    head: Option<TaskId>,
    count: usize,
}

impl OsList {
    /// Create a new empty list
    pub const fn new() -> Self {
        OsList {
            head: None,
            count: 0,
        }
    }

    /// Initialize/reset the list
    pub fn init(&mut self) {
        self.head = None;
        self.count = 0;
    }

    #[inline]
    pub fn head(&self) -> Option<TaskId> {
        self.head
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append at the tail
    ///
    /// The node must not be on any list.
    pub fn insert_end<S: LinkStore + ?Sized>(&mut self, store: &mut S, id: TaskId) {
        match self.head {
            None => {
                *store.link_mut(id) = Link::new(id);
                self.head = Some(id);
            }
            Some(first) => {
                let last = store.link(first).prev;

                *store.link_mut(id) = Link {
                    next: first,
                    prev: last,
                };
                store.link_mut(first).prev = id;
                store.link_mut(last).next = id;
            }
        }
        self.count += 1;
    }

    /// Unlink a node in O(1)
    ///
    /// Removing from an empty list is ignored. Removing a node that is not on
    /// this list corrupts it; callers track membership.
    pub fn remove<S: LinkStore + ?Sized>(&mut self, store: &mut S, id: TaskId) {
        if self.head.is_none() || self.count == 0 {
            return;
        }

        let Link { next, prev } = *store.link(id);
        if next == id {
            self.head = None;
        } else {
            store.link_mut(prev).next = next;
            store.link_mut(next).prev = prev;

            if self.head == Some(id) {
                self.head = Some(next);
            }
        }
        *store.link_mut(id) = Link::new(id);
        self.count -= 1;
    }

    /// Unlink and return the head
    pub fn pop_head<S: LinkStore + ?Sized>(&mut self, store: &mut S) -> Option<TaskId> {
        let head = self.head?;
        self.remove(store, head);
        Some(head)
    }

    /// Walk once around the list, starting at the head
    pub fn iter<'a, S: LinkStore + ?Sized>(&self, store: &'a S) -> Iter<'a, S> {
        Iter {
            store,
            cursor: self.head,
            remaining: self.count,
        }
    }
}

impl Default for OsList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over list members
pub struct Iter<'a, S: LinkStore + ?Sized> {
    store: &'a S,
    cursor: Option<TaskId>,
    remaining: usize,
}

impl<S: LinkStore + ?Sized> Iterator for Iter<'_, S> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        self.remaining -= 1;
        self.cursor = Some(self.store.link(id).next);
        Some(id)
    }
}
