//! Ready table - one circular list per priority plus the priority bitmap
//!
//! Tasks are added to the tail of their priority's list and scheduled from
//! the head. The bitmap bit of a priority is set exactly while its list is
//! non-empty.

use crate::config::CFG_PRIO_MAX;
use crate::list::{LinkStore, OsList};
use crate::prio::PrioTable;
use crate::types::{OsPrio, TaskId};

pub struct ReadyTable {
    lists: [OsList; CFG_PRIO_MAX],
    prio_tbl: PrioTable,
}

impl ReadyTable {
    pub const fn new() -> Self {
        ReadyTable {
            lists: [const { OsList::new() }; CFG_PRIO_MAX],
            prio_tbl: PrioTable::new(),
        }
    }

    /// Initialize/reset every list and the bitmap
    pub fn init(&mut self) {
        for list in self.lists.iter_mut() {
            list.init();
        }
        self.prio_tbl.init();
    }

    #[inline]
    pub fn list(&self, prio: OsPrio) -> &OsList {
        &self.lists[prio as usize]
    }

    #[inline]
    pub fn prio_table(&self) -> &PrioTable {
        &self.prio_tbl
    }

    /// Highest priority with a ready task (0 when none)
    #[inline]
    pub fn highest(&self) -> OsPrio {
        self.prio_tbl.get_highest()
    }

    /// Append a task to the tail of its priority list
    pub fn insert<S: LinkStore + ?Sized>(&mut self, store: &mut S, id: TaskId, prio: OsPrio) {
        self.lists[prio as usize].insert_end(store, id);
        self.prio_tbl.insert(prio);
    }

    /// Remove a task, clearing the bitmap bit if its list empties
    pub fn remove<S: LinkStore + ?Sized>(&mut self, store: &mut S, id: TaskId, prio: OsPrio) {
        let list = &mut self.lists[prio as usize];
        list.remove(store, id);
        if list.is_empty() {
            self.prio_tbl.remove(prio);
        }
    }

    /// Pop the head of the highest occupied list and re-append it at the tail
    ///
    /// This single rotation is what gives equal-priority peers round robin.
    /// The bitmap is untouched since the list ends up with the same members.
    pub fn rotate_highest<S: LinkStore + ?Sized>(&mut self, store: &mut S) -> Option<TaskId> {
        let list = &mut self.lists[self.prio_tbl.get_highest() as usize];
        let id = list.pop_head(store)?;
        list.insert_end(store, id);
        Some(id)
    }
}

impl Default for ReadyTable {
    fn default() -> Self {
        Self::new()
    }
}
