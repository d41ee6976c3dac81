//! Scheduler module
//!
//! Priority-based preemptive scheduler with round-robin for same priority.
//! Kernel code never switches synchronously: it only requests a switch, and
//! the PendSV trap later runs [`Kernel::context_switch`].

mod rdy_list;

pub use rdy_list::ReadyTable;

use crate::kernel::Kernel;
use crate::types::{TaskId, TaskOwner};

impl Kernel {
    /// Pick the next task to run
    ///
    /// Selects the highest occupied priority, rotates that list's head to its
    /// tail and returns the rotated task. If the selected list is empty (no
    /// idle task was created) the current task is kept.
    pub fn sched_select(&mut self) -> Option<TaskId> {
        let next = match self.rdy.rotate_highest(&mut self.tasks) {
            Some(id) => Some(id),
            None => self.cur,
        };
        self.next = next;
        next
    }

    /// What the switch trap does: select, then make `next` current
    pub fn context_switch(&mut self) -> Option<TaskId> {
        self.switch_pending = false;
        let next = self.sched_select();
        self.cur = next;
        next
    }

    /// Link a detached task into its ready list
    pub(crate) fn make_ready(&mut self, id: TaskId) {
        debug_assert_eq!(self.tasks[id].owner, TaskOwner::Detached);
        let prio = self.tasks[id].prio;
        self.rdy.insert(&mut self.tasks, id, prio);
        self.tasks[id].owner = TaskOwner::Ready(prio);
    }

    /// Unlink a task from whatever list its owner tag names
    pub(crate) fn detach(&mut self, id: TaskId) {
        let owner = self.tasks[id].owner;
        match owner {
            TaskOwner::Ready(prio) => self.rdy.remove(&mut self.tasks, id, prio),
            TaskOwner::Delayed => self.delayed.remove(&mut self.tasks, id),
            #[cfg(feature = "sem")]
            TaskOwner::SemWait(sem) => {
                if let Some(s) = self.sems.get_mut(sem.index(), sem.generation()) {
                    s.wait_list.remove(&mut self.tasks, id);
                }
            }
            #[cfg(feature = "mbox")]
            TaskOwner::MboxWait(mbox) => {
                if let Some(m) = self.mboxes.get_mut(mbox.index(), mbox.generation()) {
                    m.wait_list.remove(&mut self.tasks, id);
                }
            }
            TaskOwner::Detached => {}
        }
        self.tasks[id].owner = TaskOwner::Detached;
    }
}
