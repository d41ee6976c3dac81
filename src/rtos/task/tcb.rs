//! Task Control Block (TCB) definition
//!
//! The TCB contains all the information needed to manage a task.

use core::ops::{Index, IndexMut};

use crate::config::CFG_TASK_MAX;
use crate::list::{Link, LinkStore};
use crate::types::{
    NotifyState, OsNotifyValue, OsPrio, OsStkElement, OsTaskState, OsTick, TaskId, TaskOwner,
};

/// Task entry point function type
pub type OsTaskFn = fn() -> !;

/// Direct-to-task notification slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub value: OsNotifyValue,
    pub state: NotifyState,
}

impl Notification {
    pub const fn new() -> Self {
        Notification {
            value: 0,
            state: NotifyState::None,
        }
    }
}

/// Task Control Block
#[repr(C)]
pub struct OsTcb {
    // ============ Stack pointer ============
    /// Saved stack pointer, read and written by the PendSV handler
    pub stk_ptr: *mut OsStkElement,

    // ============ Stack information ============
    /// First word of this task's region in the stack pool
    pub stk_base: usize,
    /// Stack size in words
    pub stk_size: usize,

    // ============ Task identification ============
    /// Task name
    pub name: &'static str,
    /// Task entry point
    pub entry: Option<OsTaskFn>,

    // ============ Priority ============
    /// Static priority, fixed at creation
    pub prio: OsPrio,

    // ============ List membership ============
    /// Status link
    pub link: Link,
    /// Which list `link` is on
    pub owner: TaskOwner,

    // ============ Delay ============
    /// Remaining ticks while on the delayed list
    pub dly_ticks: OsTick,

    // ============ Notification ============
    pub notify: Notification,
}

impl OsTcb {
    /// Create a new, uninitialized TCB
    pub const fn new() -> Self {
        OsTcb {
            stk_ptr: core::ptr::null_mut(),
            stk_base: 0,
            stk_size: 0,

            name: "",
            entry: None,

            prio: 0,

            link: Link::new(TaskId::from_index(0)),
            owner: TaskOwner::Detached,

            dly_ticks: 0,

            notify: Notification::new(),
        }
    }

    /// Initialize TCB to default values
    pub fn init(&mut self) {
        *self = Self::new();
    }

    /// Check if task is on its ready list
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.owner, TaskOwner::Ready(_))
    }

    /// Check if task is delayed
    #[inline]
    pub fn is_delayed(&self) -> bool {
        self.owner == TaskOwner::Delayed
    }

    /// Check if task is pending on a kernel object or a notification
    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.is_ready() && !self.is_delayed()
    }

    /// Derive the task state from list membership
    pub fn state(&self) -> OsTaskState {
        match self.owner {
            TaskOwner::Ready(_) => OsTaskState::Ready,
            TaskOwner::Delayed => OsTaskState::Delayed,
            #[cfg(feature = "sem")]
            TaskOwner::SemWait(_) => OsTaskState::SemWait,
            #[cfg(feature = "mbox")]
            TaskOwner::MboxWait(_) => OsTaskState::MboxWait,
            TaskOwner::Detached if self.notify.state == NotifyState::Waiting => {
                OsTaskState::NotifyWait
            }
            TaskOwner::Detached => OsTaskState::Orphaned,
        }
    }
}

impl Default for OsTcb {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for OsTcb {}
unsafe impl Sync for OsTcb {}

/// Fixed arena of TCBs; a [`TaskId`] is a stable index into it
pub struct TaskTable {
    tcbs: [OsTcb; CFG_TASK_MAX],
    cnt: usize,
}

impl TaskTable {
    pub const fn new() -> Self {
        TaskTable {
            tcbs: [const { OsTcb::new() }; CFG_TASK_MAX],
            cnt: 0,
        }
    }

    pub fn init(&mut self) {
        for tcb in self.tcbs.iter_mut() {
            tcb.init();
        }
        self.cnt = 0;
    }

    /// Number of created tasks
    #[inline]
    pub fn len(&self) -> usize {
        self.cnt
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cnt == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.cnt >= CFG_TASK_MAX
    }

    /// Handle for a created task
    #[inline]
    pub fn get(&self, idx: usize) -> Option<TaskId> {
        (idx < self.cnt).then(|| TaskId::from_index(idx))
    }

    /// Claim the next free slot; TCBs are never returned
    pub(crate) fn alloc(&mut self) -> Option<TaskId> {
        if self.is_full() {
            return None;
        }
        let id = TaskId::from_index(self.cnt);
        self.tcbs[self.cnt].init();
        self.cnt += 1;
        Some(id)
    }

    /// Raw pointer for the context-switch code
    #[inline]
    pub(crate) fn as_mut_ptr(&mut self, id: TaskId) -> *mut OsTcb {
        &mut self.tcbs[id.index()] as *mut OsTcb
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<TaskId> for TaskTable {
    type Output = OsTcb;

    #[inline(always)]
    fn index(&self, id: TaskId) -> &OsTcb {
        &self.tcbs[id.index()]
    }
}

impl IndexMut<TaskId> for TaskTable {
    #[inline(always)]
    fn index_mut(&mut self, id: TaskId) -> &mut OsTcb {
        &mut self.tcbs[id.index()]
    }
}

impl LinkStore for TaskTable {
    #[inline(always)]
    fn link(&self, id: TaskId) -> &Link {
        &self.tcbs[id.index()].link
    }

    #[inline(always)]
    fn link_mut(&mut self, id: TaskId) -> &mut Link {
        &mut self.tcbs[id.index()].link
    }
}
