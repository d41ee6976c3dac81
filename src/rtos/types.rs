//! Core type definitions for the kernel
//!
//! These types provide strong typing for RTOS primitives.

/// Task priority (0 = idle, 31 = most urgent)
pub type OsPrio = u8;

/// Tick counter type
pub type OsTick = u32;

/// Semaphore counter type
pub type OsSemCtr = u32;

/// Nesting counter
pub type OsNestingCtr = u8;

/// Stack element type
pub type OsStkElement = u32;

/// Mailbox message, one machine word
pub type OsMsg = *const ();

/// Task notification value
pub type OsNotifyValue = u32;

/// Handle of a task in the kernel's task table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(u8);

impl TaskId {
    #[inline(always)]
    pub(crate) const fn from_index(idx: usize) -> Self {
        TaskId(idx as u8)
    }

    /// Slot index in the task table
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a semaphore: pool slot plus the slot generation it was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemId {
    idx: u8,
    generation: u8,
}

impl SemId {
    #[inline(always)]
    pub(crate) const fn new(idx: usize, generation: u8) -> Self {
        SemId { idx: idx as u8, generation }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.idx as usize
    }

    #[inline(always)]
    pub const fn generation(self) -> u8 {
        self.generation
    }
}

/// Handle of a mailbox: pool slot plus the slot generation it was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MboxId {
    idx: u8,
    generation: u8,
}

impl MboxId {
    #[inline(always)]
    pub(crate) const fn new(idx: usize, generation: u8) -> Self {
        MboxId { idx: idx as u8, generation }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.idx as usize
    }

    #[inline(always)]
    pub const fn generation(self) -> u8 {
        self.generation
    }
}

/// The one structure a task's status link currently belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOwner {
    /// Linked into the ready list of this priority
    Ready(OsPrio),
    /// Linked into the delayed list
    Delayed,
    /// Queued on a semaphore
    #[cfg(feature = "sem")]
    SemWait(SemId),
    /// Queued on a mailbox
    #[cfg(feature = "mbox")]
    MboxWait(MboxId),
    /// Linked nowhere
    Detached,
}

/// Task state, derived from the owner tag and notification slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OsTaskState {
    /// Task is ready to run (or running)
    Ready = 0,
    /// Task is waiting out a delay
    Delayed = 1,
    /// Task is pending on a semaphore
    SemWait = 2,
    /// Task is pending on a mailbox
    MboxWait = 3,
    /// Task is waiting for a direct notification
    NotifyWait = 4,
    /// Task is linked nowhere and nothing will wake it
    Orphaned = 5,
}

/// Notification slot state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotifyState {
    /// No value, nobody waiting
    None = 0,
    /// A value is waiting to be consumed
    Pending = 1,
    /// The task sleeps until notified
    Waiting = 2,
}

/// Outcome of a call that may suspend the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pend<T> {
    /// Completed without suspending
    Ready(T),
    /// Caller was taken off the ready table and a switch was requested
    Blocked,
}

impl<T> Pend<T> {
    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Pend::Blocked)
    }
}

/// Snapshot of a semaphore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemInfo {
    /// Current counter value
    pub available: OsSemCtr,
    /// Tasks queued on the wait list
    pub waiting: usize,
}
