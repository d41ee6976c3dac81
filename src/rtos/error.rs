//! Error types for the kernel
//!
//! Uses Rust's Result pattern instead of C-style null handles and silent no-ops.

/// RTOS error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum OsError {
    // ============ ISR errors ============
    /// Cannot create object from ISR
    CreateIsr = 12001,
    /// Cannot delete object from ISR
    DelIsr = 13001,

    // ============ Lock errors ============
    /// Lock nesting overflow
    LockNestingOvf = 21001,

    // ============ Memory errors ============
    /// Object pool has no free slot
    MemNoFreeBlks = 22210,

    // ============ Object errors ============
    /// Object was deleted (or never created)
    ObjDel = 24002,

    // ============ OS state errors ============
    /// OS is not running
    OsNotRunning = 24201,
    /// OS is already running
    OsRunning = 24202,
    /// OS not initialized
    OsNotInit = 24203,
    /// No task to start
    OsNoAppTask = 24204,

    // ============ Pend errors ============
    /// Cannot pend from ISR
    PendIsr = 25006,

    // ============ Priority errors ============
    /// Invalid priority
    PrioInvalid = 25203,

    // ============ Scheduler errors ============
    /// Scheduler is locked, blocking is not allowed
    SchedLocked = 28003,
    /// Scheduler is not locked
    SchedNotLocked = 28004,

    // ============ Stack errors ============
    /// Invalid stack size
    StkSizeInvalid = 28208,
    /// Stack pool exhausted
    StkPoolEmpty = 28211,

    // ============ Task errors ============
    /// Invalid task handle
    TaskInvalid = 29007,
    /// No more TCBs available
    TaskNoMoreTcb = 29008,
}

/// Result type alias for RTOS operations
pub type OsResult<T> = Result<T, OsError>;

impl OsError {
    /// Numeric code, stable across builds
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }
}
