//! Kernel state and initialization
//!
//! Everything the scheduler and the primitives share lives in one [`Kernel`]
//! value. The target runs a single static instance behind a [`CsCell`]; host
//! tests build as many independent instances as they like.

use crate::config::{CFG_IDLE_STK_SIZE, CFG_PRIO_IDLE};
#[cfg(feature = "mbox")]
use crate::config::CFG_MBOX_MAX;
#[cfg(feature = "sem")]
use crate::config::CFG_SEM_MAX;
use crate::critical::{critical_section, is_isr_context};
use crate::rtos::cs_cell::CsCell;
use crate::error::{OsError, OsResult};
use crate::list::OsList;
#[cfg(feature = "mbox")]
use crate::mbox::OsMbox;
#[cfg(any(feature = "sem", feature = "mbox"))]
use crate::pool::ObjPool;
use crate::prio::PrioTable;
use crate::sched::ReadyTable;
#[cfg(feature = "sem")]
use crate::sem::OsSem;
use crate::task::{OsTcb, StackPool, TaskTable};
use crate::types::{OsNestingCtr, OsPrio, OsStkElement, OsTick, TaskId};

// ============ Kernel State ============

/// Complete scheduler state
pub struct Kernel {
    pub(crate) tasks: TaskTable,
    pub(crate) stacks: StackPool,
    pub(crate) rdy: ReadyTable,
    pub(crate) delayed: OsList,
    #[cfg(feature = "sem")]
    pub(crate) sems: ObjPool<OsSem, CFG_SEM_MAX>,
    #[cfg(feature = "mbox")]
    pub(crate) mboxes: ObjPool<OsMbox, CFG_MBOX_MAX>,
    pub(crate) cur: Option<TaskId>,
    pub(crate) next: Option<TaskId>,
    pub(crate) sched_lock_nesting: OsNestingCtr,
    pub(crate) switch_pending: bool,
    pub(crate) tick_ctr: OsTick,
    initialized: bool,
    running: bool,
}

impl Kernel {
    pub const fn new() -> Self {
        Kernel {
            tasks: TaskTable::new(),
            stacks: StackPool::new(),
            rdy: ReadyTable::new(),
            delayed: OsList::new(),
            #[cfg(feature = "sem")]
            sems: ObjPool::new(),
            #[cfg(feature = "mbox")]
            mboxes: ObjPool::new(),
            cur: None,
            next: None,
            sched_lock_nesting: 0,
            switch_pending: false,
            tick_ctr: 0,
            initialized: false,
            running: false,
        }
    }

    /// Reset all state in place and create the idle task
    ///
    /// The idle task keeps priority 0 permanently ready, which is what makes
    /// an empty-bitmap answer of 0 unambiguous.
    pub fn init(&mut self) -> OsResult<()> {
        if self.running {
            return Err(OsError::OsRunning);
        }

        self.tasks.init();
        self.stacks.init();
        self.rdy.init();
        self.delayed.init();
        #[cfg(feature = "sem")]
        self.sems.clear();
        #[cfg(feature = "mbox")]
        self.mboxes.clear();
        self.cur = None;
        self.next = None;
        self.sched_lock_nesting = 0;
        self.switch_pending = false;
        self.tick_ctr = 0;

        self.task_create(os_idle_task, CFG_IDLE_STK_SIZE, "idle", CFG_PRIO_IDLE)?;
        self.initialized = true;
        Ok(())
    }

    /// Mark the kernel running and select the first task
    pub fn start(&mut self) -> OsResult<TaskId> {
        if self.running {
            return Err(OsError::OsRunning);
        }
        if self.tasks.is_empty() {
            return Err(OsError::OsNoAppTask);
        }
        self.running = true;
        self.context_switch().ok_or(OsError::OsNoAppTask)
    }

    // ============ Accessors ============

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Task currently executing
    #[inline(always)]
    pub fn current(&self) -> Option<TaskId> {
        self.cur
    }

    /// Task chosen by the last scheduling decision
    #[inline(always)]
    pub fn next(&self) -> Option<TaskId> {
        self.next
    }

    #[inline(always)]
    pub fn is_switch_pending(&self) -> bool {
        self.switch_pending
    }

    #[inline(always)]
    pub fn sched_lock_nesting(&self) -> OsNestingCtr {
        self.sched_lock_nesting
    }

    #[inline(always)]
    pub fn tick_get(&self) -> OsTick {
        self.tick_ctr
    }

    #[inline]
    pub fn tcb(&self, id: TaskId) -> &OsTcb {
        &self.tasks[id]
    }

    #[inline]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn prio_table(&self) -> &PrioTable {
        self.rdy.prio_table()
    }

    #[inline]
    pub fn rdy_list(&self, prio: OsPrio) -> &OsList {
        self.rdy.list(prio)
    }

    #[inline]
    pub fn delayed_list(&self) -> &OsList {
        &self.delayed
    }

    /// Members of the ready list of `prio`, head first
    pub fn ready_tasks(&self, prio: OsPrio) -> impl Iterator<Item = TaskId> + '_ {
        self.rdy.list(prio).iter(&self.tasks)
    }

    /// Members of the delayed list
    pub fn delayed_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.delayed.iter(&self.tasks)
    }

    /// A task's stack region
    pub fn task_stack(&self, id: TaskId) -> &[OsStkElement] {
        let tcb = &self.tasks[id];
        self.stacks.region(tcb.stk_base, tcb.stk_size)
    }

    // ============ Switch requests ============

    /// Set the pending-switch flag and pend PendSV
    ///
    /// Before start the flag is only recorded; the first switch is pended by
    /// `os_start`.
    pub(crate) fn request_switch(&mut self) {
        self.switch_pending = true;
        if self.running {
            crate::port::os_ctx_sw();
        }
    }

    /// Request a switch unless the scheduler lock defers it
    pub(crate) fn resched(&mut self) {
        if self.sched_lock_nesting == 0 {
            self.request_switch();
        }
    }

    /// The single gate every blocking call passes through
    ///
    /// Blocking while the scheduler is locked would park the caller with no
    /// switch ever servicing the wakeup, so it is refused here.
    pub(crate) fn pend_guard(&self) -> OsResult<TaskId> {
        if is_isr_context() {
            return Err(OsError::PendIsr);
        }
        if self.sched_lock_nesting > 0 {
            return Err(OsError::SchedLocked);
        }
        self.cur.ok_or(OsError::OsNotRunning)
    }

    // ============ Scheduler lock ============

    /// Suppress task switches; interrupts keep being serviced
    pub fn sched_lock(&mut self) -> OsResult<()> {
        if self.sched_lock_nesting == OsNestingCtr::MAX {
            return Err(OsError::LockNestingOvf);
        }
        self.sched_lock_nesting += 1;
        Ok(())
    }

    /// Drop one lock level; reaching zero always requests a switch
    pub fn sched_unlock(&mut self) -> OsResult<()> {
        if self.sched_lock_nesting == 0 {
            return Err(OsError::SchedNotLocked);
        }
        self.sched_lock_nesting -= 1;
        if self.sched_lock_nesting == 0 {
            self.request_switch();
        }
        Ok(())
    }

    /// Raw pointer to a TCB for the switch routine
    #[inline]
    pub(crate) fn tcb_ptr(&mut self, id: TaskId) -> *mut OsTcb {
        self.tasks.as_mut_ptr(id)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

// ============ Global Instances ============

/// The kernel instance the target runs
pub(crate) static KERNEL: CsCell<Kernel> = CsCell::new(Kernel::new());

/// Run `f` on the global kernel with interrupts disabled
#[inline]
pub(crate) fn with_kernel<R>(f: impl FnOnce(&mut Kernel) -> R) -> R {
    critical_section(|cs| f(KERNEL.get(cs)))
}

// ============ CPU/Context Switch State ============

/// Current TCB pointer shared with the PendSV handler
///
/// The handler trusts the first field of a TCB to be its saved stack pointer.
#[repr(C)]
pub struct CpuState {
    /// Current running task's TCB pointer
    pub tcb_cur: *mut OsTcb,
}

impl CpuState {
    pub const fn new() -> Self {
        Self {
            tcb_cur: core::ptr::null_mut(),
        }
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}

/// Global CPU state instance
#[no_mangle]
#[used]
pub static mut CPU_STATE: CpuState = CpuState::new();

// ============ Initialization ============

/// Idle task: always ready at priority 0
fn os_idle_task() -> ! {
    loop {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::wfi();
        #[cfg(not(target_arch = "arm"))]
        core::hint::spin_loop();
    }
}

// ============ Public API ============

/// Initialize the RTOS kernel
///
/// This must be called before any other OS function. It resets the ready
/// table and object pools and creates the idle task.
pub fn os_init() -> OsResult<()> {
    if is_isr_context() {
        return Err(OsError::CreateIsr);
    }
    with_kernel(|k| k.init())?;
    crate::info!("kernel initialized");
    Ok(())
}

/// Start multitasking
///
/// Selects the highest priority ready task, starts the tick and pends the
/// first switch. It never returns on the target.
pub fn os_start() -> OsResult<()> {
    critical_section(|cs| {
        let k = KERNEL.get(cs);
        if !k.is_initialized() {
            return Err(OsError::OsNotInit);
        }
        let first = k.start()?;
        crate::info!("starting task {}", k.tcb(first).name);
        // PendSV sees no current TCB and skips saving the boot context.
        unsafe {
            CPU_STATE = CpuState::new();
        }
        Ok(())
    })?;

    unsafe { crate::port::os_start_high_rdy() };

    Ok(())
}

/// Lock the scheduler
pub fn sched_lock() -> OsResult<()> {
    with_kernel(|k| k.sched_lock())
}

/// Unlock the scheduler
pub fn sched_unlock() -> OsResult<()> {
    with_kernel(|k| k.sched_unlock())
}
