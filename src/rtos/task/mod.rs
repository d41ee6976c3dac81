//! Task management module
//!
//! Provides task creation. Tasks are written as infinite loops; there is no
//! deletion path, so TCBs and stacks are never reclaimed.

mod stack;
mod tcb;

pub use stack::StackPool;
pub use tcb::{Notification, OsTaskFn, OsTcb, TaskTable};

use crate::config::{CFG_PRIO_MAX, CFG_STK_SIZE_MIN};
use crate::critical::is_isr_context;
use crate::error::{OsError, OsResult};
use crate::kernel::{with_kernel, Kernel};
use crate::port::{prepare_initial_frame, task_exit_trap};
use crate::types::{OsPrio, TaskId, TaskOwner};

impl Kernel {
    /// Create a task and make it ready
    ///
    /// # Arguments
    /// * `entry` - Task entry point
    /// * `stk_size` - Stack size in words
    /// * `name` - Task name for debugging
    /// * `prio` - Task priority (31 = most urgent)
    ///
    /// The TCB slot is claimed only once the stack region and its frame are
    /// in place; a full task table is rejected before any stack is taken.
    pub fn task_create(
        &mut self,
        entry: OsTaskFn,
        stk_size: usize,
        name: &'static str,
        prio: OsPrio,
    ) -> OsResult<TaskId> {
        if prio as usize >= CFG_PRIO_MAX {
            return Err(OsError::PrioInvalid);
        }

        if stk_size < CFG_STK_SIZE_MIN {
            return Err(OsError::StkSizeInvalid);
        }

        if self.tasks.is_full() {
            return Err(OsError::TaskNoMoreTcb);
        }

        let stk_base = self.stacks.alloc(stk_size).ok_or(OsError::StkPoolEmpty)?;

        // Initialize stack
        let stack = self.stacks.region_mut(stk_base, stk_size);
        let sp = prepare_initial_frame(
            stack,
            entry as *const () as usize as u32,
            task_exit_trap as *const () as usize as u32,
        )
        .ok_or(OsError::StkSizeInvalid)?;
        let stk_ptr = stack[sp..].as_mut_ptr();

        let id = self.tasks.alloc().ok_or(OsError::TaskNoMoreTcb)?;
        let tcb = &mut self.tasks[id];
        tcb.stk_ptr = stk_ptr;
        tcb.stk_base = stk_base;
        tcb.stk_size = stk_size;
        tcb.name = name;
        tcb.entry = Some(entry);
        tcb.prio = prio;
        tcb.owner = TaskOwner::Detached;

        self.make_ready(id);

        crate::debug!("task {} created prio={}", name, prio);

        if self.is_running() {
            self.resched();
        }

        Ok(id)
    }
}

/// Create a new task on the global kernel
///
/// # Example
/// ```ignore
/// fn blink() -> ! {
///     loop {
///         /* ... */
///         let _ = kdrtos::os_delay(500);
///     }
/// }
///
/// let led = kdrtos::task_create(blink, 256, "blink", 3)?;
/// ```
pub fn task_create(
    entry: OsTaskFn,
    stk_size: usize,
    name: &'static str,
    prio: OsPrio,
) -> OsResult<TaskId> {
    if is_isr_context() {
        return Err(OsError::CreateIsr);
    }
    with_kernel(|k| k.task_create(entry, stk_size, name, prio))
}
