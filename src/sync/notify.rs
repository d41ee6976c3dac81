//! Direct task notification
//!
//! One value slot inside each TCB, addressed by task handle. A waiting task
//! sits on no list at all; only a notify naming it can bring it back.

use crate::error::{OsError, OsResult};
use crate::kernel::{with_kernel, Kernel};
use crate::types::{NotifyState, OsNotifyValue, Pend, TaskId, TaskOwner};

impl Kernel {
    /// Deliver `value` to `target`, overwriting any unconsumed value
    pub fn task_notify(&mut self, target: TaskId, value: OsNotifyValue) -> OsResult<()> {
        if target.index() >= self.tasks.len() {
            return Err(OsError::TaskInvalid);
        }

        let tcb = &mut self.tasks[target];
        tcb.notify.value = value;
        let was_waiting = tcb.notify.state == NotifyState::Waiting;
        tcb.notify.state = NotifyState::Pending;

        if was_waiting && tcb.owner == TaskOwner::Detached {
            self.make_ready(target);
            self.resched();
        }
        Ok(())
    }

    /// Consume the caller's pending value, or park the caller
    pub fn task_wait_notify(&mut self) -> OsResult<Pend<OsNotifyValue>> {
        let cur = self.pend_guard()?;

        let notify = &mut self.tasks[cur].notify;
        if notify.state == NotifyState::Pending {
            notify.state = NotifyState::None;
            return Ok(Pend::Ready(notify.value));
        }

        notify.state = NotifyState::Waiting;
        self.detach(cur);

        self.request_switch();
        Ok(Pend::Blocked)
    }
}

// ============ Global API ============

/// Notify a task; safe from interrupt handlers
pub fn task_notify(target: TaskId, value: OsNotifyValue) -> OsResult<()> {
    with_kernel(|k| k.task_notify(target, value))
}

/// Wait for a notification addressed to the calling task
pub fn task_wait_notify() -> OsResult<OsNotifyValue> {
    loop {
        if let Pend::Ready(value) = with_kernel(|k| k.task_wait_notify())? {
            return Ok(value);
        }
    }
}
