//! Time management module
//!
//! Provides tick handling, the delayed-list reaper and task delays.

mod clock;

pub use clock::{
    clock_get_ms, clock_get_us, clock_now, delay_ms, delay_us, register_periodic_callback,
    CountdownTimer, MonoClock, PeriodicCallback,
};

use clock::CLOCK;

use crate::config::CFG_TICK_RATE_HZ;
use crate::error::{OsError, OsResult};
use crate::kernel::{with_kernel, Kernel};
use crate::types::{OsTick, Pend, TaskOwner};

impl Kernel {
    /// Kernel part of the tick interrupt
    ///
    /// Reaps expired delays, then asks for a switch so equal-priority peers
    /// rotate. With the scheduler locked the switch is skipped; the final
    /// unlock requests it instead.
    pub fn tick(&mut self) {
        self.tick_ctr = self.tick_ctr.wrapping_add(1);
        self.reap_delayed();

        if self.sched_lock_nesting == 0 {
            self.request_switch();
        } else {
            crate::trace!("tick {}: switch deferred by lock", self.tick_ctr);
        }
    }

    /// Walk the delayed list once, re-readying tasks whose countdown ends
    ///
    /// Readied tasks move to another list mid-walk, so the walk is bounded by
    /// the member count taken on entry.
    fn reap_delayed(&mut self) {
        let mut remaining = self.delayed.count();
        let mut cursor = self.delayed.head();

        while remaining > 0 {
            let Some(id) = cursor else { break };
            remaining -= 1;
            cursor = Some(self.tasks[id].link.next);

            let tcb = &mut self.tasks[id];
            tcb.dly_ticks = tcb.dly_ticks.saturating_sub(1);
            if tcb.dly_ticks == 0 {
                self.delayed.remove(&mut self.tasks, id);
                self.tasks[id].owner = TaskOwner::Detached;
                self.make_ready(id);
            }
        }
    }

    /// Put the current task to sleep for `ticks` tick firings
    ///
    /// Returns `Pend::Ready(())` for 0 ticks without touching any list.
    pub fn os_delay(&mut self, ticks: OsTick) -> OsResult<Pend<()>> {
        if ticks == 0 {
            return Ok(Pend::Ready(()));
        }

        let cur = self.pend_guard()?;
        self.detach(cur);
        self.tasks[cur].dly_ticks = ticks;
        self.delayed.insert_end(&mut self.tasks, cur);
        self.tasks[cur].owner = TaskOwner::Delayed;

        self.request_switch();
        Ok(Pend::Blocked)
    }
}

/// Delay the calling task
///
/// With the scheduler locked the task cannot be switched out, so the delay
/// degrades to a busy wait of the same length.
pub fn os_delay(ticks: OsTick) -> OsResult<()> {
    match with_kernel(|k| k.os_delay(ticks)) {
        Ok(_) => Ok(()),
        Err(OsError::SchedLocked) => {
            let ms = (ticks as u64 * 1000 / CFG_TICK_RATE_HZ as u64) as u32;
            crate::debug!("scheduler locked, spinning {} ms", ms);
            delay_ms(ms);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Get current tick count
#[inline]
pub fn tick_get() -> OsTick {
    with_kernel(|k| k.tick_get())
}

/// Tick handler
///
/// The periodic callback runs outside the kernel borrow so it may call
/// kernel services itself.
pub fn os_tick_handler() {
    if !with_kernel(|k| k.is_running()) {
        return;
    }

    CLOCK.on_tick();
    with_kernel(|k| k.tick());
}

/// SysTick interrupt handler
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn SysTick() {
    os_tick_handler();
}
