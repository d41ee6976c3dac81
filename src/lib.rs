//! kd-rtos: a small preemptive real-time kernel in Rust
//!
//! A single-core kernel for Cortex-M4 providing:
//! - Fixed-priority preemptive scheduling with round robin among peers
//! - Semaphores, single-slot mailboxes and direct task notification
//! - Tick-based delays and a monotonic cycle clock
//! - Context switching via PendSV
//!
//! All kernel state lives in one [`Kernel`] value. The target drives a static
//! instance through the free functions re-exported here; host tests build
//! their own instances and call the methods directly.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod rtos;
pub mod sync;
pub mod port;

// ============ Re-exports ============

pub use rtos::config;
pub use rtos::config::*;
pub use rtos::critical;
pub use rtos::error;
pub use rtos::error::{OsError, OsResult};
pub use rtos::kernel;
pub use rtos::kernel::{os_init, os_start, sched_lock, sched_unlock, Kernel};
pub use rtos::list;
pub use rtos::pool;
pub use rtos::prio;
pub use rtos::types;
pub use rtos::types::*;
pub use rtos::task;
pub use rtos::task::task_create;
pub use rtos::sched;
pub use rtos::time;
pub use rtos::time::{
    clock_get_ms, clock_get_us, clock_now, delay_ms, delay_us, os_delay, os_tick_handler,
    register_periodic_callback, tick_get,
};

#[cfg(feature = "sem")]
pub use sync::sem;
#[cfg(feature = "sem")]
pub use sync::sem::{sem_create, sem_delete, sem_get_info, sem_give, sem_give_binary, sem_take};
#[cfg(feature = "mbox")]
pub use sync::mbox;
#[cfg(feature = "mbox")]
pub use sync::mbox::{mbox_create, mbox_delete, mbox_fetch, mbox_post};
#[cfg(feature = "notify")]
pub use sync::notify;
#[cfg(feature = "notify")]
pub use sync::notify::{task_notify, task_wait_notify};

#[cfg(feature = "pac")]
pub use stm32_metapac as pac;
#[cfg(feature = "hal")]
pub use stm32f4xx_hal as hal;
