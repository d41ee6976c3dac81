//! Port layer - CPU-specific implementations
//!
//! The kernel touches the hardware only through this boundary: building a
//! task's first frame, requesting a switch, programming the tick timer,
//! reading its live countdown, and launching the first task.

pub mod frame;

pub use frame::prepare_initial_frame;

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4::*;

// Stub implementations for non-ARM targets (for testing)
#[cfg(not(target_arch = "arm"))]
pub mod stub {
    use crate::time::CountdownTimer;

    pub unsafe fn os_start_high_rdy() {
        panic!("os_start_high_rdy not available on this platform");
    }

    pub fn os_ctx_sw() {
        // No-op for testing
    }

    pub fn os_cpu_systick_init(_cnts: u32) {
        // No-op for testing
    }

    /// Tick timer that never counts
    pub struct SysTickTimer;

    impl CountdownTimer for SysTickTimer {
        fn reload(&self) -> u32 {
            0
        }

        fn current(&self) -> u32 {
            0
        }
    }
}

#[cfg(not(target_arch = "arm"))]
pub use stub::*;

/// Where a task lands if its entry function ever returns
#[no_mangle]
pub fn task_exit_trap() -> ! {
    crate::error!("task returned from its entry function");
    loop {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::wfi();
        #[cfg(not(target_arch = "arm"))]
        core::hint::spin_loop();
    }
}
