//! Critical section handling
//!
//! Interrupts are disabled on the first `enter` and re-enabled only when the
//! matching outermost `exit` brings the nesting counter back to zero.

use core::sync::atomic::{AtomicU32, Ordering};

/// Nesting counter for interrupt-disabled regions
///
/// The counter is only touched with interrupts already disabled, so plain
/// load/store pairs are enough on a single core.
pub struct CriticalNesting {
    ctr: AtomicU32,
}

impl CriticalNesting {
    pub const fn new() -> Self {
        Self {
            ctr: AtomicU32::new(0),
        }
    }

    /// Disable interrupts and bump the nesting level
    #[inline(always)]
    pub fn enter(&self) {
        irq_disable();
        let n = self.ctr.load(Ordering::Relaxed);
        self.ctr.store(n + 1, Ordering::Release);
    }

    /// Drop one nesting level; returns `true` when interrupts were re-enabled
    #[inline(always)]
    pub fn exit(&self) -> bool {
        let n = self.ctr.load(Ordering::Acquire);
        if n == 0 {
            return false;
        }
        self.ctr.store(n - 1, Ordering::Release);
        if n == 1 {
            irq_enable();
            true
        } else {
            false
        }
    }

    /// Current nesting level
    #[inline(always)]
    pub fn nesting(&self) -> u32 {
        self.ctr.load(Ordering::Acquire)
    }
}

impl Default for CriticalNesting {
    fn default() -> Self {
        Self::new()
    }
}

/// The CPU's nesting counter
static CPU_CRITICAL: CriticalNesting = CriticalNesting::new();

/// RAII guard for critical sections
///
/// When this guard is created, interrupts are disabled.
/// When the outermost guard is dropped, interrupts are enabled again.
pub struct CriticalSection {
    _private: (),
}

impl CriticalSection {
    /// Enter a critical section by disabling interrupts.
    #[inline(always)]
    pub fn enter() -> Self {
        CPU_CRITICAL.enter();
        CriticalSection { _private: () }
    }

    /// Check if we're currently in a critical section
    #[inline(always)]
    pub fn is_active() -> bool {
        CPU_CRITICAL.nesting() > 0
    }

    /// Nesting level of the CPU's critical sections
    #[inline(always)]
    pub fn nesting() -> u32 {
        CPU_CRITICAL.nesting()
    }
}

impl Drop for CriticalSection {
    #[inline(always)]
    fn drop(&mut self) {
        CPU_CRITICAL.exit();
    }
}

/// Execute a closure with interrupts disabled
///
/// The closure receives a reference to the critical section guard,
/// which can be used to access [`CsCell`](crate::rtos::cs_cell::CsCell) protected data.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&CriticalSection) -> R,
{
    let cs = CriticalSection::enter();
    f(&cs)
}

/// Check if currently executing in an ISR context
#[inline]
pub fn is_isr_context() -> bool {
    #[cfg(target_arch = "arm")]
    {
        let ipsr: u32;
        unsafe {
            core::arch::asm!(
                "mrs {}, IPSR",
                out(reg) ipsr,
                options(nomem, nostack, preserves_flags)
            );
        }
        ipsr != 0
    }

    #[cfg(not(target_arch = "arm"))]
    {
        false
    }
}

#[inline(always)]
fn irq_disable() {
    #[cfg(target_arch = "arm")]
    cortex_m::interrupt::disable();
}

#[inline(always)]
fn irq_enable() {
    #[cfg(target_arch = "arm")]
    unsafe {
        cortex_m::interrupt::enable()
    };
}
