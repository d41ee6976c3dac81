//! Monotonic cycle clock
//!
//! A 64-bit base advanced by one tick's worth of cycles on every tick, plus
//! the elapsed part of the current period read from the live countdown.
//! Busy delays spin on this clock and never give up the CPU.

use portable_atomic::{AtomicU64, Ordering};

use crate::config::{CFG_CYCLES_PER_MS, CFG_CYCLES_PER_TICK, CFG_CYCLES_PER_US};
use crate::critical::{critical_section, CriticalSection};
use crate::rtos::cs_cell::CsCell;

/// Hook run from the tick interrupt
pub type PeriodicCallback = fn();

/// A down-counting hardware timer that reloads once per tick
pub trait CountdownTimer {
    /// Value loaded at the start of each period
    fn reload(&self) -> u32;
    /// Live countdown value
    fn current(&self) -> u32;
}

pub struct MonoClock {
    base: AtomicU64,
    cycles_per_tick: u32,
    callback: CsCell<Option<PeriodicCallback>>,
}

impl MonoClock {
    pub const fn new(cycles_per_tick: u32) -> Self {
        MonoClock {
            base: AtomicU64::new(0),
            cycles_per_tick,
            callback: CsCell::new(None),
        }
    }

    /// Account for one elapsed tick period
    #[inline]
    pub fn advance(&self) {
        self.base
            .fetch_add(self.cycles_per_tick as u64, Ordering::AcqRel);
    }

    /// Cycles accumulated by completed periods
    #[inline]
    pub fn base(&self) -> u64 {
        self.base.load(Ordering::Acquire)
    }

    /// Current cycle count
    ///
    /// A tick landing between the base read and the countdown read would pair
    /// an old base with a freshly reloaded counter, so the base is read again
    /// and the whole read retried until it did not move.
    pub fn now<T: CountdownTimer + ?Sized>(&self, timer: &T) -> u64 {
        loop {
            let last = self.base();
            let elapsed = timer.reload().wrapping_sub(timer.current());
            if self.base() == last {
                return last + elapsed as u64;
            }
        }
    }

    pub fn set_callback(&self, cs: &CriticalSection, f: Option<PeriodicCallback>) {
        *self.callback.get(cs) = f;
    }

    pub fn callback(&self, cs: &CriticalSection) -> Option<PeriodicCallback> {
        *self.callback.get(cs)
    }

    /// One tick period elapsed: advance the base, then run the hook
    ///
    /// The hook is called with no critical section held.
    pub fn on_tick(&self) {
        self.advance();
        if let Some(f) = critical_section(|cs| self.callback(cs)) {
            f();
        }
    }
}

/// The system clock driven by SysTick
pub(crate) static CLOCK: MonoClock = MonoClock::new(CFG_CYCLES_PER_TICK);

/// Cycles since the tick started
#[inline]
pub fn clock_now() -> u64 {
    CLOCK.now(&crate::port::SysTickTimer)
}

#[inline]
pub fn clock_get_us() -> u64 {
    clock_now() / CFG_CYCLES_PER_US as u64
}

#[inline]
pub fn clock_get_ms() -> u64 {
    clock_now() / CFG_CYCLES_PER_MS as u64
}

/// Spin for `us` microseconds
pub fn delay_us(us: u32) {
    let start = clock_now();
    let cycles = us as u64 * CFG_CYCLES_PER_US as u64;
    while clock_now().wrapping_sub(start) < cycles {
        core::hint::spin_loop();
    }
}

/// Spin for `ms` milliseconds
///
/// Usable with the scheduler locked or before the kernel starts.
pub fn delay_ms(ms: u32) {
    let start = clock_now();
    let cycles = ms as u64 * CFG_CYCLES_PER_MS as u64;
    while clock_now().wrapping_sub(start) < cycles {
        core::hint::spin_loop();
    }
}

/// Install (or clear) the hook called on every tick
pub fn register_periodic_callback(f: Option<PeriodicCallback>) {
    critical_section(|cs| CLOCK.set_callback(cs, f));
}
