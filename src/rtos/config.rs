//! Compile-time configuration for the kernel
//!
//! These constants control the behavior and resource limits of the RTOS.

use crate::types::OsPrio;

/// Number of priority levels (one bitmap word)
pub const CFG_PRIO_MAX: usize = 32;

/// Idle task priority (lowest)
pub const CFG_PRIO_IDLE: OsPrio = 0;

/// System tick rate in Hz
pub const CFG_TICK_RATE_HZ: u32 = 1000;

/// Core clock feeding SysTick
pub const CFG_CPU_CLOCK_HZ: u32 = 16_000_000;

/// Maximum number of tasks, idle task included
pub const CFG_TASK_MAX: usize = 16;

/// Words available to task stacks
pub const CFG_STK_POOL_SIZE: usize = 4096;

/// Minimum task stack size in words
pub const CFG_STK_SIZE_MIN: usize = 32;

/// Idle task stack size in words
pub const CFG_IDLE_STK_SIZE: usize = 64;

/// Number of semaphore slots
pub const CFG_SEM_MAX: usize = 8;

/// Number of mailbox slots
pub const CFG_MBOX_MAX: usize = 8;

/// SysTick cycles per kernel tick
pub const CFG_CYCLES_PER_TICK: u32 = CFG_CPU_CLOCK_HZ / CFG_TICK_RATE_HZ;

/// Core cycles per millisecond
pub const CFG_CYCLES_PER_MS: u32 = CFG_CPU_CLOCK_HZ / 1000;

/// Core cycles per microsecond
pub const CFG_CYCLES_PER_US: u32 = CFG_CPU_CLOCK_HZ / 1_000_000;

const _: () = assert!(CFG_PRIO_MAX <= 32);
const _: () = assert!(CFG_TASK_MAX <= u8::MAX as usize);
const _: () = assert!(CFG_IDLE_STK_SIZE >= CFG_STK_SIZE_MIN);
const _: () = assert!(CFG_CYCLES_PER_US > 0);
