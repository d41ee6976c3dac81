//! Core RTOS modules
//!
//! Contains kernel, scheduler, task management, and time management.

pub mod config;
pub mod critical;
pub mod cs_cell;
pub mod error;
pub mod kernel;
pub mod list;
pub mod pool;
pub mod prio;
pub mod sched;
pub mod task;
pub mod time;
pub mod types;
