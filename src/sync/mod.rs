//! Synchronization primitives
//!
//! Contains semaphores, mailboxes and direct task notification.

#[cfg(feature = "sem")]
pub mod sem;

#[cfg(feature = "mbox")]
pub mod mbox;

#[cfg(feature = "notify")]
pub mod notify;
