//! Priority bitmap management for O(1) highest-ready lookup
//!
//! One bit per priority level in a single word; bit `i` set means the ready
//! list of priority `i` is non-empty. Higher bit = more urgent, so the
//! highest ready priority falls out of a count-leading-zeros.

use crate::config::CFG_PRIO_MAX;
use crate::types::OsPrio;

/// Priority bitmap table
pub struct PrioTable {
    bitmap: u32,
}

impl PrioTable {
    pub const fn new() -> Self {
        PrioTable { bitmap: 0 }
    }

    pub fn init(&mut self) {
        self.bitmap = 0;
    }

    /// Out-of-range priorities saturate to the top bit instead of failing.
    #[inline(always)]
    fn bit(prio: OsPrio) -> u32 {
        1 << (prio as usize).min(CFG_PRIO_MAX - 1)
    }

    /// Mark a priority as having ready tasks
    #[inline]
    pub fn insert(&mut self, prio: OsPrio) {
        self.bitmap |= Self::bit(prio);
    }

    /// Mark a priority as having no ready task
    #[inline]
    pub fn remove(&mut self, prio: OsPrio) {
        self.bitmap &= !Self::bit(prio);
    }

    /// Get the highest ready priority
    ///
    /// Returns 0 for an empty table, which is only unambiguous because the idle
    /// task keeps priority 0 occupied.
    #[inline]
    pub fn get_highest(&self) -> OsPrio {
        if self.bitmap == 0 {
            return 0;
        }
        (31 - self.bitmap.leading_zeros()) as OsPrio
    }

    /// Check if a specific priority has any ready tasks
    #[inline]
    pub fn is_set(&self, prio: OsPrio) -> bool {
        self.bitmap & Self::bit(prio) != 0
    }

    /// Check if the priority table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitmap == 0
    }

    /// Raw bitmap word
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bitmap
    }
}

impl Default for PrioTable {
    fn default() -> Self {
        Self::new()
    }
}
