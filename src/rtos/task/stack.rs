//! Task stack pool
//!
//! Stacks are carved out of one statically sized, 8-byte aligned block and are
//! never returned. Every region length is rounded to an even number of words so
//! each stack top stays 8-byte aligned as the AAPCS requires.

use crate::config::CFG_STK_POOL_SIZE;
use crate::types::OsStkElement;

#[repr(C, align(8))]
struct PoolWords([OsStkElement; CFG_STK_POOL_SIZE]);

/// Bump allocator over the stack block
pub struct StackPool {
    words: PoolWords,
    used: usize,
}

impl StackPool {
    pub const fn new() -> Self {
        StackPool {
            words: PoolWords([0; CFG_STK_POOL_SIZE]),
            used: 0,
        }
    }

    pub fn init(&mut self) {
        self.used = 0;
    }

    /// Words still available
    #[inline]
    pub fn free(&self) -> usize {
        CFG_STK_POOL_SIZE - self.used
    }

    /// Reserve `words` words; returns the region's base offset
    pub fn alloc(&mut self, words: usize) -> Option<usize> {
        let words = words.checked_add(words & 1)?;
        if words > self.free() {
            return None;
        }
        let base = self.used;
        self.used += words;
        self.words.0[base..base + words].fill(0);
        Some(base)
    }

    /// Stack region previously returned by [`alloc`](Self::alloc)
    #[inline]
    pub fn region(&self, base: usize, words: usize) -> &[OsStkElement] {
        &self.words.0[base..base + words + (words & 1)]
    }

    #[inline]
    pub fn region_mut(&mut self, base: usize, words: usize) -> &mut [OsStkElement] {
        &mut self.words.0[base..base + words + (words & 1)]
    }
}

impl Default for StackPool {
    fn default() -> Self {
        Self::new()
    }
}
