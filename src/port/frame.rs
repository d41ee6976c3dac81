//! Initial task frame synthesis
//!
//! A new task's stack is filled so that the generic PendSV resume path can
//! pop it exactly like the stack of a task that was preempted: the eight
//! registers PendSV saves by hand (r4-r11) sit below the eight the core
//! stacks on exception entry (r0-r3, r12, lr, pc, xpsr).

use crate::types::OsStkElement;

/// Words in a complete saved context
pub const CONTEXT_STACK_SIZE: usize = 16;

/// xPSR with only the Thumb bit set
pub const XPSR_T_BIT: u32 = 0x0100_0000;

/// Context structure stored on stack, lowest address first
#[repr(C, align(4))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFrame {
    pub r4: u32,
    pub r5: u32,
    pub r6: u32,
    pub r7: u32,
    pub r8: u32,
    pub r9: u32,
    pub r10: u32,
    pub r11: u32,
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    pub pc: u32,
    pub xpsr: u32,
}

impl TaskFrame {
    /// Frame that "returns" into `entry`, with `exit` as the link register
    pub const fn new(entry: u32, exit: u32) -> Self {
        TaskFrame {
            r4: 0,
            r5: 0,
            r6: 0,
            r7: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            r0: 0,
            r1: 0,
            r2: 0,
            r3: 0,
            r12: 0,
            lr: exit,
            pc: entry & !1,
            xpsr: XPSR_T_BIT,
        }
    }

    pub const fn to_words(&self) -> [OsStkElement; CONTEXT_STACK_SIZE] {
        [
            self.r4, self.r5, self.r6, self.r7, self.r8, self.r9, self.r10, self.r11,
            self.r0, self.r1, self.r2, self.r3, self.r12, self.lr, self.pc, self.xpsr,
        ]
    }

    pub fn from_words(words: &[OsStkElement]) -> Option<Self> {
        let w: &[OsStkElement; CONTEXT_STACK_SIZE] = words.get(..CONTEXT_STACK_SIZE)?.try_into().ok()?;
        Some(TaskFrame {
            r4: w[0],
            r5: w[1],
            r6: w[2],
            r7: w[3],
            r8: w[4],
            r9: w[5],
            r10: w[6],
            r11: w[7],
            r0: w[8],
            r1: w[9],
            r2: w[10],
            r3: w[11],
            r12: w[12],
            lr: w[13],
            pc: w[14],
            xpsr: w[15],
        })
    }
}

/// Write the initial frame at the top of `stack`
///
/// Returns the word offset of the saved stack pointer, or `None` when the
/// stack cannot hold a frame. The top is kept on an even word so the
/// hardware frame is 8-byte aligned, provided `stack` itself is.
pub fn prepare_initial_frame(stack: &mut [OsStkElement], entry: u32, exit: u32) -> Option<usize> {
    let top = stack.len() & !1;
    let sp = top.checked_sub(CONTEXT_STACK_SIZE)?;
    stack[sp..top].copy_from_slice(&TaskFrame::new(entry, exit).to_words());
    Some(sp)
}
