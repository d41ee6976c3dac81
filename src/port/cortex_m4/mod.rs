//! Cortex-M4 port implementation
//!
//! Provides context switching via PendSV exception handler.
//! Tasks must not use the FPU: the switch saves the basic frame only.

use core::arch::{asm, naked_asm};

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::config::CFG_CYCLES_PER_TICK;
use crate::kernel::{CPU_STATE, KERNEL};
use crate::time::CountdownTimer;

/// Interrupt stack for MSP
#[no_mangle]
static mut ISR_STACK: [u64; 256] = [0; 256];

/// Initialize SysTick timer for system tick generation
///
/// # Arguments
/// * `cnts` - Core cycles per tick
///
/// # Example
/// For 16MHz clock with 1000Hz tick rate: cnts = 16_000_000 / 1000 = 16_000
pub fn os_cpu_systick_init(cnts: u32) {
    let mut p = unsafe { cortex_m::Peripherals::steal() };

    p.SYST.set_reload(cnts - 1);
    p.SYST.clear_current();
    p.SYST.set_clock_source(SystClkSource::Core);
    p.SYST.enable_interrupt();
    p.SYST.enable_counter();
}

/// Live SysTick registers
pub struct SysTickTimer;

impl CountdownTimer for SysTickTimer {
    #[inline(always)]
    fn reload(&self) -> u32 {
        SYST::get_reload()
    }

    #[inline(always)]
    fn current(&self) -> u32 {
        SYST::get_current()
    }
}

/// Move to the interrupt stack, start the tick and pend the first switch
///
/// Nothing can interrupt before the exception priorities and the stack are
/// in place; the tick is armed last, just before interrupts come back on.
///
/// # Safety
/// Call once, from thread mode, after `Kernel::start` selected a task.
/// Nothing on the caller's stack survives.
#[no_mangle]
#[allow(static_mut_refs)]
pub unsafe extern "C" fn os_start_high_rdy() {
    unsafe {
        cortex_m::interrupt::disable();

        let mut scb = cortex_m::Peripherals::steal().SCB;

        // PendSV must be the lowest priority exception
        scb.set_priority(SystemHandler::PendSV, 0xF0);
        scb.set_priority(SystemHandler::SysTick, 0xF0);

        let msp_top = ISR_STACK.as_ptr() as u32 + core::mem::size_of_val(&ISR_STACK) as u32;

        asm!("msr msp, {0}", in(reg) msp_top);
        asm!("msr psp, {0}", in(reg) 0);

        os_cpu_systick_init(CFG_CYCLES_PER_TICK);

        cortex_m::peripheral::SCB::set_pendsv();
        cortex_m::interrupt::enable();
    }

    loop {
        cortex_m::asm::wfi();
    }
}

/// Request a context switch
#[inline(always)]
pub fn os_ctx_sw() {
    cortex_m::peripheral::SCB::set_pendsv();
}

/// Rust half of PendSV
///
/// Stores the outgoing task's stack pointer, runs the scheduler decision and
/// returns the stack pointer of the task to resume.
#[inline(never)]
#[no_mangle]
#[allow(static_mut_refs)]
unsafe extern "C" fn pendsv_switch_context(cur_sp: *mut u32) -> *mut u32 {
    unsafe {
        let state = &mut CPU_STATE;

        let kernel = KERNEL.get_unchecked();

        // The first switch resumes the task Kernel::start already chose.
        let next = if state.tcb_cur.is_null() {
            kernel.current()
        } else {
            (*state.tcb_cur).stk_ptr = cur_sp;
            kernel.context_switch()
        };
        let Some(next) = next else {
            return cur_sp;
        };

        let tcb = kernel.tcb_ptr(next);
        state.tcb_cur = tcb;

        (*tcb).stk_ptr
    }
}

/// PendSV exception handler - performs full context switch
///
/// 1. Save R4-R11 below the hardware frame on PSP (skipped for the first task)
/// 2. Call pendsv_switch_context to pick the next task
/// 3. Restore R4-R11 from the new task's stack
/// 4. Return to thread mode on PSP
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "cpsid i",
        "dsb",
        "isb",

        "mrs r0, psp",

        "ldr r1, ={cpu_state}",
        "ldr r1, [r1]",
        "cbz r1, 1f",

        "stmdb r0!, {{r4-r11}}",

        "1:",
        "bl pendsv_switch_context",

        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",

        // EXC_RETURN: thread mode, PSP, basic frame
        "mvn lr, #2",

        "cpsie i",
        "dsb",
        "isb",

        "bx lr",

        cpu_state = sym CPU_STATE,
    );
}
