//! Scheduling and primitive tests against host-side kernel instances
//!
//! Each test drives its own `Kernel`. A "switch" is simulated by calling
//! `context_switch`, which is exactly what PendSV does on the target.

use kdrtos::config::{CFG_MBOX_MAX, CFG_SEM_MAX, CFG_STK_POOL_SIZE, CFG_TASK_MAX};
use kdrtos::error::OsError;
use kdrtos::port::frame::{TaskFrame, CONTEXT_STACK_SIZE, XPSR_T_BIT};
use kdrtos::types::{NotifyState, OsTaskState, Pend, SemInfo, TaskId, TaskOwner};
use kdrtos::Kernel;

fn task_a() -> ! {
    loop {
        std::hint::spin_loop();
    }
}

fn task_b() -> ! {
    loop {
        std::hint::spin_loop();
    }
}

fn kernel() -> Box<Kernel> {
    let mut k = Box::new(Kernel::new());
    k.init().unwrap();
    k
}

/// Kernel running a single application task
fn running_with(prio: u8) -> (Box<Kernel>, TaskId) {
    let mut k = kernel();
    let a = k.task_create(task_a, 64, "a", prio).unwrap();
    assert_eq!(k.start().unwrap(), a);
    (k, a)
}

fn idle(k: &Kernel) -> TaskId {
    k.ready_tasks(0).next().unwrap()
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_init_creates_idle() {
        let k = kernel();
        assert!(k.is_initialized());
        assert!(!k.is_running());
        assert_eq!(k.task_count(), 1);
        assert!(k.prio_table().is_set(0));
        assert_eq!(k.tcb(idle(&k)).name, "idle");
    }

    #[test]
    fn test_start_without_tasks() {
        let mut k = Box::new(Kernel::new());
        assert_eq!(k.start(), Err(OsError::OsNoAppTask));
    }

    #[test]
    fn test_start_picks_highest() {
        let mut k = kernel();
        let _low = k.task_create(task_a, 64, "low", 2).unwrap();
        let high = k.task_create(task_b, 64, "high", 5).unwrap();

        assert_eq!(k.start(), Ok(high));
        assert_eq!(k.current(), Some(high));
        assert!(!k.is_switch_pending());
        assert_eq!(k.start(), Err(OsError::OsRunning));
        assert_eq!(k.init(), Err(OsError::OsRunning));
    }

    #[test]
    fn test_create_while_running_requests_switch() {
        let (mut k, _a) = running_with(3);
        assert!(!k.is_switch_pending());

        let b = k.task_create(task_b, 64, "b", 7).unwrap();
        assert!(k.is_switch_pending());
        assert_eq!(k.context_switch(), Some(b));
    }
}

mod task_create {
    use super::*;

    #[test]
    fn test_rejects_bad_arguments() {
        let mut k = kernel();
        assert_eq!(k.task_create(task_a, 64, "x", 32), Err(OsError::PrioInvalid));
        assert_eq!(k.task_create(task_a, 8, "x", 3), Err(OsError::StkSizeInvalid));
        assert_eq!(k.task_count(), 1);
    }

    #[test]
    fn test_stack_pool_exhaustion() {
        let mut k = kernel();
        assert_eq!(
            k.task_create(task_a, CFG_STK_POOL_SIZE, "big", 3),
            Err(OsError::StkPoolEmpty)
        );
        // no TCB was consumed
        assert_eq!(k.task_count(), 1);
        assert!(!k.prio_table().is_set(3));
    }

    #[test]
    fn test_task_table_exhaustion() {
        let mut k = kernel();
        for _ in 1..CFG_TASK_MAX {
            k.task_create(task_a, 32, "t", 1).unwrap();
        }
        assert_eq!(k.task_count(), CFG_TASK_MAX);
        assert_eq!(k.task_create(task_a, 32, "t", 1), Err(OsError::TaskNoMoreTcb));
    }

    #[test]
    fn test_initial_frame() {
        let mut k = kernel();
        let a = k.task_create(task_a, 64, "a", 3).unwrap();

        let stack = k.task_stack(a);
        assert_eq!(stack.len(), 64);
        let sp = 64 - CONTEXT_STACK_SIZE;
        assert_eq!(k.tcb(a).stk_ptr as *const u32, stack[sp..].as_ptr());

        let frame = TaskFrame::from_words(&stack[sp..]).unwrap();
        assert_eq!(frame.pc, task_a as *const () as usize as u32 & !1);
        assert_eq!(
            frame.lr,
            kdrtos::port::task_exit_trap as *const () as usize as u32
        );
        assert_eq!(frame.xpsr, XPSR_T_BIT);
        assert_eq!(frame.r0, 0);
        assert_eq!(frame.r4, 0);
    }

    #[test]
    fn test_new_task_state() {
        let mut k = kernel();
        let a = k.task_create(task_a, 64, "a", 3).unwrap();
        let tcb = k.tcb(a);

        assert_eq!(tcb.owner, TaskOwner::Ready(3));
        assert_eq!(tcb.state(), OsTaskState::Ready);
        assert_eq!(tcb.dly_ticks, 0);
        assert_eq!(tcb.notify.state, NotifyState::None);
        assert!(k.prio_table().is_set(3));
    }
}

mod scheduling {
    use super::*;

    #[test]
    fn test_empty_ready_table_keeps_current() {
        // no idle task, so nothing is ready once `a` sleeps
        let mut k = Box::new(Kernel::new());
        let a = k.task_create(task_a, 64, "a", 3).unwrap();
        assert_eq!(k.start(), Ok(a));

        assert_eq!(k.os_delay(2), Ok(Pend::Blocked));
        assert!(k.prio_table().is_empty());
        assert_eq!(k.context_switch(), Some(a));
        assert_eq!(k.current(), Some(a));
        assert_eq!(k.tcb(a).state(), OsTaskState::Delayed);
    }

    #[test]
    fn test_round_robin_same_priority() {
        let mut k = kernel();
        let a = k.task_create(task_a, 64, "a", 3).unwrap();
        let b = k.task_create(task_b, 64, "b", 3).unwrap();

        assert_eq!(k.start(), Ok(a));
        assert_eq!(k.context_switch(), Some(b));
        assert_eq!(k.context_switch(), Some(a));
        assert_eq!(k.context_switch(), Some(b));
        assert_eq!(k.next(), Some(b));
    }

    #[test]
    fn test_highest_ready_wins() {
        let mut k = kernel();
        k.task_create(task_a, 64, "two", 2).unwrap();
        let five = k.task_create(task_b, 64, "five", 5).unwrap();

        assert_eq!(k.prio_table().get_highest(), 5);
        assert_eq!(k.start(), Ok(five));
        assert_eq!(k.context_switch(), Some(five));
    }

    #[test]
    fn test_tick_requests_rotation() {
        let mut k = kernel();
        let a = k.task_create(task_a, 64, "a", 3).unwrap();
        let b = k.task_create(task_b, 64, "b", 3).unwrap();
        k.start().unwrap();

        k.tick();
        assert!(k.is_switch_pending());
        assert_eq!(k.context_switch(), Some(b));
        k.tick();
        assert_eq!(k.context_switch(), Some(a));
        assert_eq!(k.tick_get(), 2);
    }
}

mod sched_lock {
    use super::*;

    #[test]
    fn test_locked_tick_defers_switch() {
        let (mut k, _a) = running_with(3);
        k.sched_lock().unwrap();

        k.tick();
        assert!(!k.is_switch_pending());
        assert_eq!(k.tick_get(), 1);

        k.sched_unlock().unwrap();
        assert!(k.is_switch_pending());
    }

    #[test]
    fn test_unlock_to_zero_always_requests() {
        let (mut k, _a) = running_with(3);

        k.sched_lock().unwrap();
        k.sched_lock().unwrap();
        k.sched_unlock().unwrap();
        assert!(!k.is_switch_pending());
        assert_eq!(k.sched_lock_nesting(), 1);

        k.sched_unlock().unwrap();
        assert!(k.is_switch_pending());
        assert_eq!(k.sched_lock_nesting(), 0);
    }

    #[test]
    fn test_unlock_when_not_locked() {
        let (mut k, _a) = running_with(3);
        assert_eq!(k.sched_unlock(), Err(OsError::SchedNotLocked));
        assert_eq!(k.sched_lock_nesting(), 0);
        assert!(!k.is_switch_pending());
    }

    #[test]
    fn test_nesting_overflow() {
        let (mut k, _a) = running_with(3);
        for _ in 0..u8::MAX {
            k.sched_lock().unwrap();
        }
        assert_eq!(k.sched_lock(), Err(OsError::LockNestingOvf));
        assert_eq!(k.sched_lock_nesting(), u8::MAX);
    }

    #[test]
    #[cfg(all(feature = "sem", feature = "mbox", feature = "notify"))]
    fn test_blocking_refused_while_locked() {
        let (mut k, a) = running_with(3);
        let sem = k.sem_create(0).unwrap();
        let mbox = k.mbox_create().unwrap();
        k.sched_lock().unwrap();

        assert_eq!(k.sem_take(sem), Err(OsError::SchedLocked));
        assert_eq!(k.mbox_fetch(mbox), Err(OsError::SchedLocked));
        assert_eq!(k.task_wait_notify(), Err(OsError::SchedLocked));
        assert_eq!(k.os_delay(5), Err(OsError::SchedLocked));

        // nothing moved
        assert_eq!(k.tcb(a).owner, TaskOwner::Ready(3));
        assert_eq!(k.tcb(a).notify.state, NotifyState::None);
    }

    #[test]
    fn test_blocking_before_start() {
        let mut k = kernel();
        assert_eq!(k.os_delay(1), Err(OsError::OsNotRunning));
    }
}

mod delay {
    use super::*;

    #[test]
    fn test_delay_exactly_n_ticks() {
        let (mut k, a) = running_with(3);

        assert_eq!(k.os_delay(3), Ok(Pend::Blocked));
        assert!(k.is_switch_pending());
        assert_eq!(k.tcb(a).state(), OsTaskState::Delayed);
        assert!(!k.prio_table().is_set(3));
        assert_eq!(k.delayed_tasks().collect::<Vec<_>>(), vec![a]);
        assert_eq!(k.context_switch(), Some(idle(&k)));

        k.tick();
        k.tick();
        assert!(k.tcb(a).is_delayed());

        k.tick();
        assert!(k.tcb(a).is_ready());
        assert!(k.delayed_list().is_empty());
        assert_eq!(k.context_switch(), Some(a));
    }

    #[test]
    fn test_zero_delay_is_noop() {
        let (mut k, a) = running_with(3);
        assert_eq!(k.os_delay(0), Ok(Pend::Ready(())));
        assert!(k.tcb(a).is_ready());
        assert!(!k.is_switch_pending());
    }

    #[test]
    fn test_reaper_wakes_all_due_in_one_pass() {
        let mut k = kernel();
        let a = k.task_create(task_a, 64, "a", 3).unwrap();
        let b = k.task_create(task_b, 64, "b", 3).unwrap();
        k.start().unwrap();

        k.os_delay(1).unwrap();
        assert_eq!(k.context_switch(), Some(b));
        k.os_delay(2).unwrap();
        k.context_switch();

        k.tick();
        assert!(k.tcb(a).is_ready());
        assert!(k.tcb(b).is_delayed());
        assert_eq!(k.tcb(b).dly_ticks, 1);
        assert_eq!(k.delayed_list().count(), 1);

        k.tick();
        assert_eq!(k.ready_tasks(3).collect::<Vec<_>>(), vec![a, b]);
        assert!(k.delayed_list().is_empty());
    }
}

#[cfg(feature = "sem")]
mod semaphore {
    use super::*;

    #[test]
    fn test_take_give_sequence() {
        let (mut k, a) = running_with(3);
        let sem = k.sem_create(0).unwrap();

        assert_eq!(k.sem_take(sem), Ok(Pend::Blocked));
        assert_eq!(k.tcb(a).state(), OsTaskState::SemWait);
        assert!(!k.prio_table().is_set(3));
        assert_eq!(k.sem_waiters(sem).collect::<Vec<_>>(), vec![a]);
        assert_eq!(k.context_switch(), Some(idle(&k)));

        k.sem_give(sem).unwrap();
        assert!(k.tcb(a).is_ready());
        assert!(k.is_switch_pending());
        assert_eq!(
            k.sem_get_info(sem),
            Ok(SemInfo {
                available: 0,
                waiting: 0
            })
        );

        k.sem_give(sem).unwrap();
        assert_eq!(k.sem_get_info(sem).unwrap().available, 1);
    }

    #[test]
    fn test_fast_path_decrements() {
        let (mut k, a) = running_with(3);
        let sem = k.sem_create(2).unwrap();

        assert_eq!(k.sem_take(sem), Ok(Pend::Ready(())));
        assert_eq!(k.sem_take(sem), Ok(Pend::Ready(())));
        assert_eq!(k.sem_get_info(sem).unwrap().available, 0);
        assert!(k.tcb(a).is_ready());
    }

    #[test]
    fn test_waiters_wake_in_arrival_order() {
        let (mut k, low) = running_with(2);
        let sem = k.sem_create(0).unwrap();

        k.sem_take(sem).unwrap();
        k.context_switch();

        let high = k.task_create(task_b, 64, "high", 5).unwrap();
        assert_eq!(k.context_switch(), Some(high));
        k.sem_take(sem).unwrap();
        k.context_switch();

        assert_eq!(k.sem_waiters(sem).collect::<Vec<_>>(), vec![low, high]);

        k.sem_give(sem).unwrap();
        assert!(k.tcb(low).is_ready());
        assert_eq!(k.tcb(high).state(), OsTaskState::SemWait);
    }

    #[test]
    fn test_give_binary_clamps() {
        let mut k = kernel();
        let sem = k.sem_create(0).unwrap();
        k.sem_give_binary(sem).unwrap();
        k.sem_give_binary(sem).unwrap();
        assert_eq!(k.sem_get_info(sem).unwrap().available, 1);
    }

    #[test]
    fn test_delete_leaves_waiters_asleep() {
        let (mut k, a) = running_with(3);
        let sem = k.sem_create(0).unwrap();
        k.sem_take(sem).unwrap();
        k.context_switch();

        k.sem_delete(sem).unwrap();
        assert_eq!(k.tcb(a).state(), OsTaskState::Orphaned);
        assert!(!k.prio_table().is_set(3));
        assert_eq!(k.sem_get_info(sem), Err(OsError::ObjDel));
        assert_eq!(k.sem_give(sem), Err(OsError::ObjDel));

        // the slot is reusable, under a new handle
        let again = k.sem_create(1).unwrap();
        assert_eq!(again.index(), sem.index());
        assert_ne!(again, sem);
    }

    #[test]
    fn test_stale_handle_misses_reused_slot() {
        let (mut k, a) = running_with(3);
        let old = k.sem_create(0).unwrap();
        k.sem_delete(old).unwrap();
        let new = k.sem_create(1).unwrap();
        assert_eq!(new.index(), old.index());

        assert_eq!(k.sem_give(old), Err(OsError::ObjDel));
        assert_eq!(k.sem_take(old), Err(OsError::ObjDel));
        assert_eq!(k.sem_get_info(old), Err(OsError::ObjDel));
        assert_eq!(k.sem_waiters(old).count(), 0);
        assert!(k.tcb(a).is_ready());

        // the new semaphore is untouched
        assert_eq!(
            k.sem_get_info(new),
            Ok(SemInfo { available: 1, waiting: 0 })
        );
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut k = kernel();
        for _ in 0..CFG_SEM_MAX {
            k.sem_create(0).unwrap();
        }
        assert_eq!(k.sem_create(0), Err(OsError::MemNoFreeBlks));
    }
}

#[cfg(feature = "mbox")]
mod mailbox {
    use super::*;

    fn msg(v: usize) -> *const () {
        v as *const ()
    }

    #[test]
    fn test_post_then_fetch() {
        let (mut k, _a) = running_with(3);
        let mbox = k.mbox_create().unwrap();

        k.mbox_post(mbox, msg(0x10)).unwrap();
        assert_eq!(k.mbox_is_full(mbox), Ok(true));
        assert_eq!(k.mbox_fetch(mbox), Ok(Pend::Ready(msg(0x10))));
        assert_eq!(k.mbox_is_full(mbox), Ok(false));
    }

    #[test]
    fn test_fetch_blocks_until_post() {
        let (mut k, a) = running_with(3);
        let mbox = k.mbox_create().unwrap();

        assert_eq!(k.mbox_fetch(mbox), Ok(Pend::Blocked));
        assert_eq!(k.tcb(a).state(), OsTaskState::MboxWait);
        assert_eq!(k.context_switch(), Some(idle(&k)));

        k.mbox_post(mbox, msg(0x20)).unwrap();
        assert!(k.tcb(a).is_ready());
        assert_eq!(k.mbox_waiters(mbox).count(), 0);
        assert_eq!(k.context_switch(), Some(a));

        // the woken task fetches again
        assert_eq!(k.mbox_fetch(mbox), Ok(Pend::Ready(msg(0x20))));
    }

    #[test]
    fn test_last_write_wins() {
        let (mut k, _a) = running_with(3);
        let mbox = k.mbox_create().unwrap();

        k.mbox_post(mbox, msg(1)).unwrap();
        k.mbox_post(mbox, msg(2)).unwrap();
        assert_eq!(k.mbox_fetch(mbox), Ok(Pend::Ready(msg(2))));
        assert_eq!(k.mbox_fetch(mbox), Ok(Pend::Blocked));
    }

    #[test]
    fn test_delete_readies_all_waiters() {
        let mut k = kernel();
        let a = k.task_create(task_a, 64, "a", 3).unwrap();
        let b = k.task_create(task_b, 64, "b", 4).unwrap();
        let mbox = k.mbox_create().unwrap();

        assert_eq!(k.start(), Ok(b));
        k.mbox_fetch(mbox).unwrap();
        assert_eq!(k.context_switch(), Some(a));
        k.mbox_fetch(mbox).unwrap();
        k.context_switch();
        assert_eq!(k.mbox_waiters(mbox).collect::<Vec<_>>(), vec![b, a]);

        k.mbox_delete(mbox).unwrap();
        assert!(k.tcb(a).is_ready());
        assert!(k.tcb(b).is_ready());
        assert!(k.is_switch_pending());

        assert_eq!(k.context_switch(), Some(b));
        assert_eq!(k.mbox_fetch(mbox), Err(OsError::ObjDel));
        assert_eq!(k.mbox_post(mbox, msg(1)), Err(OsError::ObjDel));
    }

    #[test]
    fn test_woken_waiter_sees_delete_after_slot_reuse() {
        let (mut k, a) = running_with(3);
        let old = k.mbox_create().unwrap();

        assert_eq!(k.mbox_fetch(old), Ok(Pend::Blocked));
        assert_eq!(k.context_switch(), Some(idle(&k)));

        k.mbox_delete(old).unwrap();
        let new = k.mbox_create().unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert_eq!(k.context_switch(), Some(a));

        // the retry reports the delete instead of queueing on the new mailbox
        assert_eq!(k.mbox_fetch(old), Err(OsError::ObjDel));
        assert!(k.tcb(a).is_ready());
        assert_eq!(k.mbox_waiters(new).count(), 0);
        assert_eq!(k.mbox_is_full(old), Err(OsError::ObjDel));
        assert_eq!(k.mbox_is_full(new), Ok(false));
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut k = kernel();
        for _ in 0..CFG_MBOX_MAX {
            k.mbox_create().unwrap();
        }
        assert_eq!(k.mbox_create(), Err(OsError::MemNoFreeBlks));
    }
}

#[cfg(feature = "notify")]
mod notification {
    use super::*;

    #[test]
    fn test_notify_wakes_waiter() {
        let (mut k, t) = running_with(3);

        assert_eq!(k.task_wait_notify(), Ok(Pend::Blocked));
        assert_eq!(k.tcb(t).state(), OsTaskState::NotifyWait);
        assert_eq!(k.tcb(t).owner, TaskOwner::Detached);
        assert!(!k.prio_table().is_set(3));
        assert_eq!(k.context_switch(), Some(idle(&k)));

        k.task_notify(t, 7).unwrap();
        assert!(k.tcb(t).is_ready());
        assert!(k.is_switch_pending());
        assert_eq!(k.context_switch(), Some(t));

        assert_eq!(k.task_wait_notify(), Ok(Pend::Ready(7)));
        assert_eq!(k.tcb(t).notify.state, NotifyState::None);
    }

    #[test]
    fn test_unconsumed_value_is_overwritten() {
        let (mut k, t) = running_with(3);

        k.task_notify(t, 5).unwrap();
        k.task_notify(t, 9).unwrap();
        assert_eq!(k.tcb(t).notify.state, NotifyState::Pending);
        assert!(!k.is_switch_pending());

        assert_eq!(k.task_wait_notify(), Ok(Pend::Ready(9)));
        assert_eq!(k.task_wait_notify(), Ok(Pend::Blocked));
    }

    #[test]
    fn test_unknown_target() {
        let mut other = kernel();
        other.task_create(task_a, 32, "x", 1).unwrap();
        let foreign = other.task_create(task_a, 32, "y", 1).unwrap();

        let mut k = kernel();
        assert_eq!(k.task_notify(foreign, 1), Err(OsError::TaskInvalid));
    }
}
