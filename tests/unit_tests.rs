//! Unit tests for core RTOS modules
//!
//! These tests run on the host (not embedded target) to verify
//! the core algorithms work correctly.

#[cfg(test)]
mod prio_tests {
    use kdrtos::config::CFG_PRIO_MAX;
    use kdrtos::prio::PrioTable;

    #[test]
    fn test_empty_table() {
        let table = PrioTable::new();
        assert!(table.is_empty());
        assert_eq!(table.get_highest(), 0);
    }

    #[test]
    fn test_single_priority() {
        let mut table = PrioTable::new();

        table.insert(5);
        assert!(!table.is_empty());
        assert!(table.is_set(5));
        assert!(!table.is_set(4));
        assert_eq!(table.get_highest(), 5);

        table.remove(5);
        assert!(table.is_empty());
    }

    #[test]
    fn test_multiple_priorities() {
        let mut table = PrioTable::new();

        // Insert in random order
        table.insert(20);
        table.insert(5);
        table.insert(0);
        table.insert(15);

        // Highest number wins
        assert_eq!(table.get_highest(), 20);

        table.remove(20);
        assert_eq!(table.get_highest(), 15);

        table.remove(15);
        assert_eq!(table.get_highest(), 5);

        table.remove(5);
        assert_eq!(table.get_highest(), 0);
        assert!(table.is_set(0));
    }

    #[test]
    fn test_highest_of_0_2_5() {
        let mut table = PrioTable::new();
        table.insert(0);
        table.insert(2);
        table.insert(5);
        assert_eq!(table.get_highest(), 5);
    }

    #[test]
    fn test_all_priorities() {
        let mut table = PrioTable::new();

        for i in 0..CFG_PRIO_MAX {
            table.insert(i as u8);
        }
        assert_eq!(table.bits(), u32::MAX);

        // Remove from most to least urgent
        for i in (0..CFG_PRIO_MAX).rev() {
            assert_eq!(table.get_highest(), i as u8);
            table.remove(i as u8);
        }

        assert!(table.is_empty());
    }

    #[test]
    fn test_insert_remove_leaves_others() {
        let mut table = PrioTable::new();
        table.insert(3);
        table.insert(17);
        let before = table.bits();

        table.insert(9);
        table.remove(9);
        assert_eq!(table.bits(), before);
    }

    #[test]
    fn test_out_of_range_saturates() {
        let mut table = PrioTable::new();

        table.insert(40);
        assert!(table.is_set(31));
        assert_eq!(table.get_highest(), 31);

        table.remove(200);
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_insert_remove() {
        let mut table = PrioTable::new();

        // The bitmap keeps no per-priority count
        table.insert(10);
        table.insert(10);
        table.remove(10);
        assert!(!table.is_set(10));
    }
}

#[cfg(test)]
mod error_tests {
    use kdrtos::error::OsError;

    #[test]
    fn test_error_variants() {
        assert_eq!(OsError::ObjDel, OsError::ObjDel);
        assert_ne!(OsError::ObjDel, OsError::SchedLocked);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(OsError::ObjDel.code(), 24002);
        assert_eq!(OsError::PendIsr.code(), 25006);
        assert_eq!(OsError::SchedLocked.code(), 28003);
        assert_eq!(OsError::TaskNoMoreTcb.code(), 29008);
    }

    #[test]
    fn test_error_debug() {
        let err = OsError::PendIsr;
        assert_eq!(format!("{:?}", err), "PendIsr");
    }
}

#[cfg(test)]
mod types_tests {
    use kdrtos::types::*;

    #[test]
    fn test_task_state_enum() {
        let state = OsTaskState::Ready;
        assert_eq!(state, OsTaskState::Ready);
        assert_ne!(state, OsTaskState::Delayed);
    }

    #[test]
    fn test_pend_outcome() {
        let ready: Pend<u32> = Pend::Ready(3);
        assert!(!ready.is_blocked());
        assert!(Pend::<u32>::Blocked.is_blocked());
    }

    #[test]
    fn test_notify_state_enum() {
        assert_eq!(NotifyState::None as u8, 0);
        assert_eq!(NotifyState::Pending as u8, 1);
        assert_eq!(NotifyState::Waiting as u8, 2);
    }
}

#[cfg(test)]
mod config_tests {
    use kdrtos::config::*;

    #[test]
    fn test_config_values() {
        assert_eq!(CFG_PRIO_MAX, 32, "one bitmap word");

        assert!(CFG_STK_SIZE_MIN >= 16, "Stack cannot hold a frame");
        assert!(CFG_IDLE_STK_SIZE >= CFG_STK_SIZE_MIN);

        assert!(CFG_TICK_RATE_HZ >= 10, "Tick rate too slow");
        assert!(CFG_TICK_RATE_HZ <= 10000, "Tick rate too fast");

        // Idle priority should be lowest
        assert_eq!(CFG_PRIO_IDLE, 0);

        assert_eq!(CFG_CYCLES_PER_TICK * CFG_TICK_RATE_HZ, CFG_CPU_CLOCK_HZ);
    }
}
