//! Semaphore implementation
//!
//! Counting semaphores for task synchronization and resource counting.
//! Waiters are woken strictly in arrival order, whatever their priority.

use crate::config::CFG_SEM_MAX;
use crate::critical::is_isr_context;
use crate::error::{OsError, OsResult};
use crate::kernel::{with_kernel, Kernel};
use crate::list::OsList;
use crate::pool::ObjPool;
use crate::types::{OsSemCtr, Pend, SemId, SemInfo, TaskId, TaskOwner};

/// Counting semaphore
pub struct OsSem {
    /// Current count
    pub(crate) ctr: OsSemCtr,
    /// Tasks waiting on this semaphore, oldest first
    pub(crate) wait_list: OsList,
}

impl OsSem {
    pub const fn new(ctr: OsSemCtr) -> Self {
        OsSem {
            ctr,
            wait_list: OsList::new(),
        }
    }

    #[inline(always)]
    pub fn count(&self) -> OsSemCtr {
        self.ctr
    }
}

/// Live semaphore behind a handle, borrowing only the pool
fn slot_mut(sems: &mut ObjPool<OsSem, CFG_SEM_MAX>, id: SemId) -> OsResult<&mut OsSem> {
    sems.get_mut(id.index(), id.generation())
        .ok_or(OsError::ObjDel)
}

impl Kernel {
    /// Create a semaphore with an initial count
    pub fn sem_create(&mut self, init: OsSemCtr) -> OsResult<SemId> {
        let (idx, generation) = self
            .sems
            .alloc(OsSem::new(init))
            .ok_or(OsError::MemNoFreeBlks)?;
        Ok(SemId::new(idx, generation))
    }

    /// Take one unit, or queue the current task
    ///
    /// # Returns
    /// * `Ok(Pend::Ready(()))` - A unit was taken
    /// * `Ok(Pend::Blocked)` - Caller is on the wait list; a switch is pending
    /// * `Err(OsError::SchedLocked)` - Scheduler is locked
    pub fn sem_take(&mut self, id: SemId) -> OsResult<Pend<()>> {
        let cur = self.pend_guard()?;

        let sem = slot_mut(&mut self.sems, id)?;
        if sem.ctr > 0 {
            sem.ctr -= 1;
            return Ok(Pend::Ready(()));
        }

        self.detach(cur);
        slot_mut(&mut self.sems, id)?
            .wait_list
            .insert_end(&mut self.tasks, cur);
        self.tasks[cur].owner = TaskOwner::SemWait(id);

        self.request_switch();
        Ok(Pend::Blocked)
    }

    /// Release one unit
    ///
    /// A waiter, if any, receives the unit directly and the count stays put.
    pub fn sem_give(&mut self, id: SemId) -> OsResult<()> {
        let sem = slot_mut(&mut self.sems, id)?;
        let Some(waiter) = sem.wait_list.pop_head(&mut self.tasks) else {
            sem.ctr = sem.ctr.saturating_add(1);
            return Ok(());
        };

        self.tasks[waiter].owner = TaskOwner::Detached;
        self.make_ready(waiter);
        self.resched();
        Ok(())
    }

    /// Release with the count clamped to 1
    pub fn sem_give_binary(&mut self, id: SemId) -> OsResult<()> {
        let sem = slot_mut(&mut self.sems, id)?;
        if sem.wait_list.is_empty() && sem.ctr >= 1 {
            return Ok(());
        }
        self.sem_give(id)
    }

    /// Free the slot
    ///
    /// Queued waiters are not readied. They are unlinked and left asleep with
    /// nothing that can wake them.
    pub fn sem_delete(&mut self, id: SemId) -> OsResult<()> {
        let sem = slot_mut(&mut self.sems, id)?;
        let orphaned = sem.wait_list.count();
        while let Some(waiter) = sem.wait_list.pop_head(&mut self.tasks) {
            self.tasks[waiter].owner = TaskOwner::Detached;
        }
        if orphaned > 0 {
            crate::warn!("semaphore {} deleted with {} waiters", id.index(), orphaned);
        }
        self.sems.free(id.index(), id.generation());
        Ok(())
    }

    pub fn sem_get_info(&self, id: SemId) -> OsResult<SemInfo> {
        let sem = self
            .sems
            .get(id.index(), id.generation())
            .ok_or(OsError::ObjDel)?;
        Ok(SemInfo {
            available: sem.ctr,
            waiting: sem.wait_list.count(),
        })
    }

    /// Waiters of a semaphore, oldest first
    pub fn sem_waiters(&self, id: SemId) -> impl Iterator<Item = TaskId> + '_ {
        self.sems
            .get(id.index(), id.generation())
            .map(|s| s.wait_list)
            .unwrap_or_default()
            .iter(&self.tasks)
    }
}

const _: () = assert!(CFG_SEM_MAX <= u8::MAX as usize);

// ============ Global API ============

/// Create a semaphore
pub fn sem_create(init: OsSemCtr) -> OsResult<SemId> {
    if is_isr_context() {
        return Err(OsError::CreateIsr);
    }
    with_kernel(|k| k.sem_create(init))
}

/// Wait on the semaphore
///
/// Blocks until a unit is available. The unit handed over by `sem_give`
/// is owned by the time the task runs again.
pub fn sem_take(id: SemId) -> OsResult<()> {
    // The switch runs as the critical section closes; a blocked caller
    // resumes here already holding the unit sem_give passed on.
    with_kernel(|k| k.sem_take(id)).map(|_| ())
}

/// Signal the semaphore
pub fn sem_give(id: SemId) -> OsResult<()> {
    with_kernel(|k| k.sem_give(id))
}

/// Signal the semaphore, never raising the count above 1
pub fn sem_give_binary(id: SemId) -> OsResult<()> {
    with_kernel(|k| k.sem_give_binary(id))
}

/// Delete the semaphore
pub fn sem_delete(id: SemId) -> OsResult<()> {
    if is_isr_context() {
        return Err(OsError::DelIsr);
    }
    with_kernel(|k| k.sem_delete(id))
}

pub fn sem_get_info(id: SemId) -> OsResult<SemInfo> {
    with_kernel(|k| k.sem_get_info(id))
}
