//! Single-slot mailbox
//!
//! Holds at most one message. Posting always succeeds and overwrites an
//! unread message; a fetch on an empty mailbox queues the caller.

use crate::config::CFG_MBOX_MAX;
use crate::critical::is_isr_context;
use crate::error::{OsError, OsResult};
use crate::kernel::{with_kernel, Kernel};
use crate::list::OsList;
use crate::pool::ObjPool;
use crate::types::{MboxId, OsMsg, Pend, TaskId, TaskOwner};

pub struct OsMbox {
    pub(crate) msg: OsMsg,
    pub(crate) full: bool,
    /// Tasks waiting for a message, oldest first
    pub(crate) wait_list: OsList,
}

impl OsMbox {
    pub const fn new() -> Self {
        OsMbox {
            msg: core::ptr::null(),
            full: false,
            wait_list: OsList::new(),
        }
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.full
    }
}

impl Default for OsMbox {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_mut(mboxes: &mut ObjPool<OsMbox, CFG_MBOX_MAX>, id: MboxId) -> OsResult<&mut OsMbox> {
    mboxes
        .get_mut(id.index(), id.generation())
        .ok_or(OsError::ObjDel)
}

impl Kernel {
    pub fn mbox_create(&mut self) -> OsResult<MboxId> {
        let (idx, generation) = self
            .mboxes
            .alloc(OsMbox::new())
            .ok_or(OsError::MemNoFreeBlks)?;
        Ok(MboxId::new(idx, generation))
    }

    /// Store a message, replacing any unread one, and wake the oldest waiter
    pub fn mbox_post(&mut self, id: MboxId, msg: OsMsg) -> OsResult<()> {
        let mbox = slot_mut(&mut self.mboxes, id)?;
        mbox.msg = msg;
        mbox.full = true;

        if let Some(waiter) = mbox.wait_list.pop_head(&mut self.tasks) {
            self.tasks[waiter].owner = TaskOwner::Detached;
            self.make_ready(waiter);
            self.resched();
        }
        Ok(())
    }

    /// Take the message, or queue the current task
    ///
    /// A woken task is not handed the message; it must fetch again.
    pub fn mbox_fetch(&mut self, id: MboxId) -> OsResult<Pend<OsMsg>> {
        let cur = self.pend_guard()?;

        let mbox = slot_mut(&mut self.mboxes, id)?;
        if mbox.full {
            mbox.full = false;
            return Ok(Pend::Ready(mbox.msg));
        }

        self.detach(cur);
        slot_mut(&mut self.mboxes, id)?
            .wait_list
            .insert_end(&mut self.tasks, cur);
        self.tasks[cur].owner = TaskOwner::MboxWait(id);

        self.request_switch();
        Ok(Pend::Blocked)
    }

    /// Ready every waiter, then free the slot
    ///
    /// Woken waiters get `Err(OsError::ObjDel)` from their next fetch, even
    /// if a new mailbox has taken the slot by then.
    pub fn mbox_delete(&mut self, id: MboxId) -> OsResult<()> {
        let mbox = slot_mut(&mut self.mboxes, id)?;
        let mut woken = 0;
        while let Some(waiter) = mbox.wait_list.pop_head(&mut self.tasks) {
            let tcb = &mut self.tasks[waiter];
            tcb.owner = TaskOwner::Detached;
            let prio = tcb.prio;
            self.rdy.insert(&mut self.tasks, waiter, prio);
            self.tasks[waiter].owner = TaskOwner::Ready(prio);
            woken += 1;
        }
        self.mboxes.free(id.index(), id.generation());

        crate::debug!("mailbox {} deleted, {} waiters readied", id.index(), woken);

        self.resched();
        Ok(())
    }

    /// Waiters of a mailbox, oldest first
    pub fn mbox_waiters(&self, id: MboxId) -> impl Iterator<Item = TaskId> + '_ {
        self.mboxes
            .get(id.index(), id.generation())
            .map(|m| m.wait_list)
            .unwrap_or_default()
            .iter(&self.tasks)
    }

    pub fn mbox_is_full(&self, id: MboxId) -> OsResult<bool> {
        self.mboxes
            .get(id.index(), id.generation())
            .map(OsMbox::is_full)
            .ok_or(OsError::ObjDel)
    }
}

const _: () = assert!(CFG_MBOX_MAX <= u8::MAX as usize);

// ============ Global API ============

pub fn mbox_create() -> OsResult<MboxId> {
    if is_isr_context() {
        return Err(OsError::CreateIsr);
    }
    with_kernel(|k| k.mbox_create())
}

/// Post a message; safe from interrupt handlers
pub fn mbox_post(id: MboxId, msg: OsMsg) -> OsResult<()> {
    with_kernel(|k| k.mbox_post(id, msg))
}

/// Wait for a message
///
/// Each wakeup re-checks the slot, so a message taken by someone else in
/// between simply puts the caller back to sleep.
pub fn mbox_fetch(id: MboxId) -> OsResult<OsMsg> {
    loop {
        if let Pend::Ready(msg) = with_kernel(|k| k.mbox_fetch(id))? {
            return Ok(msg);
        }
    }
}

pub fn mbox_delete(id: MboxId) -> OsResult<()> {
    if is_isr_context() {
        return Err(OsError::DelIsr);
    }
    with_kernel(|k| k.mbox_delete(id))
}
