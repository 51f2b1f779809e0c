//! Table of the regions the fault handler is allowed to commit.
//!
//! The handler runs inside a signal (or a vectored exception) handler, so the table is a fixed
//! array of atomics: no locks and no allocation on the read side.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use crate::reservation::commit;
use crate::utils::page_size;

pub(crate) const MAX_REGIONS: usize = 4096;

const FREE: u8 = 0;
const CLAIMED: u8 = 1;
const LIVE: u8 = 2;

struct Entry {
    state: AtomicU8,
    base: AtomicUsize,
    len: AtomicUsize,
    // End of the committed prefix. Only maintained for guard page regions.
    frontier: AtomicUsize,
    batch: AtomicUsize,
    guarded: AtomicBool,
}

#[allow(clippy::declare_interior_mutable_const)]
const VACANT: Entry = Entry {
    state: AtomicU8::new(FREE),
    base: AtomicUsize::new(0),
    len: AtomicUsize::new(0),
    frontier: AtomicUsize::new(0),
    batch: AtomicUsize::new(0),
    guarded: AtomicBool::new(false),
};

static REGIONS: [Entry; MAX_REGIONS] = [VACANT; MAX_REGIONS];

// One past the highest entry ever claimed, so lookups don't scan the whole table.
static HIGH_WATER: AtomicUsize = AtomicUsize::new(0);

/// Describes a freshly reserved region to the fault handler.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Registration {
    pub(crate) base: usize,
    pub(crate) len: usize,
    pub(crate) committed: usize,
    pub(crate) batch: usize,
    pub(crate) guarded: bool,
}

/// Publishes a region. Returns `false` if the table is full.
pub(crate) fn register(region: Registration) -> bool {
    for (index, entry) in REGIONS.iter().enumerate() {
        if entry
            .state
            .compare_exchange(FREE, CLAIMED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            continue;
        }
        entry.base.store(region.base, Ordering::Relaxed);
        entry.len.store(region.len, Ordering::Relaxed);
        entry.frontier.store(region.base + region.committed, Ordering::Relaxed);
        entry.batch.store(region.batch, Ordering::Relaxed);
        entry.guarded.store(region.guarded, Ordering::Relaxed);
        HIGH_WATER.fetch_max(index + 1, Ordering::AcqRel);
        entry.state.store(LIVE, Ordering::Release);
        return true;
    }
    false
}

/// Withdraws the region starting at `base`. Unknown bases are ignored, demand paged regions are
/// never registered.
pub(crate) fn unregister(base: usize) {
    let scanned = HIGH_WATER.load(Ordering::Acquire);
    for entry in &REGIONS[..scanned] {
        if entry.state.load(Ordering::Acquire) == LIVE && entry.base.load(Ordering::Relaxed) == base {
            entry.state.store(CLAIMED, Ordering::Release);
            entry.base.store(0, Ordering::Relaxed);
            entry.len.store(0, Ordering::Relaxed);
            entry.state.store(FREE, Ordering::Release);
            return;
        }
    }
}

/// Decides whether a fault at `addr` is ours and, if so, commits the batch that makes the
/// faulting access succeed. Faults outside every registered region are declined.
pub(crate) fn commit_on_fault(addr: usize) -> bool {
    let page_size = page_size();
    let scanned = HIGH_WATER.load(Ordering::Acquire);
    for entry in &REGIONS[..scanned] {
        if entry.state.load(Ordering::Acquire) != LIVE {
            continue;
        }
        let base = entry.base.load(Ordering::Relaxed);
        let end = base + entry.len.load(Ordering::Relaxed);
        if addr < base || addr >= end {
            continue;
        }

        let batch = entry.batch.load(Ordering::Relaxed);
        if entry.guarded.load(Ordering::Relaxed) {
            let frontier = entry.frontier.load(Ordering::Acquire);
            if addr < frontier || addr >= frontier + page_size {
                return false;
            }
            let len = batch.min(end - frontier);
            let guard_after = frontier + len < end;
            if unsafe { commit(frontier as *mut u8, len, guard_after) }.is_err() {
                return false;
            }
            entry.frontier.store(frontier + len, Ordering::Release);
            return true;
        }

        let page_start = addr & !(page_size - 1);
        let len = batch.min(end - page_start);
        return unsafe { commit(page_start as *mut u8, len, false) }.is_ok();
    }
    false
}
