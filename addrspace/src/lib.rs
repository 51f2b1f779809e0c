//! Addrspace hands out huge, contiguous spans of virtual address space that only get backed by
//! physical memory once they are touched.
//!
//! Two backends sit behind the same [`Reservation`] type:
//! 1. [`CommitStrategy::DemandPaged`] reserves the range read/write without reserving backing
//!    store and lets the kernel fill in pages on first touch (Unix only).
//! 2. [`CommitStrategy::OnFault`] reserves the range inaccessible and commits it in batches from a
//!    process-wide fault handler. This is the only option on Windows, where reserved memory must
//!    be committed explicitly.
//!
//! ## Example
//! ```
//! use addrspace::{CommitStrategy, Reservation};
//!
//! fn main() {
//!     // 64 GB of address space, almost none of it backed.
//!     let region = Reservation::new(1 << 36, CommitStrategy::default()).unwrap();
//!     unsafe {
//!         *region.base().add(1 << 30) = 42;
//!         assert_eq!(*region.base().add(1 << 30), 42);
//!     }
//! }
//! ```

mod error;
mod registry;
pub mod reservation;
pub mod utils;

pub use error::ReserveError;
pub use reservation::{release_region, reserve_region, Reservation};
pub use utils::page_size;

/// Pages committed by a single fault. 1 MB with 4 KB pages, so the cost of a fault is spread over
/// many later accesses.
pub const DEFAULT_COMMIT_PAGES: usize = 256;

/// Which accesses to a fault-committed region are allowed to trigger a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapMode {
    /// Any access to an uncommitted page commits the batch starting at that page. Supports random
    /// access at the cost of one fault per untouched run of pages.
    AnyAccess,
    /// Only the page directly past the committed part is trapped and commits are made strictly
    /// forward. Cheap for purely increasing access, every other access is a real fault.
    GuardPage,
}

impl Default for TrapMode {
    fn default() -> Self {
        TrapMode::AnyAccess
    }
}

/// How a reserved range gets physically backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStrategy {
    /// Leave it to the kernel. Falls back to [`CommitStrategy::on_fault`] on platforms without
    /// native demand paging of reserved memory.
    DemandPaged,
    /// Commit `batch_pages` pages at a time from the fault handler.
    OnFault { trap: TrapMode, batch_pages: usize },
}

impl CommitStrategy {
    /// Fault driven commits with the default trap mode and batch size.
    pub const fn on_fault() -> Self {
        CommitStrategy::OnFault {
            trap: TrapMode::AnyAccess,
            batch_pages: DEFAULT_COMMIT_PAGES,
        }
    }
}

impl Default for CommitStrategy {
    #[cfg(target_family = "unix")]
    fn default() -> Self {
        CommitStrategy::DemandPaged
    }

    #[cfg(target_family = "windows")]
    fn default() -> Self {
        CommitStrategy::on_fault()
    }
}
