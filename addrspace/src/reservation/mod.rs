#[cfg(target_family = "unix")]
mod unix;
#[cfg(target_family = "windows")]
mod windows;

#[cfg(target_family = "unix")]
pub(crate) use self::unix::*;

#[cfg(target_family = "windows")]
pub(crate) use self::windows::*;

use std::ptr::NonNull;

use crate::registry::{self, Registration};
use crate::utils::{install_fault_handler, page_size, round_to_pages};
use crate::{CommitStrategy, ReserveError, TrapMode};

#[cfg(not(target_family = "unix"))]
use crate::DEFAULT_COMMIT_PAGES;

/// Reserves `len` bytes of address space (rounded up to whole pages) without backing them.
///
/// The returned range must be given back with [`release_region`] using the same `len`.
pub fn reserve_region(len: usize, strategy: CommitStrategy) -> Result<NonNull<u8>, ReserveError> {
    if len == 0 {
        return Err(ReserveError::ZeroSize);
    }
    let len = round_to_pages(len).ok_or(ReserveError::TooLarge { len })?;

    let (trap, batch_pages) = match strategy {
        #[cfg(target_family = "unix")]
        CommitStrategy::DemandPaged => {
            let base = unsafe { reserve_demand_paged(len) }
                .map_err(|source| ReserveError::Os { len, source })?;
            tracing::debug!(base = ?base, len, "reserved demand paged region");
            return Ok(base);
        }
        // No native demand paging for reserved memory, trap every access instead.
        #[cfg(not(target_family = "unix"))]
        CommitStrategy::DemandPaged => (TrapMode::AnyAccess, DEFAULT_COMMIT_PAGES),
        CommitStrategy::OnFault { trap, batch_pages } => (trap, batch_pages),
    };

    install_fault_handler().map_err(ReserveError::HandlerInstall)?;
    let base = unsafe { reserve_inaccessible(len) }.map_err(|source| ReserveError::Os { len, source })?;

    let batch = batch_pages.max(1).saturating_mul(page_size());
    let guarded = trap == TrapMode::GuardPage;
    let committed = batch.min(len);
    if let Err(source) = unsafe { commit(base.as_ptr(), committed, guarded && committed < len) } {
        let _ = unsafe { release(base, len) };
        return Err(ReserveError::Os { len, source });
    }

    let registration = Registration {
        base: base.as_ptr() as usize,
        len,
        committed,
        batch,
        guarded,
    };
    if !registry::register(registration) {
        let _ = unsafe { release(base, len) };
        tracing::warn!(len, "fault handler region table is full");
        return Err(ReserveError::RegistryFull);
    }

    tracing::debug!(base = ?base, len, ?trap, batch, "reserved fault committed region");
    Ok(base)
}

/// Returns a range obtained from [`reserve_region`] to the OS.
///
/// # Safety
///
/// `base` and `len` must come from a single successful [`reserve_region`] call, the range must
/// not have been released already and nothing may access it afterwards.
pub unsafe fn release_region(base: NonNull<u8>, len: usize) {
    registry::unregister(base.as_ptr() as usize);
    let len = round_to_pages(len).unwrap_or(len);
    let result = release(base, len);
    debug_assert!(result.is_ok(), "failed to release region: {:?}", result);
    tracing::debug!(base = ?base, len, "released region");
}

/// An owned reservation. The range is released when this is dropped.
#[derive(Debug)]
pub struct Reservation {
    base: NonNull<u8>,
    len: usize,
    strategy: CommitStrategy,
}

unsafe impl Send for Reservation {}

impl Reservation {
    /// Reserves at least `len` bytes of address space.
    pub fn new(len: usize, strategy: CommitStrategy) -> Result<Self, ReserveError> {
        let base = reserve_region(len, strategy)?;
        // Can't overflow, `reserve_region` already rounded successfully.
        let len = round_to_pages(len).unwrap_or(len);
        Ok(Self { base, len, strategy })
    }

    /// Returns a pointer to the first byte of the range.
    pub fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    /// Returns a pointer one past the last byte of the range.
    pub fn end(&self) -> *mut u8 {
        unsafe { self.base.as_ptr().add(self.len) }
    }

    /// Length of the range in bytes, always a multiple of the page size.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn strategy(&self) -> CommitStrategy {
        self.strategy
    }

    /// Returns true if `addr` points inside the range.
    pub fn contains(&self, addr: *const u8) -> bool {
        self.base.as_ptr() as *const u8 <= addr && addr < self.end() as *const u8
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        unsafe { release_region(self.base, self.len) };
    }
}
