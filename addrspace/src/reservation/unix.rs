use libc::{mmap, mprotect, munmap};
use libc::{MAP_ANON, MAP_FAILED, MAP_NORESERVE, MAP_PRIVATE, PROT_NONE, PROT_READ, PROT_WRITE};
use std::io::Error;
use std::ptr::{self, NonNull};

/// Read/write mapping the kernel only backs when a page is first touched.
pub(crate) unsafe fn reserve_demand_paged(len: usize) -> Result<NonNull<u8>, Error> {
    map(len, PROT_READ | PROT_WRITE)
}

/// Mapping where every access faults until [`commit`] is called on the page.
pub(crate) unsafe fn reserve_inaccessible(len: usize) -> Result<NonNull<u8>, Error> {
    map(len, PROT_NONE)
}

unsafe fn map(len: usize, prot: libc::c_int) -> Result<NonNull<u8>, Error> {
    let ptr = mmap(
        ptr::null_mut(),
        len,
        prot,
        MAP_PRIVATE | MAP_ANON | MAP_NORESERVE,
        -1,
        0,
    );
    if ptr == MAP_FAILED {
        Err(Error::last_os_error())
    } else {
        Ok(NonNull::new_unchecked(ptr as *mut u8))
    }
}

/// Marks `len` bytes starting at `start` read/write. Called from the signal handler, so this must
/// stay async-signal-safe.
///
/// Every page past the committed part is still `PROT_NONE`, which is all a guard page needs to be
/// here, so `_guard_after` has nothing left to do.
pub(crate) unsafe fn commit(start: *mut u8, len: usize, _guard_after: bool) -> Result<(), Error> {
    if mprotect(start as *mut libc::c_void, len, PROT_READ | PROT_WRITE) == 0 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}

pub(crate) unsafe fn release(base: NonNull<u8>, len: usize) -> Result<(), Error> {
    if munmap(base.as_ptr() as *mut libc::c_void, len) == 0 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}
