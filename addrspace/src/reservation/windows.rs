use std::io::Error;
use std::ptr::{self, NonNull};

use winapi::ctypes::c_void;
use winapi::um::memoryapi::{VirtualAlloc, VirtualFree};
use winapi::um::winnt::{MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_GUARD, PAGE_NOACCESS, PAGE_READWRITE};

use crate::utils::page_size;

/// Reserved memory is inaccessible on Windows until it is committed.
pub(crate) unsafe fn reserve_inaccessible(len: usize) -> Result<NonNull<u8>, Error> {
    let ptr = VirtualAlloc(ptr::null_mut(), len, MEM_RESERVE, PAGE_NOACCESS) as *mut u8;
    NonNull::new(ptr).ok_or_else(Error::last_os_error)
}

/// Commits `len` bytes starting at `start` as read/write and, if `guard_after` is set, the page
/// right after them as a guard page. Runs inside the vectored exception handler.
pub(crate) unsafe fn commit(start: *mut u8, len: usize, guard_after: bool) -> Result<(), Error> {
    if VirtualAlloc(start as *mut c_void, len, MEM_COMMIT, PAGE_READWRITE).is_null() {
        return Err(Error::last_os_error());
    }
    if guard_after
        && VirtualAlloc(
            start.add(len) as *mut c_void,
            page_size(),
            MEM_COMMIT,
            PAGE_READWRITE | PAGE_GUARD,
        )
        .is_null()
    {
        return Err(Error::last_os_error());
    }
    Ok(())
}

pub(crate) unsafe fn release(base: NonNull<u8>, _len: usize) -> Result<(), Error> {
    // MEM_RELEASE requires a size of 0 and frees the whole reservation.
    if VirtualFree(base.as_ptr() as *mut c_void, 0, MEM_RELEASE) != 0 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}
