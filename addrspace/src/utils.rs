use std::io::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Returns page size in bytes
pub fn page_size() -> usize {
    #[cold]
    #[cfg(target_family = "unix")]
    fn sys_page_size() -> usize {
        unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
    }

    #[cold]
    #[cfg(target_family = "windows")]
    fn sys_page_size() -> usize {
        use winapi::um::sysinfoapi::GetSystemInfo;
        use winapi::um::sysinfoapi::{LPSYSTEM_INFO, SYSTEM_INFO};

        unsafe {
            let mut info: SYSTEM_INFO = std::mem::zeroed();
            GetSystemInfo(&mut info as LPSYSTEM_INFO);
            info.dwPageSize as usize
        }
    }

    static PAGE_SIZE_CACHE: AtomicUsize = AtomicUsize::new(0);
    match PAGE_SIZE_CACHE.load(Ordering::Relaxed) {
        0 => {
            let page_size = sys_page_size();
            debug_assert!(page_size.is_power_of_two());

            PAGE_SIZE_CACHE.store(page_size, Ordering::Relaxed);
            page_size
        }
        page_size => page_size,
    }
}

/// Rounds `len` up to a whole number of pages, `None` on overflow.
pub(crate) fn round_to_pages(len: usize) -> Option<usize> {
    let mask = page_size() - 1;
    len.checked_add(mask).map(|len| len & !mask)
}

/// Installs the process-wide handler that commits fault-committed regions on first touch.
///
/// Only the first successful call does anything. A failed install is retried by the next call.
pub(crate) fn install_fault_handler() -> Result<(), Error> {
    static INSTALLED: Mutex<bool> = Mutex::new(false);

    let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
    if !*installed {
        unsafe { set_signal_handler()? };
        *installed = true;
        tracing::debug!("installed address space fault handler");
    }
    Ok(())
}

#[cfg(target_family = "unix")]
mod unix {
    use std::io::Error;
    use std::mem::{self, MaybeUninit};
    use std::ptr::{self, addr_of, addr_of_mut};

    use libc::{c_int, c_void, siginfo_t};

    use crate::registry;

    // Dispositions that were in place before ours. Written once while installing, before the
    // handler can run, and only read afterwards.
    static mut PREVIOUS_SIGSEGV: MaybeUninit<libc::sigaction> = MaybeUninit::uninit();
    static mut PREVIOUS_SIGBUS: MaybeUninit<libc::sigaction> = MaybeUninit::uninit();

    pub(super) unsafe fn set_signal_handler() -> Result<(), Error> {
        let register = |signal: c_int, previous: *mut libc::sigaction| {
            let mut handler: libc::sigaction = mem::zeroed();
            // SA_SIGINFO gives us access to the faulting address.
            //
            // SA_ONSTACK allows us to handle signals on an alternate stack,
            // so that the handler can run in response to running out of
            // stack space on the main stack. Rust installs an alternate
            // stack with sigaltstack, so we rely on that.
            handler.sa_flags = libc::SA_SIGINFO | libc::SA_ONSTACK;
            handler.sa_sigaction = fault_handler as unsafe extern "C" fn(c_int, *mut siginfo_t, *mut c_void)
                as usize;
            libc::sigemptyset(&mut handler.sa_mask);
            if libc::sigaction(signal, &handler, previous) != 0 {
                Err(Error::last_os_error())
            } else {
                Ok(())
            }
        };

        // Linux reports accesses to PROT_NONE pages as SIGSEGV, Darwin as SIGBUS.
        register(libc::SIGSEGV, addr_of_mut!(PREVIOUS_SIGSEGV) as *mut libc::sigaction)?;
        register(libc::SIGBUS, addr_of_mut!(PREVIOUS_SIGBUS) as *mut libc::sigaction)
    }

    unsafe extern "C" fn fault_handler(signum: c_int, siginfo: *mut siginfo_t, context: *mut c_void) {
        if !siginfo.is_null() && registry::commit_on_fault(fault_address(siginfo)) {
            // Returning re-runs the faulting instruction, which now finds a committed page.
            return;
        }
        chain(signum, siginfo, context);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    unsafe fn fault_address(siginfo: *mut siginfo_t) -> usize {
        (*siginfo).si_addr() as usize
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    unsafe fn fault_address(siginfo: *mut siginfo_t) -> usize {
        (*siginfo).si_addr as usize
    }

    /// Hands a fault that is not ours to whoever was handling it before us.
    unsafe fn chain(signum: c_int, siginfo: *mut siginfo_t, context: *mut c_void) {
        let previous = if signum == libc::SIGBUS {
            addr_of!(PREVIOUS_SIGBUS) as *const libc::sigaction
        } else {
            addr_of!(PREVIOUS_SIGSEGV) as *const libc::sigaction
        };
        let previous = &*previous;

        if previous.sa_flags & libc::SA_SIGINFO != 0 {
            let f: unsafe extern "C" fn(c_int, *mut siginfo_t, *mut c_void) =
                mem::transmute(previous.sa_sigaction);
            f(signum, siginfo, context);
        } else if previous.sa_sigaction == libc::SIG_DFL || previous.sa_sigaction == libc::SIG_IGN {
            // Restore the default action. The faulting instruction runs again on return and the
            // process goes down the ordinary way.
            libc::sigaction(signum, previous, ptr::null_mut());
        } else {
            let f: extern "C" fn(c_int) = mem::transmute(previous.sa_sigaction);
            f(signum);
        }
    }
}

#[cfg(target_family = "unix")]
use self::unix::set_signal_handler;

#[cfg(target_family = "windows")]
mod windows {
    use std::io::Error;

    use winapi::um::errhandlingapi::AddVectoredExceptionHandler;
    use winapi::um::minwinbase::EXCEPTION_ACCESS_VIOLATION;
    use winapi::um::winnt::{LONG, PEXCEPTION_POINTERS, STATUS_GUARD_PAGE_VIOLATION};
    use winapi::vc::excpt::{EXCEPTION_CONTINUE_EXECUTION, EXCEPTION_CONTINUE_SEARCH};

    use crate::registry;

    pub(super) unsafe fn set_signal_handler() -> Result<(), Error> {
        // SetUnhandledExceptionFilter never sees STATUS_GUARD_PAGE_VIOLATION, a first-position
        // vectored handler does.
        if AddVectoredExceptionHandler(1, Some(exception_filter)).is_null() {
            Err(Error::last_os_error())
        } else {
            Ok(())
        }
    }

    unsafe extern "system" fn exception_filter(exception_info: PEXCEPTION_POINTERS) -> LONG {
        let record = &*(*exception_info).ExceptionRecord;
        if record.ExceptionCode != EXCEPTION_ACCESS_VIOLATION
            && record.ExceptionCode != STATUS_GUARD_PAGE_VIOLATION
        {
            return EXCEPTION_CONTINUE_SEARCH;
        }

        // The second parameter of an access violation is the address that was accessed.
        let hit_address = record.ExceptionInformation[1];
        if registry::commit_on_fault(hit_address) {
            EXCEPTION_CONTINUE_EXECUTION
        } else {
            EXCEPTION_CONTINUE_SEARCH
        }
    }
}

#[cfg(target_family = "windows")]
use self::windows::set_signal_handler;
