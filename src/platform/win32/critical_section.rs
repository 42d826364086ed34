// ── CRITICAL_SECTION backend ──────────────────────────────────────────────────
//
// A critical section is reentrant: the owning thread may enter it again
// without blocking, and it is released once `LeaveCriticalSection` has been
// called as many times as it was entered.
//
// The OS keeps the address of the `CRITICAL_SECTION` (it is linked into the
// process-wide debug list), so the structure must never move after
// `InitializeCriticalSectionEx`.  It therefore lives in a `Box` that is
// allocated before initialisation and freed only after
// `DeleteCriticalSection`.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;

use windows::Win32::System::Threading::{
    DeleteCriticalSection, EnterCriticalSection, InitializeCriticalSectionEx,
    LeaveCriticalSection, TryEnterCriticalSection, CRITICAL_SECTION,
};

use crate::error::{InteropError, Result};

/// Spin iterations before a contended `EnterCriticalSection` waits on the
/// kernel.  Zero leaves the choice to the OS.
const SPIN_COUNT: u32 = 0;

/// Wrap a windows-crate error, keeping the name of the failing function.
fn win32_error(function: &'static str, e: &windows::core::Error) -> InteropError {
    // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
    InteropError::Win32 {
        function,
        code: e.code().0 as u32,
    }
}

pub(crate) struct RawRecursiveLock {
    cs: Box<UnsafeCell<CRITICAL_SECTION>>,
}

// SAFETY: a CRITICAL_SECTION is designed to be entered and left from any
// thread; all mutation goes through the kernel32 functions, which perform
// their own synchronisation.  The raw pointers inside the struct are owned by
// the OS, not by any particular thread.
unsafe impl Send for RawRecursiveLock {}
// SAFETY: see above.
unsafe impl Sync for RawRecursiveLock {}

impl RawRecursiveLock {
    pub(crate) fn new() -> Result<Self> {
        let cs = Box::new(UnsafeCell::new(CRITICAL_SECTION::default()));

        // SAFETY: `cs` is a freshly boxed, zeroed CRITICAL_SECTION that has
        // not been initialised yet and will not move until it is deleted.
        unsafe { InitializeCriticalSectionEx(cs.get(), SPIN_COUNT, 0) }
            .map_err(|e| win32_error("InitializeCriticalSectionEx", &e))?;

        Ok(Self { cs })
    }

    pub(crate) fn lock(&self) {
        // SAFETY: `cs` was initialised in `new` and is deleted only in Drop.
        unsafe { EnterCriticalSection(self.cs.get()) }
    }

    pub(crate) fn try_lock(&self) -> bool {
        // SAFETY: as in `lock`.
        unsafe { TryEnterCriticalSection(self.cs.get()) }.as_bool()
    }

    /// # Safety
    ///
    /// The calling thread must currently own the critical section.
    pub(crate) unsafe fn unlock(&self) {
        // SAFETY: initialised; ownership by this thread is the caller's
        // contract.
        unsafe { LeaveCriticalSection(self.cs.get()) }
    }
}

impl Drop for RawRecursiveLock {
    fn drop(&mut self) {
        // SAFETY: `cs` was initialised in `new` and is deleted exactly once
        // here.  `NativeMutex` only lets this run once every hold has been
        // released; a lock dropped while held is leaked instead.
        unsafe { DeleteCriticalSection(self.cs.get()) }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
