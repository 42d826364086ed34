// ── Recursive pthread mutex backend ───────────────────────────────────────────
//
// `PTHREAD_MUTEX_RECURSIVE` gives the same reentrancy as a Win32 critical
// section: the owner may lock again without blocking and the mutex becomes
// available once it has been unlocked as many times as it was locked.
//
// POSIX forbids moving an initialised `pthread_mutex_t`, so the mutex lives
// in a `Box` for its entire life.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

use crate::error::{InteropError, Result};

pub(crate) struct RawRecursiveLock {
    mutex: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

// SAFETY: pthread mutexes are meant to be shared between threads; every
// access goes through the pthread functions.
unsafe impl Send for RawRecursiveLock {}
// SAFETY: see above.
unsafe impl Sync for RawRecursiveLock {}

/// Map a pthread return code to a `Result`.
fn check(function: &'static str, rc: libc::c_int) -> Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(InteropError::Posix { function, code: rc })
    }
}

/// Panic unless a blocking pthread lock call returned 0.
fn expect_locked(function: &'static str, rc: libc::c_int) {
    if rc != 0 {
        panic!("{function} failed (errno {rc})");
    }
}

impl RawRecursiveLock {
    pub(crate) fn new() -> Result<Self> {
        let mutex = Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER));
        let mut attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();

        // SAFETY: `attr` is writable storage for the attribute object.
        check("pthread_mutexattr_init", unsafe {
            libc::pthread_mutexattr_init(attr.as_mut_ptr())
        })?;

        // SAFETY: `attr` was initialised above; `mutex` is boxed and does not
        // move from here on.
        let rc = unsafe {
            match libc::pthread_mutexattr_settype(
                attr.as_mut_ptr(),
                libc::PTHREAD_MUTEX_RECURSIVE,
            ) {
                0 => check(
                    "pthread_mutex_init",
                    libc::pthread_mutex_init(mutex.get(), attr.as_ptr()),
                ),
                rc => check("pthread_mutexattr_settype", rc),
            }
        };

        // SAFETY: `attr` was initialised and is destroyed exactly once.  The
        // mutex keeps no reference to it after `pthread_mutex_init`.
        unsafe {
            libc::pthread_mutexattr_destroy(attr.as_mut_ptr());
        }

        rc.map(|()| Self { mutex })
    }

    pub(crate) fn lock(&self) {
        // SAFETY: initialised in `new`, destroyed only in Drop.
        let rc = unsafe { libc::pthread_mutex_lock(self.mutex.get()) };
        // A recursive mutex only fails here on hold-count overflow (EAGAIN).
        // Carrying on would hand out a guard for a lock we do not hold.
        expect_locked("pthread_mutex_lock", rc);
    }

    pub(crate) fn try_lock(&self) -> bool {
        // SAFETY: as in `lock`.  EBUSY leaves the mutex untouched.
        unsafe { libc::pthread_mutex_trylock(self.mutex.get()) == 0 }
    }

    /// # Safety
    ///
    /// The calling thread must currently own the mutex.
    pub(crate) unsafe fn unlock(&self) {
        // SAFETY: initialised; ownership by this thread is the caller's
        // contract.
        let rc = unsafe { libc::pthread_mutex_unlock(self.mutex.get()) };
        debug_assert_eq!(rc, 0, "pthread_mutex_unlock failed");
    }
}

impl Drop for RawRecursiveLock {
    fn drop(&mut self) {
        // SAFETY: initialised in `new` and destroyed exactly once here.
        // `NativeMutex` only lets this run once every hold has been released;
        // a lock dropped while held is leaked instead.
        let rc = unsafe { libc::pthread_mutex_destroy(self.mutex.get()) };
        if rc != 0 {
            log::error!("pthread_mutex_destroy failed (errno {})", rc);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
