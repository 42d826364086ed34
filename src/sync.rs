// ── Native reentrant mutex ────────────────────────────────────────────────────
//
// `NativeMutex` wraps exactly one OS lock object (see `platform`) and ties its
// lifetime to the Rust value: created in `new`, destroyed in `Drop`.  There is
// no uninitialised or double-destroyed state.
//
// The lock guards no data of its own.  Callers associate it with whatever
// state they protect.  Acquisition order between threads is whatever the OS
// provides (not FIFO).
//
// Destroying a native lock that some thread still holds is undefined in both
// Win32 and POSIX.  `NativeMutex` counts outstanding holds; if it is dropped
// with a nonzero count the native object is leaked rather than destroyed.
// The count is needed because the lock is recursive: a `try_lock` check in
// `Drop` would succeed for the owning thread and hide its hold.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::platform::RawRecursiveLock;

/// A reentrant mutual-exclusion lock backed by the native OS primitive.
///
/// The same thread may acquire it more than once; it becomes available to
/// other threads after a matching number of releases.
///
/// The native object is heap-allocated, so its address (the identity the OS
/// records) never changes even if the `NativeMutex` itself is moved.  There
/// is deliberately no `Clone`.
pub struct NativeMutex {
    /// Dropped by hand in `Drop`, and only when `holds` is zero.
    raw: ManuallyDrop<RawRecursiveLock>,
    /// Acquisitions not yet released, across all threads.  Only changed
    /// while the lock is held, so `Relaxed` is enough.
    holds: AtomicUsize,
}

/// Number of native locks leaked because they were dropped while held.
#[cfg(test)]
static LEAKED: AtomicUsize = AtomicUsize::new(0);

impl NativeMutex {
    /// Create and initialise the native lock.
    ///
    /// Fails only if the OS cannot create the lock object; the error is
    /// returned immediately and also logged at `error` level.
    pub fn new() -> Result<Self> {
        match RawRecursiveLock::new() {
            Ok(raw) => {
                log::trace!("native mutex created");
                Ok(Self {
                    raw: ManuallyDrop::new(raw),
                    holds: AtomicUsize::new(0),
                })
            }
            Err(e) => {
                log::error!("native mutex creation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Block until the calling thread holds the lock.
    ///
    /// Returns immediately if the calling thread already holds it; each such
    /// call adds one level that must be matched by a [`release`].
    ///
    /// [`release`]: Self::release
    pub fn acquire(&self) {
        self.raw.lock();
        self.holds.fetch_add(1, Ordering::Relaxed);
    }

    /// Acquire without blocking.  Returns `false`, leaving the lock
    /// untouched, if another thread holds it.
    pub fn try_acquire(&self) -> bool {
        let acquired = self.raw.try_lock();
        if acquired {
            self.holds.fetch_add(1, Ordering::Relaxed);
        }
        acquired
    }

    /// Release one level of ownership.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock through a prior successful
    /// [`acquire`](Self::acquire) or [`try_acquire`](Self::try_acquire) that
    /// has not yet been released.  Violating this is undefined behavior in
    /// the native primitive.
    pub unsafe fn release(&self) {
        let prev = self.holds.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "release without a matching acquire");
        // SAFETY: forwarded from this function's contract.
        unsafe { self.raw.unlock() }
    }

    /// Acquire the lock and return a guard that releases it on drop.
    pub fn lock(&self) -> NativeMutexGuard<'_> {
        self.acquire();
        NativeMutexGuard::new(self)
    }

    /// Non-blocking [`lock`](Self::lock).
    pub fn try_lock(&self) -> Option<NativeMutexGuard<'_>> {
        self.try_acquire().then(|| NativeMutexGuard::new(self))
    }
}

impl Drop for NativeMutex {
    fn drop(&mut self) {
        let holds = *self.holds.get_mut();
        if holds != 0 {
            log::error!("native mutex dropped with {} outstanding holds; leaking it", holds);
            #[cfg(test)]
            LEAKED.fetch_add(1, Ordering::Relaxed);
            return;
        }
        // SAFETY: `raw` is dropped exactly once, here, and no thread holds it.
        unsafe { ManuallyDrop::drop(&mut self.raw) }
        log::trace!("native mutex destroyed");
    }
}

impl fmt::Debug for NativeMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMutex").finish_non_exhaustive()
    }
}

// ── Guard ─────────────────────────────────────────────────────────────────────

/// One level of ownership of a [`NativeMutex`], released on drop.
///
/// Not `Send`: a hold must be released on the thread that acquired it.
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<widebridge::NativeMutexGuard<'static>>();
/// ```
#[must_use = "dropping the guard releases the lock immediately"]
pub struct NativeMutexGuard<'a> {
    mutex: &'a NativeMutex,
    _not_send: PhantomData<*const ()>,
}

impl<'a> NativeMutexGuard<'a> {
    fn new(mutex: &'a NativeMutex) -> Self {
        Self {
            mutex,
            _not_send: PhantomData,
        }
    }
}

impl Drop for NativeMutexGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: a guard is only built right after a successful acquire on
        // this thread, and it cannot leave this thread (`!Send`).
        unsafe { self.mutex.release() }
    }
}

impl fmt::Debug for NativeMutexGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMutexGuard").finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    /// Try the lock from a different thread.
    fn try_from_other_thread(m: &NativeMutex) -> bool {
        thread::scope(|s| {
            s.spawn(|| {
                let ok = m.try_acquire();
                if ok {
                    // SAFETY: acquired just above on this thread.
                    unsafe { m.release() };
                }
                ok
            })
            .join()
            .expect("helper thread panicked")
        })
    }

    #[test]
    fn new_lock_is_free() {
        let m = NativeMutex::new().expect("create");
        assert!(m.try_acquire());
        // SAFETY: acquired above.
        unsafe { m.release() };
        assert!(try_from_other_thread(&m));
    }

    #[test]
    fn reentrant_on_owning_thread() {
        let m = NativeMutex::new().expect("create");
        m.acquire();
        m.acquire();
        assert!(m.try_acquire(), "owner re-entry must not fail");
        assert!(!try_from_other_thread(&m));

        // SAFETY: three levels held by this thread.
        unsafe { m.release() };
        assert!(!try_from_other_thread(&m));
        // SAFETY: two levels left.
        unsafe { m.release() };
        assert!(!try_from_other_thread(&m));
        // SAFETY: last level.
        unsafe { m.release() };
        assert!(try_from_other_thread(&m));
    }

    #[test]
    fn try_acquire_fails_while_other_thread_holds() {
        let m = NativeMutex::new().expect("create");
        m.acquire();

        assert!(!try_from_other_thread(&m));
        assert!(!try_from_other_thread(&m), "failed try leaves state unchanged");

        // The holder can still acquire again without contention.
        m.acquire();
        // SAFETY: two levels held by this thread.
        unsafe {
            m.release();
            m.release();
        }
        assert!(try_from_other_thread(&m));
    }

    #[test]
    fn guard_releases_on_drop() {
        let m = NativeMutex::new().expect("create");
        {
            let _outer = m.lock();
            let inner = m.try_lock();
            assert!(inner.is_some());
            drop(inner);
            assert!(!try_from_other_thread(&m));
        }
        assert!(try_from_other_thread(&m));
    }

    #[test]
    fn blocked_acquire_waits_for_release() {
        let m = NativeMutex::new().expect("create");
        let entered = AtomicUsize::new(0);
        let barrier = Barrier::new(2);

        let guard = m.lock();
        thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                m.acquire();
                entered.store(1, Ordering::SeqCst);
                // SAFETY: acquired above on this thread.
                unsafe { m.release() };
            });
            barrier.wait();
            thread::sleep(std::time::Duration::from_millis(50));
            assert_eq!(entered.load(Ordering::SeqCst), 0);
            drop(guard);
        });
        assert_eq!(entered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mutual_exclusion_no_interleaving() {
        const THREADS: usize = 4;
        const ITERS: usize = 200;

        let m = Arc::new(NativeMutex::new().expect("create"));
        let inside = Arc::new(AtomicUsize::new(0));
        // (thread id, is_enter) markers; the std Mutex only makes pushes
        // well-defined, exclusion is asserted via `inside` and the ordering.
        let log = Arc::new(Mutex::new(Vec::with_capacity(THREADS * ITERS * 2)));

        let handles: Vec<_> = (0..THREADS)
            .map(|id| {
                let m = Arc::clone(&m);
                let inside = Arc::clone(&inside);
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for _ in 0..ITERS {
                        m.acquire();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        log.lock().expect("log").push((id, true));
                        thread::yield_now();
                        log.lock().expect("log").push((id, false));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        // SAFETY: acquired at the top of this iteration.
                        unsafe { m.release() };
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("worker panicked");
        }

        let log = log.lock().expect("log");
        assert_eq!(log.len(), THREADS * ITERS * 2);
        for pair in log.chunks(2) {
            assert_eq!(pair[0].0, pair[1].0, "critical sections interleaved");
            assert!(pair[0].1 && !pair[1].1);
        }
    }

    #[test]
    fn lock_identity_survives_move() {
        let m = NativeMutex::new().expect("create");
        m.acquire();
        let moved = Box::new(m);
        assert!(!try_from_other_thread(&moved));
        // SAFETY: acquired before the move on this thread.
        unsafe { moved.release() };
        assert!(try_from_other_thread(&moved));
    }

    #[test]
    fn hold_count_tracks_acquire_and_release() {
        let m = NativeMutex::new().expect("create");
        m.acquire();
        assert!(m.try_acquire());
        assert_eq!(m.holds.load(Ordering::Relaxed), 2);
        {
            let _g = m.lock();
            assert_eq!(m.holds.load(Ordering::Relaxed), 3);
        }
        // SAFETY: two levels held by this thread.
        unsafe {
            m.release();
            m.release();
        }
        assert_eq!(m.holds.load(Ordering::Relaxed), 0);
    }

    // The only test in this binary that drops a held lock, so the global
    // counter moves by exactly one.
    #[test]
    fn dropping_a_held_lock_leaks_instead_of_destroying() {
        let before = LEAKED.load(Ordering::Relaxed);

        let m = NativeMutex::new().expect("create");
        m.acquire();
        m.acquire();
        drop(m);
        assert_eq!(LEAKED.load(Ordering::Relaxed), before + 1);

        // Held by a thread that has since exited.
        let m = NativeMutex::new().expect("create");
        thread::scope(|s| {
            s.spawn(|| m.acquire());
        });
        drop(m);
        assert_eq!(LEAKED.load(Ordering::Relaxed), before + 2);

        let m = NativeMutex::new().expect("create");
        m.acquire();
        // SAFETY: acquired just above.
        unsafe { m.release() };
        drop(m);
        assert_eq!(LEAKED.load(Ordering::Relaxed), before + 2);
    }

    #[test]
    fn mutex_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NativeMutex>();
    }
}
