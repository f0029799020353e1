//! Non-recursive mutual exclusion with scope-bound acquisition.
//!
//! [`Lock`] wraps a native `pthread_mutex_t` and records which OS thread
//! currently holds it. It guards no data itself: the owning component
//! decides what the lock protects, and [`ScopedLockGuard`] ties each
//! critical section to a lexical scope.
//!
//! # Examples
//!
//! ```
//! use foundation_threads::primitives::{Lock, ScopedLockGuard};
//!
//! let lock = Lock::new();
//! {
//!     let _guard = ScopedLockGuard::new(&lock);
//!     assert!(lock.is_locked_by_this_thread());
//! }
//! assert!(!lock.is_locked_by_this_thread());
//! ```

use core::cell::UnsafeCell;
use core::fmt;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicI32, Ordering};

use crate::errors::check_pthread;
use crate::thread::current_thread;

/// Anything that can be acquired and released by the same thread.
///
/// [`ScopedLockGuard`] is generic over this trait so the same scoped
/// discipline applies to any lock-like type.
pub trait Lockable {
    /// Blocks until the calling thread holds the lock.
    fn lock(&self);

    /// Releases the lock held by the calling thread.
    fn unlock(&self);
}

/// A non-recursive mutex backed by `pthread_mutex_t`.
///
/// The mutex is created with `PTHREAD_MUTEX_ERRORCHECK`: unlocking a lock the
/// caller does not hold is reported by the OS and aborts the process. A
/// thread locking twice without unlocking is a programming error.
///
/// Any non-zero return from the OS on init, lock, unlock or destroy is
/// fatal; there is no degraded mode once the native mutex is unusable.
pub struct Lock {
    // Boxed so the native object never moves after initialization.
    mutex: Box<UnsafeCell<libc::pthread_mutex_t>>,
    holder: AtomicI32,
}

// SAFETY: the pthread mutex is designed for concurrent use from many threads;
// all access goes through the pthread API and `holder` is atomic.
unsafe impl Send for Lock {}
unsafe impl Sync for Lock {}

impl Lock {
    /// Creates an unheld lock.
    #[must_use]
    pub fn new() -> Self {
        let mutex = Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER));
        let mut attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();

        // SAFETY: `attr` is initialized by `pthread_mutexattr_init` before any
        // other use, and destroyed once the mutex has copied its settings.
        unsafe {
            check_pthread(
                "init mutexattr",
                libc::pthread_mutexattr_init(attr.as_mut_ptr()),
            );
            check_pthread(
                "settype mutexattr",
                libc::pthread_mutexattr_settype(attr.as_mut_ptr(), libc::PTHREAD_MUTEX_ERRORCHECK),
            );
            check_pthread(
                "init mutex",
                libc::pthread_mutex_init(mutex.get(), attr.as_ptr()),
            );
            check_pthread(
                "destroy mutexattr",
                libc::pthread_mutexattr_destroy(attr.as_mut_ptr()),
            );
        }

        Self {
            mutex,
            holder: AtomicI32::new(0),
        }
    }

    /// Blocks until the calling thread holds the lock.
    pub fn lock(&self) {
        // SAFETY: the mutex was initialized in `new` and lives as long as `self`.
        check_pthread("lock", unsafe { libc::pthread_mutex_lock(self.mutex.get()) });
        self.assign_holder();
    }

    /// Releases the lock. Must be called by the thread that acquired it.
    pub fn unlock(&self) {
        self.unassign_holder();
        // SAFETY: the mutex was initialized in `new`; a non-owner unlock is
        // rejected by the errorcheck mutex and turned into a fatal error.
        check_pthread("unlock", unsafe {
            libc::pthread_mutex_unlock(self.mutex.get())
        });
    }

    /// Best-effort debug query; never branch correctness logic on it.
    #[must_use]
    pub fn is_locked_by_this_thread(&self) -> bool {
        self.holder.load(Ordering::Relaxed) == current_thread::tid()
    }

    /// Debug assertion that the calling thread holds this lock.
    #[track_caller]
    pub fn assert_locked(&self) {
        debug_assert!(
            self.is_locked_by_this_thread(),
            "lock is not held by thread {}",
            current_thread::tid()
        );
    }

    pub(crate) fn raw(&self) -> *mut libc::pthread_mutex_t {
        self.mutex.get()
    }

    // Called around condition waits, where the OS releases and re-acquires
    // the mutex on our behalf.
    pub(crate) fn assign_holder(&self) {
        self.holder.store(current_thread::tid(), Ordering::Relaxed);
    }

    pub(crate) fn unassign_holder(&self) {
        self.holder.store(0, Ordering::Relaxed);
    }
}

impl Lockable for Lock {
    #[inline]
    fn lock(&self) {
        Lock::lock(self);
    }

    #[inline]
    fn unlock(&self) {
        Lock::unlock(self);
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.holder.load(Ordering::Relaxed),
            0,
            "lock dropped while held"
        );
        // SAFETY: `&mut self` proves no guard or condition still borrows the mutex.
        check_pthread("destroy mutex", unsafe {
            libc::pthread_mutex_destroy(self.mutex.get())
        });
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("holder", &self.holder.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Holds a [`Lockable`] for the lifetime of the guard.
///
/// Acquires on construction and releases exactly once on drop, which covers
/// normal exit, early return and unwinding.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ScopedLockGuard<'a, L: Lockable + ?Sized> {
    lock: &'a L,
}

impl<'a, L: Lockable + ?Sized> ScopedLockGuard<'a, L> {
    pub fn new(lock: &'a L) -> Self {
        lock.lock();
        Self { lock }
    }
}

impl<L: Lockable + ?Sized> Drop for ScopedLockGuard<'_, L> {
    #[inline]
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

impl<L: Lockable + ?Sized> fmt::Debug for ScopedLockGuard<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLockGuard").finish_non_exhaustive()
    }
}
