//! Condition variable permanently bound to one [`Lock`].
//!
//! The binding is fixed at construction: `Condition<&Lock>` borrows a lock
//! owned elsewhere, `Condition<Lock>` owns its lock outright and
//! `Condition<Arc<Lock>>` shares it.
//!
//! Waiters must hold the bound lock and re-check their predicate after every
//! return from [`Condition::wait`], since wakeups may be spurious.
//!
//! # Examples
//!
//! ```
//! use std::cell::Cell;
//! use foundation_threads::primitives::{Condition, Lock, ScopedLockGuard};
//!
//! let lock = Lock::new();
//! let condition = Condition::new(&lock);
//! let ready = Cell::new(true);
//!
//! let _guard = ScopedLockGuard::new(&lock);
//! condition.wait_while(|| !ready.get());
//! ```

use core::borrow::Borrow;
use core::cell::UnsafeCell;
use core::fmt;
use core::ptr;

use crate::errors::check_pthread;
use crate::primitives::lock::Lock;

/// Wait/signal/broadcast over a native `pthread_cond_t`.
pub struct Condition<L: Borrow<Lock>> {
    lock: L,
    cond: Box<UnsafeCell<libc::pthread_cond_t>>,
}

// SAFETY: pthread condition variables are designed for concurrent use; the
// bound lock is only ever reached through `&Lock`, which is `Sync`.
unsafe impl<L: Borrow<Lock> + Send> Send for Condition<L> {}
unsafe impl<L: Borrow<Lock> + Sync> Sync for Condition<L> {}

impl<L: Borrow<Lock>> Condition<L> {
    /// Binds a new condition variable to `lock` for its whole lifetime.
    #[must_use]
    pub fn new(lock: L) -> Self {
        let cond = Box::new(UnsafeCell::new(libc::PTHREAD_COND_INITIALIZER));
        // SAFETY: `cond` is boxed and never moves after initialization.
        check_pthread("init cv", unsafe {
            libc::pthread_cond_init(cond.get(), ptr::null())
        });
        Self { lock, cond }
    }

    /// The lock this condition is bound to.
    #[inline]
    #[must_use]
    pub fn lock(&self) -> &Lock {
        self.lock.borrow()
    }

    /// Atomically releases the bound lock and blocks until signalled, then
    /// re-acquires the lock before returning.
    ///
    /// The caller must already hold the bound lock and must re-check its
    /// predicate in a loop.
    pub fn wait(&self) {
        let lock = self.lock();
        lock.assert_locked();

        lock.unassign_holder();
        // SAFETY: both native objects are initialized and outlive this call;
        // the caller holds the mutex as pthread_cond_wait requires.
        let result = unsafe { libc::pthread_cond_wait(self.cond.get(), lock.raw()) };
        lock.assign_holder();

        check_pthread("wait", result);
    }

    /// Waits for as long as `condition` returns `true`.
    ///
    /// The caller must hold the bound lock; the predicate is evaluated with
    /// the lock held, so it may read state guarded by that lock.
    pub fn wait_while<F>(&self, mut condition: F)
    where
        F: FnMut() -> bool,
    {
        while condition() {
            self.wait();
        }
    }

    /// Wakes at most one waiter.
    pub fn signal(&self) {
        // SAFETY: `cond` was initialized in `new`.
        check_pthread("signal", unsafe {
            libc::pthread_cond_signal(self.cond.get())
        });
    }

    /// Wakes every current waiter.
    pub fn signal_all(&self) {
        // SAFETY: `cond` was initialized in `new`.
        check_pthread("broadcast", unsafe {
            libc::pthread_cond_broadcast(self.cond.get())
        });
    }
}

impl<L: Borrow<Lock>> Drop for Condition<L> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` proves no thread is still waiting on `cond`.
        check_pthread("destroy cv", unsafe {
            libc::pthread_cond_destroy(self.cond.get())
        });
    }
}

impl<L: Borrow<Lock>> fmt::Debug for Condition<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("lock", self.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ScopedLockGuard;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct Gate {
        condition: Condition<Lock>,
        // Guarded by `condition.lock()`.
        state: UnsafeCell<GateState>,
    }

    #[derive(Default)]
    struct GateState {
        open: bool,
        waiting: usize,
        released: usize,
    }

    // SAFETY: `state` is only touched while the bound lock is held.
    unsafe impl Sync for Gate {}

    impl Gate {
        fn new() -> Self {
            Self {
                condition: Condition::new(Lock::new()),
                state: UnsafeCell::new(GateState::default()),
            }
        }

        /// Caller must hold `self.condition.lock()`.
        fn with_state<R>(&self, f: impl FnOnce(&mut GateState) -> R) -> R {
            self.condition.lock().assert_locked();
            // SAFETY: the bound lock is held, so no other reference exists.
            f(unsafe { &mut *self.state.get() })
        }
    }

    /// WHY: Signalling with nobody waiting must be harmless
    /// WHAT: signal and `signal_all` return without blocking
    #[test]
    fn test_signal_without_waiters() {
        let lock = Lock::new();
        let condition = Condition::new(&lock);
        condition.signal();
        condition.signal_all();
    }

    /// WHY: The binding is what lets the latch own both halves
    /// WHAT: Owned, borrowed and shared locks all expose the bound lock
    #[test]
    fn test_binding_variants() {
        let owned = Condition::new(Lock::new());
        {
            let _guard = ScopedLockGuard::new(owned.lock());
            assert!(owned.lock().is_locked_by_this_thread());
        }

        let lock = Lock::new();
        let borrowed = Condition::new(&lock);
        assert!(ptr::eq(borrowed.lock(), &lock));

        let shared = Arc::new(Lock::new());
        let arc_bound = Condition::new(Arc::clone(&shared));
        assert!(ptr::eq(arc_bound.lock(), &*shared));
    }

    /// WHY: `wait_while` must not block when the predicate is already satisfied
    /// WHAT: Returns immediately and leaves the lock held
    #[test]
    #[ntest::timeout(2000)]
    fn test_wait_while_satisfied_predicate() {
        let condition = Condition::new(Lock::new());
        let _guard = ScopedLockGuard::new(condition.lock());
        condition.wait_while(|| false);
        assert!(condition.lock().is_locked_by_this_thread());
    }

    /// WHY: Waiting hands the lock over and takes it back before returning
    /// WHAT: A signalled waiter observes the flag set by the signaller
    #[test]
    #[ntest::timeout(5000)]
    fn test_signal_wakes_waiter() {
        let gate = Arc::new(Gate::new());

        let waiter_gate = Arc::clone(&gate);
        let waiter = thread::spawn(move || {
            let _guard = ScopedLockGuard::new(waiter_gate.condition.lock());
            while !waiter_gate.with_state(|state| state.open) {
                waiter_gate.condition.wait();
            }
            assert!(waiter_gate.condition.lock().is_locked_by_this_thread());
        });

        thread::sleep(Duration::from_millis(20));
        {
            let _guard = ScopedLockGuard::new(gate.condition.lock());
            gate.with_state(|state| state.open = true);
            gate.condition.signal();
        }

        waiter.join().unwrap();
    }

    /// WHY: Broadcast must release every blocked waiter, not just one
    /// WHAT: Five waiters parked on a closed gate all return after `signal_all`
    #[test]
    #[ntest::timeout(10000)]
    fn test_signal_all_releases_every_waiter() {
        const WAITERS: usize = 5;
        let gate = Arc::new(Gate::new());

        let handles: Vec<_> = (0..WAITERS)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || {
                    let _guard = ScopedLockGuard::new(gate.condition.lock());
                    gate.with_state(|state| state.waiting += 1);
                    gate.condition
                        .wait_while(|| !gate.with_state(|state| state.open));
                    gate.with_state(|state| state.released += 1);
                })
            })
            .collect();

        // Every waiter bumps `waiting` before parking, and parking releases
        // the lock, so seeing the full count means all of them are blocked.
        loop {
            {
                let _guard = ScopedLockGuard::new(gate.condition.lock());
                if gate.with_state(|state| state.waiting) == WAITERS {
                    gate.with_state(|state| state.open = true);
                    gate.condition.signal_all();
                    break;
                }
            }
            thread::sleep(Duration::from_millis(1));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let _guard = ScopedLockGuard::new(gate.condition.lock());
        assert_eq!(gate.with_state(|state| state.released), WAITERS);
    }
}
