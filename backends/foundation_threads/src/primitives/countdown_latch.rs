//! Single-shot countdown barrier.
//!
//! A latch starts at `N` and releases every waiter, together, once `N`
//! calls to [`CountdownLatch::count_down`] have been made. It never
//! re-arms.
//!
//! Two common shapes:
//! - a coordinator waits for `N` workers to finish their setup, each worker
//!   counting down once;
//! - `N` workers wait on a latch of one until the coordinator counts it down,
//!   so they all start at the same moment.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use foundation_threads::primitives::CountdownLatch;
//!
//! let latch = Arc::new(CountdownLatch::new(3));
//! let workers: Vec<_> = (0..3)
//!     .map(|_| {
//!         let latch = Arc::clone(&latch);
//!         thread::spawn(move || latch.count_down())
//!     })
//!     .collect();
//!
//! latch.wait();
//! assert_eq!(latch.get_count(), 0);
//! # for worker in workers { worker.join().unwrap(); }
//! ```

use core::cell::UnsafeCell;
use core::fmt;

use crate::primitives::condition::Condition;
use crate::primitives::lock::{Lock, ScopedLockGuard};

pub struct CountdownLatch {
    condition: Condition<Lock>,
    // Guarded by `condition.lock()`.
    count: UnsafeCell<usize>,
}

// SAFETY: `count` is only read or written while the bound lock is held.
unsafe impl Send for CountdownLatch {}
unsafe impl Sync for CountdownLatch {}

impl CountdownLatch {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            condition: Condition::new(Lock::new()),
            count: UnsafeCell::new(count),
        }
    }

    /// Blocks until the count reaches zero; returns at once if it already has.
    pub fn wait(&self) {
        let _guard = ScopedLockGuard::new(self.condition.lock());
        // SAFETY: the guard holds the bound lock while the predicate runs.
        self.condition
            .wait_while(|| unsafe { *self.count.get() } > 0);
    }

    /// Decrements the count by one, waking every waiter on the transition to
    /// zero. Calls made once the count is already zero change nothing.
    pub fn count_down(&self) {
        let _guard = ScopedLockGuard::new(self.condition.lock());
        // SAFETY: the guard holds the bound lock; no other reference to
        // `count` exists while it does.
        let count = unsafe { &mut *self.count.get() };

        if *count == 0 {
            warn!("count_down called on a latch that already reached zero");
            return;
        }

        *count -= 1;
        if *count == 0 {
            self.condition.signal_all();
        }
    }

    /// Snapshot of the remaining count.
    #[must_use]
    pub fn get_count(&self) -> usize {
        let _guard = ScopedLockGuard::new(self.condition.lock());
        // SAFETY: the guard holds the bound lock.
        unsafe { *self.count.get() }
    }
}

impl fmt::Debug for CountdownLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownLatch")
            .field("count", &self.get_count())
            .finish()
    }
}
