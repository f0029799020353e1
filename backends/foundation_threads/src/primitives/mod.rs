//! Blocking synchronization primitives and lock-free counters.

pub mod atomic_counter;
pub mod condition;
pub mod countdown_latch;
pub mod lock;

pub use atomic_counter::{AtomicInt32, AtomicInt64};
pub use condition::Condition;
pub use countdown_latch::CountdownLatch;
pub use lock::{Lock, Lockable, ScopedLockGuard};
