//! Thread creation and coordination primitives backed by native pthreads.
//!
//! - [`primitives::Lock`] and [`primitives::ScopedLockGuard`]: non-recursive mutex
//!   with holder tracking and scope-bound acquisition.
//! - [`primitives::Condition`]: wait/signal bound to exactly one [`primitives::Lock`].
//! - [`primitives::CountdownLatch`]: single-shot barrier releasing every waiter at zero.
//! - [`primitives::AtomicInt32`] / [`primitives::AtomicInt64`]: lock-free counters.
//! - [`thread::ThreadHandle`]: start/join lifecycle that publishes the child's OS
//!   thread id before `start()` returns.
//! - [`thread::current_thread`]: per-thread cache of id, rendered id and name.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use foundation_threads::primitives::CountdownLatch;
//! use foundation_threads::thread::ThreadHandle;
//!
//! let latch = Arc::new(CountdownLatch::new(1));
//! let worker_latch = Arc::clone(&latch);
//!
//! let mut worker = ThreadHandle::with_name(move || worker_latch.count_down(), "worker");
//! worker.start().expect("should spawn");
//! assert!(worker.tid() > 0);
//!
//! latch.wait();
//! worker.join().expect("should join");
//! ```

#[cfg(not(target_os = "linux"))]
compile_error!("foundation_threads relies on gettid(2) and pthreads and only supports Linux");

#[macro_use]
mod macros;

pub mod errors;
pub mod primitives;
pub mod thread;

pub use errors::{ThreadError, ThreadResult};
