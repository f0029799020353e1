//! Managed threads and the per-thread identity cache.

pub mod current_thread;
mod handle;

pub use handle::{ThreadFunc, ThreadHandle};
