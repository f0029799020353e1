//! Per-thread identity cache.
//!
//! Each OS thread lazily caches its kernel thread id (`gettid(2)`, unique
//! system-wide, unlike `pthread_self`), a pre-rendered form of that id for
//! log prefixes, and a display name that starts as `"unknown"`.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::time::Duration;

thread_local! {
    static CACHED_TID: Cell<libc::pid_t> = const { Cell::new(0) };
    static TID_STRING: RefCell<String> = const { RefCell::new(String::new()) };
    static THREAD_NAME: RefCell<Cow<'static, str>> = const { RefCell::new(Cow::Borrowed("unknown")) };
}

#[allow(clippy::cast_possible_truncation)]
fn gettid() -> libc::pid_t {
    // SAFETY: SYS_gettid takes no arguments and cannot fail.
    unsafe { libc::syscall(libc::SYS_gettid) as libc::pid_t }
}

/// Fills the cache for the calling thread if it is still empty.
pub fn cache_tid() {
    if CACHED_TID.get() == 0 {
        let tid = gettid();
        CACHED_TID.set(tid);
        TID_STRING.set(format!("{tid:5} "));
    }
}

/// Kernel thread id of the calling thread.
#[inline]
#[must_use]
pub fn tid() -> libc::pid_t {
    let cached = CACHED_TID.get();
    if cached != 0 {
        return cached;
    }
    cache_tid();
    CACHED_TID.get()
}

/// Borrows the pre-rendered id (right-aligned to five columns plus a
/// trailing space) without allocating.
pub fn with_tid_string<F, R>(f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    cache_tid();
    TID_STRING.with_borrow(|rendered| f(rendered))
}

#[must_use]
pub fn tid_string() -> String {
    with_tid_string(str::to_owned)
}

#[must_use]
pub fn tid_string_length() -> usize {
    with_tid_string(str::len)
}

/// Display name of the calling thread.
#[must_use]
pub fn name() -> String {
    THREAD_NAME.with_borrow(ToString::to_string)
}

pub fn set_name(name: impl Into<Cow<'static, str>>) {
    THREAD_NAME.set(name.into());
}

/// `true` when called on the thread whose id equals the process id.
#[must_use]
pub fn is_main_thread() -> bool {
    // SAFETY: getpid(2) has no preconditions.
    tid() == unsafe { libc::getpid() }
}

/// Suspends the calling thread for `usec` microseconds.
pub fn sleep_usec(usec: u64) {
    std::thread::sleep(Duration::from_micros(usec));
}
