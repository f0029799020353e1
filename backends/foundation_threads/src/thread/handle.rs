//! Managed native thread with a start handshake.
//!
//! [`ThreadHandle::start`] does not return until the child has published its
//! kernel thread id, so the caller can use [`ThreadHandle::tid`] (for
//! signalling, affinity, logging) the moment `start` succeeds.
//!
//! A handle that is started but never joined detaches its thread on drop:
//! dropping never blocks and never leaks the native handle.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::errors::{fatal, PanicFailure, ThreadError, ThreadResult};
use crate::primitives::{AtomicInt32, CountdownLatch};
use crate::thread::current_thread;

/// The function a [`ThreadHandle`] runs.
pub type ThreadFunc = Box<dyn FnOnce() + Send + 'static>;

/// Shared between the handle and the spawned thread. The thread takes the
/// function out once it runs; a failed spawn leaves it in place so `start`
/// can be retried.
type FuncSlot = Arc<Mutex<Option<ThreadFunc>>>;

/// Number of `ThreadHandle`s ever constructed in this process; feeds the
/// synthetic `Thread<N>` names.
static NUM_CREATED: AtomicInt32 = AtomicInt32::new();

pub struct ThreadHandle {
    started: bool,
    joined: bool,
    native: Option<JoinHandle<()>>,
    tid: Arc<AtomicInt32>,
    name: String,
    func: FuncSlot,
    stack_size: Option<usize>,
    latch: Arc<CountdownLatch>,
}

impl ThreadHandle {
    /// Creates an unstarted handle named `Thread<N>`.
    pub fn new<F>(func: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_name(func, String::new())
    }

    /// Creates an unstarted handle; an empty `name` falls back to `Thread<N>`.
    ///
    /// Every construction consumes one value of the process-wide creation
    /// counter, whether or not a name was supplied.
    pub fn with_name<F>(func: F, name: impl Into<String>) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let mut handle = Self {
            started: false,
            joined: false,
            native: None,
            tid: Arc::new(AtomicInt32::new()),
            name: name.into(),
            func: Arc::new(Mutex::new(Some(Box::new(func)))),
            stack_size: None,
            latch: Arc::new(CountdownLatch::new(1)),
        };
        handle.set_default_name();
        handle
    }

    /// Requests a stack of `bytes` for the native thread.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// How many handles have been constructed in this process so far.
    #[must_use]
    pub fn num_created() -> i32 {
        NUM_CREATED.get()
    }

    /// Spawns the native thread and blocks until it has published its id.
    ///
    /// On success `started()` is `true` and `tid() > 0`. If the OS refuses to
    /// create the thread, `started()` stays `false`, nothing blocks, and the
    /// spawn error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::Spawn`] when the native thread cannot be created.
    ///
    /// # Panics
    ///
    /// Panics if the handle was already started.
    pub fn start(&mut self) -> ThreadResult<()> {
        assert!(!self.started, "thread {} already started", self.name);
        self.started = true;

        let data = ThreadData {
            func: Arc::clone(&self.func),
            name: self.name.clone(),
            tid: Arc::clone(&self.tid),
            latch: Arc::clone(&self.latch),
        };

        let mut builder = thread::Builder::new();
        if !self.name.contains('\0') {
            builder = builder.name(self.name.clone());
        }
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        match builder.spawn(move || data.run_in_thread()) {
            Ok(native) => {
                self.native = Some(native);
                self.latch.wait();
                assert!(self.tid() > 0, "thread {} published no tid", self.name);

                info!("Started thread {} with tid {}", self.name, self.tid());
                Ok(())
            }
            Err(err) => {
                self.started = false;
                error!("Failed to spawn thread {}: {}", self.name, err);
                Err(ThreadError::Spawn(err))
            }
        }
    }

    /// Blocks until the native thread terminates.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::Join`] if the thread ended by unwinding.
    ///
    /// # Panics
    ///
    /// Panics if the handle was never started or was already joined.
    pub fn join(&mut self) -> ThreadResult<()> {
        assert!(self.started, "thread {} joined before start", self.name);
        assert!(!self.joined, "thread {} already joined", self.name);
        self.joined = true;

        let Some(native) = self.native.take() else {
            unreachable!("started thread {} has no native handle", self.name);
        };

        debug!("Joining thread {} (tid {})", self.name, self.tid());
        native.join().map_err(|payload| {
            ThreadError::Join(PanicFailure::classify(payload.as_ref()).to_string())
        })
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.started
    }

    /// Kernel id of the native thread; 0 until `start` has succeeded.
    #[must_use]
    pub fn tid(&self) -> libc::pid_t {
        self.tid.get()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn set_default_name(&mut self) {
        let num = NUM_CREATED.increment_and_get();
        if self.name.is_empty() {
            self.name = format!("Thread{num}");
        }
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        if self.started && !self.joined {
            if let Some(native) = self.native.take() {
                debug!("Detaching unjoined thread {} (tid {})", self.name, self.tid());
                // Dropping a JoinHandle detaches the native thread.
                drop(native);
            }
        }
    }
}

impl fmt::Debug for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("name", &self.name)
            .field("tid", &self.tid())
            .field("started", &self.started)
            .field("joined", &self.joined)
            .finish_non_exhaustive()
    }
}

/// Everything the spawned thread needs to run the handshake and the user
/// function.
struct ThreadData {
    func: FuncSlot,
    name: String,
    tid: Arc<AtomicInt32>,
    latch: Arc<CountdownLatch>,
}

impl ThreadData {
    fn run_in_thread(self) {
        let Self {
            func,
            name,
            tid,
            latch,
        } = self;

        tid.get_and_set(current_thread::tid());
        latch.count_down();
        drop(latch);

        let taken = func.lock().unwrap_or_else(PoisonError::into_inner).take();
        drop(func);
        let Some(func) = taken else {
            fatal(&format!("thread {name} started without a function to run"));
        };

        current_thread::set_name(name.clone());

        match panic::catch_unwind(AssertUnwindSafe(func)) {
            Ok(()) => current_thread::set_name("finished"),
            Err(payload) => {
                current_thread::set_name("crashed");
                match PanicFailure::classify(payload.as_ref()) {
                    PanicFailure::Recognized(reason) => {
                        fatal(&format!("panic caught in thread {name}, reason: {reason}"));
                    }
                    PanicFailure::Unrecognized => {
                        fatal(&format!("unknown panic caught in thread {name}"));
                    }
                }
            }
        }
    }
}
