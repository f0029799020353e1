use std::any::Any;
use std::io;
use std::panic::Location;

use derive_more::From;

pub type ThreadResult<T> = std::result::Result<T, ThreadError>;

// region -- ThreadError

/// Recoverable failures reported by [`crate::thread::ThreadHandle`].
#[derive(From, Debug)]
pub enum ThreadError {
    /// The native thread could not be created; the handle stays unstarted.
    Spawn(io::Error),

    /// The native thread ended by unwinding instead of returning.
    #[from(ignore)]
    Join(String),
}

impl Eq for ThreadError {}

impl PartialEq for ThreadError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Spawn(m1), Self::Spawn(m2)) => m1.kind() == m2.kind(),
            (Self::Join(m1), Self::Join(m2)) => m1 == m2,
            _ => false,
        }
    }
}

impl std::error::Error for ThreadError {}

impl core::fmt::Display for ThreadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn native thread: {err}"),
            Self::Join(reason) => write!(f, "native thread terminated abnormally: {reason}"),
        }
    }
}

// end region -- ThreadError

// region -- PanicFailure

/// Classification of a panic payload caught at the thread trampoline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanicFailure {
    /// Payload carried a message (`panic!("...")` produces `&str` or `String`).
    Recognized(String),

    /// Payload of a type the trampoline cannot describe (`panic_any`).
    Unrecognized,
}

impl PanicFailure {
    #[must_use]
    pub fn classify(payload: &(dyn Any + Send)) -> Self {
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            return Self::Recognized((*message).to_string());
        }
        if let Some(message) = payload.downcast_ref::<String>() {
            return Self::Recognized(message.clone());
        }
        Self::Unrecognized
    }
}

impl core::fmt::Display for PanicFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recognized(reason) => write!(f, "{reason}"),
            Self::Unrecognized => write!(f, "<unknown panic payload>"),
        }
    }
}

// end region -- PanicFailure

// region -- fatal path

/// Writes a diagnostic to the tracing pipeline and stderr, then aborts.
///
/// Used for failures the primitives cannot continue past. The stderr copy
/// is unconditional so the reason survives when no subscriber is installed.
#[cold]
#[track_caller]
pub(crate) fn fatal(message: &str) -> ! {
    let caller = Location::caller();
    tracing::error!(file = caller.file(), line = caller.line(), "{message}");
    eprintln!("File:{}, Line:{}, {message}", caller.file(), caller.line());
    std::process::abort()
}

/// Aborts the process when a pthread call reports anything other than success.
#[inline]
#[track_caller]
pub(crate) fn check_pthread(label: &str, result: libc::c_int) {
    if result != 0 {
        let reason = io::Error::from_raw_os_error(result);
        fatal(&format!("pthread {label}: {reason}"));
    }
}

// end region -- fatal path
