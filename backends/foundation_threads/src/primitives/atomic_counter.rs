//! Lock-free fixed-width integer counters.
//!
//! Every operation uses `SeqCst` ordering and wraps on overflow like the
//! underlying hardware fetch-add.
//!
//! # Examples
//!
//! ```
//! use foundation_threads::primitives::AtomicInt64;
//!
//! let counter = AtomicInt64::new();
//! assert_eq!(counter.get_and_add(1), 0);
//! assert_eq!(counter.add_and_get(2), 3);
//! assert_eq!(counter.get_and_set(100), 3);
//! assert_eq!(counter.get(), 100);
//! ```

use core::fmt;
use core::sync::atomic::{AtomicI32, AtomicI64, Ordering};

macro_rules! atomic_counter {
    ($(#[$meta:meta])* $name:ident, $atomic:ty, $value:ty) => {
        $(#[$meta])*
        pub struct $name {
            value: $atomic,
        }

        impl $name {
            /// Creates a counter holding zero.
            #[inline]
            #[must_use]
            pub const fn new() -> Self {
                Self {
                    value: <$atomic>::new(0),
                }
            }

            /// Returns the current value.
            #[inline]
            #[must_use]
            pub fn get(&self) -> $value {
                self.value.load(Ordering::SeqCst)
            }

            /// Adds `x` and returns the value held before the addition.
            #[inline]
            pub fn get_and_add(&self, x: $value) -> $value {
                self.value.fetch_add(x, Ordering::SeqCst)
            }

            /// Adds `x` and returns the value produced by this addition.
            ///
            /// Computed from the pre-update value, so concurrent adders never
            /// observe each other's sums here.
            #[inline]
            pub fn add_and_get(&self, x: $value) -> $value {
                self.get_and_add(x).wrapping_add(x)
            }

            #[inline]
            pub fn increment_and_get(&self) -> $value {
                self.add_and_get(1)
            }

            #[inline]
            pub fn decrement_and_get(&self) -> $value {
                self.add_and_get(-1)
            }

            #[inline]
            pub fn add(&self, x: $value) {
                self.get_and_add(x);
            }

            #[inline]
            pub fn increment(&self) {
                self.increment_and_get();
            }

            #[inline]
            pub fn decrement(&self) {
                self.decrement_and_get();
            }

            /// Replaces the value and returns the previous one.
            #[inline]
            pub fn get_and_set(&self, new_value: $value) -> $value {
                self.value.swap(new_value, Ordering::SeqCst)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }
    };
}

atomic_counter!(
    /// A 32-bit signed counter updated only through atomic operations.
    AtomicInt32,
    AtomicI32,
    i32
);

atomic_counter!(
    /// A 64-bit signed counter updated only through atomic operations.
    AtomicInt64,
    AtomicI64,
    i64
);
