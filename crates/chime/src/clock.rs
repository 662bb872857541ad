// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

#[cfg(any(test, feature = "test-util"))]
use std::sync::Arc;

#[cfg(any(test, feature = "test-util"))]
use parking_lot::Mutex;

/// Provides the current absolute time.
///
/// A `Clock` is either backed by the operating-system clock
/// ([`Clock::system`]) or, when the `test-util` feature is enabled, by a
/// manually controlled time source created through
/// [`ClockControl`](crate::ClockControl).
///
/// Components that depend on time take a `Clock` by value at construction
/// and keep a clone; they never read `SystemTime::now()` directly. This is
/// what makes freshness windows testable.
///
/// # Examples
///
/// ```
/// use chime::Clock;
///
/// fn age_of(clock: &Clock, stored_at: std::time::SystemTime) -> std::time::Duration {
///     clock.now().duration_since(stored_at).unwrap_or_default()
/// }
///
/// let clock = Clock::system();
/// let _ = age_of(&clock, clock.now());
/// ```
#[derive(Clone, Debug)]
pub struct Clock(pub(crate) Inner);

#[derive(Clone, Debug)]
pub(crate) enum Inner {
    System,
    #[cfg(any(test, feature = "test-util"))]
    Manual(Arc<Mutex<SystemTime>>),
}

impl Clock {
    /// Creates a clock backed by the operating-system clock.
    #[must_use]
    pub fn system() -> Self {
        Self(Inner::System)
    }

    /// Creates a controlled clock frozen at the UNIX epoch.
    ///
    /// Time does not pass until a [`ClockControl`](crate::ClockControl)
    /// attached to the same state advances it. This is a shorthand for
    /// `ClockControl::new().to_clock()` for tests that never need to move
    /// time.
    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    pub fn new_frozen() -> Self {
        crate::ClockControl::new().to_clock()
    }

    /// Returns the current absolute time in UTC.
    ///
    /// Absolute time is not monotonic: for a system clock it can be affected
    /// by clock adjustments, and a controlled clock moves only when told to.
    /// Callers comparing two readings must tolerate `duration_since`
    /// failing.
    #[must_use]
    pub fn now(&self) -> SystemTime {
        match &self.0 {
            Inner::System => SystemTime::now(),
            #[cfg(any(test, feature = "test-util"))]
            Inner::Manual(state) => *state.lock(),
        }
    }
}
