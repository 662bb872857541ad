// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

use crate::Clock;
use crate::clock::Inner;

/// Controls the flow of time in tests.
///
/// `ClockControl` owns a manually advanced time source. Clocks produced by
/// [`to_clock`](Self::to_clock) read that source, so a test can insert an
/// entry, jump past its freshness window with [`advance`](Self::advance),
/// and observe expiry without waiting for real time to pass.
///
/// `ClockControl` is available when the `test-util` feature is enabled.
/// Never enable that feature outside of `dev-dependencies`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use chime::ClockControl;
///
/// let control = ClockControl::new();
/// let clock = control.to_clock();
///
/// let before = clock.now();
/// control.advance(Duration::from_secs(60));
/// assert_eq!(clock.now().duration_since(before).unwrap(), Duration::from_secs(60));
/// ```
#[derive(Clone, Debug)]
pub struct ClockControl {
    /// Time control must be consistent across threads, so the current time
    /// lives behind a shared lock rather than a per-handle copy.
    state: Arc<Mutex<SystemTime>>,
}

impl Default for ClockControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockControl {
    /// Creates a control whose clocks start at the UNIX epoch.
    #[must_use]
    pub fn new() -> Self {
        Self::new_at(SystemTime::UNIX_EPOCH)
    }

    /// Creates a control whose clocks start at the given time.
    #[must_use]
    pub fn new_at(start: SystemTime) -> Self {
        Self {
            state: Arc::new(Mutex::new(start)),
        }
    }

    /// Returns a clock that reads this control's time.
    ///
    /// Every clock returned from the same control shares state.
    #[must_use]
    pub fn to_clock(&self) -> Clock {
        Clock(Inner::Manual(Arc::clone(&self.state)))
    }

    /// Moves time forward by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.state.lock();
        *now += duration;
    }

    /// Sets time to an absolute value.
    ///
    /// Setting time backwards is allowed; components treat a backwards jump
    /// the same as staleness.
    pub fn set_to(&self, time: SystemTime) {
        *self.state.lock() = time;
    }

    /// Returns the control's current time.
    #[must_use]
    pub fn now(&self) -> SystemTime {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_attached_clocks() {
        let control = ClockControl::new();
        let clock = control.to_clock();

        control.advance(Duration::from_secs(90));
        assert_eq!(
            clock.now(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(90)
        );
    }

    #[test]
    fn set_to_can_move_backwards() {
        let control = ClockControl::new_at(SystemTime::UNIX_EPOCH + Duration::from_secs(100));
        let clock = control.to_clock();

        control.set_to(SystemTime::UNIX_EPOCH);
        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn controls_are_independent() {
        let first = ClockControl::new();
        let second = ClockControl::new();

        first.advance(Duration::from_secs(5));
        assert_eq!(second.to_clock().now(), SystemTime::UNIX_EPOCH);
    }
}
