// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A small injectable clock.
//!
//! Code that checks freshness windows is hard to test against the real
//! operating-system clock. This crate provides a [`Clock`] handle that
//! production code constructs with [`Clock::system`], while tests construct
//! one through [`ClockControl`] (behind the `test-util` feature) and move
//! time forward explicitly.
//!
//! Cloning a clock is inexpensive, and every clone of a controlled clock
//! shares the same underlying state: advancing time through one handle is
//! visible to all others.
//!
//! # Examples
//!
//! ```
//! use chime::Clock;
//!
//! let clock = Clock::system();
//! let earlier = clock.now();
//! assert!(clock.now() >= earlier);
//! ```

mod clock;
#[cfg(any(test, feature = "test-util"))]
mod control;

pub use clock::Clock;
#[cfg(any(test, feature = "test-util"))]
pub use control::ClockControl;
