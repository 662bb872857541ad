// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Coalesces concurrent duplicate async work into a single execution.
//!
//! [`Merger`] deduplicates concurrent async operations that share a key.
//! The first caller for a key (the leader) performs the work while later
//! callers (the followers) wait and receive a clone of the result. Once a
//! result has been produced the flight is retired, so a later call for the
//! same key starts a fresh execution.
//!
//! # When to use
//!
//! Use a `Merger` in front of operations that are expensive or rate limited
//! and may be requested concurrently with identical parameters:
//!
//! - Cache population on miss or expiry
//! - Remote queries issued by several screens at once
//!
//! # Cancellation
//!
//! If the leader is cancelled before it stores a result, the next waiting
//! caller promotes itself and executes its own closure. No caller is left
//! waiting on work that nobody is performing.
//!
//! # Example
//!
//! ```
//! use coalesce::Merger;
//!
//! # futures::executor::block_on(async {
//! let merger: Merger<&str, String> = Merger::new();
//!
//! let result = merger.run(&"user:123", || async {
//!     // This expensive operation runs only once, even if called concurrently.
//!     "expensive_result".to_string()
//! }).await;
//! assert_eq!(result, "expensive_result");
//! # });
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;

/// One in-flight unit of work.
///
/// The slot lock serializes the leader and its followers: the leader holds
/// the lock while computing, so followers block on `lock()` until a result
/// is available.
struct Flight<T> {
    slot: AsyncMutex<Option<T>>,
}

impl<T> Flight<T> {
    fn new() -> Self {
        Self {
            slot: AsyncMutex::new(None),
        }
    }
}

/// Represents a class of work in which concurrent duplicate executions are
/// merged into one.
///
/// Results must be `Clone` because every waiter receives its own copy of
/// the single outcome. For fallible work, use a `Result` with a cloneable
/// error type so failures are shared with waiters too (but decide at the
/// caller whether failures should be cached).
///
/// # Examples
///
/// ```
/// use coalesce::Merger;
///
/// # futures::executor::block_on(async {
/// let merger: Merger<String, u32> = Merger::new();
/// let value = merger.run(&"answer".to_string(), || async { 42 }).await;
/// assert_eq!(value, 42);
/// # });
/// ```
pub struct Merger<K, T> {
    flights: SyncMutex<HashMap<K, Arc<Flight<T>>>>,
}

impl<K, T> std::fmt::Debug for Merger<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Merger").finish_non_exhaustive()
    }
}

impl<K, T> Default for Merger<K, T> {
    fn default() -> Self {
        Self {
            flights: SyncMutex::new(HashMap::new()),
        }
    }
}

impl<K, T> Merger<K, T>
where
    K: Clone + Eq + Hash,
    T: Clone,
{
    /// Creates a new, empty merger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of flights currently in progress.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }

    /// Executes `func` for the given key, merging concurrent duplicate
    /// calls.
    ///
    /// The first caller becomes the leader and runs its closure; callers
    /// that arrive while the flight is open wait for the leader and receive
    /// a clone of its result without running their own closure. Calls that
    /// arrive after the result was delivered start a new flight.
    pub async fn run<F, Fut>(&self, key: &K, func: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let flight = {
            let mut flights = self.flights.lock();
            Arc::clone(
                flights
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Flight::new())),
            )
        };

        let mut slot = flight.slot.lock().await;
        if let Some(value) = slot.as_ref() {
            // A leader finished while we were waiting for the lock.
            return value.clone();
        }

        // Either we are the first caller for this flight, or every earlier
        // leader was cancelled before storing a result. Promote ourselves.
        let value = func().await;
        *slot = Some(value.clone());
        drop(slot);

        self.retire(key, &flight);
        value
    }

    /// Removes the flight from the map, provided the map still points at
    /// this flight (a fresh flight for the same key must not be dropped).
    fn retire(&self, key: &K, flight: &Arc<Flight<T>>) {
        let mut flights = self.flights.lock();
        if flights
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, flight))
        {
            flights.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Yields a few times so that concurrently joined siblings get polled
    /// while this future is suspended.
    async fn breathe() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_execution() {
        let merger: Merger<String, u64> = Merger::new();
        let calls = AtomicUsize::new(0);
        let key = "shared".to_string();

        let (a, b, c) = tokio::join!(
            merger.run(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                breathe().await;
                7
            }),
            merger.run(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                7
            }),
            merger.run(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                7
            }),
        );

        assert_eq!((a, b, c), (7, 7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(merger.in_flight(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_merge() {
        let merger: Merger<String, u64> = Merger::new();
        let calls = AtomicUsize::new(0);
        let left = "left".to_string();
        let right = "right".to_string();

        let (a, b) = tokio::join!(
            merger.run(&left, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                breathe().await;
                1
            }),
            merger.run(&right, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                breathe().await;
                2
            }),
        );

        assert_eq!((a, b), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sequential_calls_each_execute() {
        let merger: Merger<String, u64> = Merger::new();
        let calls = AtomicUsize::new(0);
        let key = "again".to_string();

        let first = merger
            .run(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                1
            })
            .await;
        let second = merger
            .run(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                2
            })
            .await;

        assert_eq!((first, second), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn follower_promotes_when_leader_is_cancelled() {
        let merger: Merger<String, u64> = Merger::new();
        let key = "flaky".to_string();

        {
            let mut leader = Box::pin(merger.run(&key, || std::future::pending::<u64>()));
            // Poll once so the leader claims the flight, then drop it.
            assert!(futures::poll!(leader.as_mut()).is_pending());
        }

        let value = merger.run(&key, || async { 11 }).await;
        assert_eq!(value, 11);
        assert_eq!(merger.in_flight(), 0);
    }
}
