// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring and constructing a [`Cache`].

use std::convert::Infallible;
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::Duration;

use chime::Clock;
use moka::future::Cache as MokaCache;

use crate::Cache;
use crate::cache::Mergers;

/// Builder for a [`Cache`].
///
/// Created through [`Cache::builder`]. The clock is the only mandatory
/// piece of configuration; everything else has a sensible default: no
/// default TTL (entries never expire unless inserted with one), no capacity
/// bound, and no miss coalescing.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use chime::Clock;
/// use lapse::Cache;
///
/// let cache: Cache<String, String> = Cache::builder(Clock::system())
///     .name("listings")
///     .ttl(Duration::from_secs(300))
///     .max_capacity(10_000)
///     .coalesce_misses()
///     .build();
/// ```
#[derive(Debug)]
pub struct CacheBuilder<K, V, E = Infallible> {
    name: &'static str,
    clock: Clock,
    default_ttl: Option<Duration>,
    max_capacity: Option<u64>,
    coalesce_misses: bool,
    _marker: PhantomData<(K, V, E)>,
}

impl<K, V, E> CacheBuilder<K, V, E>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            name: "lapse",
            clock,
            default_ttl: None,
            max_capacity: None,
            coalesce_misses: false,
            _marker: PhantomData,
        }
    }

    /// Sets the cache name, used for diagnostics.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the default TTL applied to entries inserted without an explicit
    /// one.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Bounds the number of entries; once reached, the underlying store
    /// evicts by its own policy.
    #[must_use]
    pub fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Coalesces concurrent loads for the same missing key into a single
    /// execution whose outcome every caller shares.
    #[must_use]
    pub fn coalesce_misses(mut self) -> Self {
        self.coalesce_misses = true;
        self
    }

    /// Constructs the cache.
    #[must_use]
    pub fn build(self) -> Cache<K, V, E> {
        let mut store = MokaCache::builder()
            .name(self.name)
            .support_invalidation_closures();
        if let Some(max_capacity) = self.max_capacity {
            store = store.max_capacity(max_capacity);
        }

        Cache {
            name: self.name,
            store: store.build(),
            clock: self.clock,
            default_ttl: self.default_ttl,
            mergers: self.coalesce_misses.then(Mergers::new),
        }
    }
}
