// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache type with TTL expiry, structured invalidation, and coalesced
//! read-through loading.

use std::convert::Infallible;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use chime::Clock;
use coalesce::Merger;
use moka::future::Cache as MokaCache;

use crate::builder::CacheBuilder;
use crate::entry::Entry;

/// Mergers for coalescing concurrent misses, one per loading operation so
/// that result types stay concrete.
/// Only created when `coalesce_misses` is enabled.
pub(crate) struct Mergers<K, V, E> {
    pub(crate) fetch: Merger<K, Result<V, E>>,
    pub(crate) optional_fetch: Merger<K, Result<Option<V>, E>>,
}

impl<K, V, E> Mergers<K, V, E>
where
    K: Clone + Eq + Hash,
    V: Clone,
    E: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            fetch: Merger::new(),
            optional_fetch: Merger::new(),
        }
    }
}

impl<K, V, E> Debug for Mergers<K, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mergers").finish_non_exhaustive()
    }
}

/// A cache of structured keys to values, with per-entry TTL.
///
/// Entries are stamped with the time of insertion read from the injected
/// [`Clock`]; a read that finds an entry past its window treats it as
/// absent and evicts it. Invalidation is by exact key or by predicate over
/// keys ([`invalidate_when`](Self::invalidate_when)) so that a whole family
/// of related keys can be dropped without string matching.
///
/// The third type parameter is the error type loaders may fail with; it
/// must be `Clone` because a coalesced failure is shared with every waiting
/// caller. Caches that never load can leave it defaulted.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use chime::Clock;
/// use lapse::Cache;
///
/// # futures::executor::block_on(async {
/// let cache: Cache<String, u32> = Cache::builder(Clock::system())
///     .ttl(Duration::from_secs(60))
///     .build();
///
/// cache.insert(&"key".to_string(), 1).await;
/// assert_eq!(cache.get(&"key".to_string()).await, Some(1));
/// # });
/// ```
pub struct Cache<K, V, E = Infallible> {
    pub(crate) name: &'static str,
    pub(crate) store: MokaCache<K, Entry<V>>,
    pub(crate) clock: Clock,
    pub(crate) default_ttl: Option<Duration>,
    pub(crate) mergers: Option<Mergers<K, V, E>>,
}

impl<K, V, E> Debug for Cache<K, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("default_ttl", &self.default_ttl)
            .field("coalesce_misses", &self.mergers.is_some())
            .finish_non_exhaustive()
    }
}

impl<K, V, E> Cache<K, V, E>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates a new cache builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use chime::Clock;
    /// use lapse::Cache;
    ///
    /// let cache: Cache<String, u32> = Cache::builder(Clock::system())
    ///     .name("wallpapers")
    ///     .ttl(Duration::from_secs(300))
    ///     .coalesce_misses()
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder(clock: Clock) -> CacheBuilder<K, V, E> {
        CacheBuilder::new(clock)
    }

    /// Returns the name of this cache, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns a reference to the cache's clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Retrieves a value, treating expired entries as absent.
    ///
    /// An expired entry is evicted by this read; there is no background
    /// sweep.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entry = self.store.get(key).await?;
        if entry.is_expired(self.clock.now()) {
            self.store.invalidate(key).await;
            return None;
        }
        Some(entry.into_value())
    }

    /// Inserts a value with the cache's default TTL, overwriting any prior
    /// entry for the key.
    pub async fn insert(&self, key: &K, value: V) {
        self.insert_entry(key, value, self.default_ttl).await;
    }

    /// Inserts a value with an explicit TTL, overwriting any prior entry
    /// for the key.
    pub async fn insert_with_ttl(&self, key: &K, value: V, ttl: Duration) {
        self.insert_entry(key, value, Some(ttl)).await;
    }

    async fn insert_entry(&self, key: &K, value: V, ttl: Option<Duration>) {
        let entry = Entry::new(value, self.clock.now(), ttl);
        self.store.insert(key.clone(), entry).await;
    }

    /// Removes the entry for the given key, if any.
    pub async fn invalidate(&self, key: &K) {
        self.store.invalidate(key).await;
    }

    /// Removes every entry whose key matches the predicate.
    ///
    /// This is the structured replacement for substring-based key matching:
    /// the predicate sees the typed key, so `wallpaper 42` and
    /// `wallpaper 420` can only be confused if the predicate confuses them.
    pub fn invalidate_when<F>(&self, predicate: F)
    where
        F: Fn(&K) -> bool + Send + Sync + 'static,
    {
        let _id = self
            .store
            .invalidate_entries_if(move |key, _entry| predicate(key))
            .expect("invalidation closures are enabled at construction");
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.store.invalidate_all();
    }

    /// Returns true if a fresh entry exists for the key.
    pub async fn contains(&self, key: &K) -> bool {
        self.get(key).await.is_some()
    }

    /// Returns the approximate number of entries, including entries that
    /// are expired but not yet evicted.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.store.entry_count()
    }

    /// Retrieves a value, or loads and caches it if missing.
    ///
    /// On a miss the loader runs, and only an `Ok` result is cached (with
    /// `ttl`, falling back to the cache default when `None`); an `Err` is
    /// returned to the caller and the next call retries. When
    /// [`coalesce_misses`](crate::CacheBuilder::coalesce_misses) is enabled,
    /// concurrent calls for the same missing key share one loader execution
    /// and one outcome, errors included.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, possibly produced by a coalesced sibling
    /// call rather than this caller's own closure.
    pub async fn try_get_or_fetch<F, Fut>(
        &self,
        key: &K,
        ttl: Option<Duration>,
        f: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        match &self.mergers {
            Some(mergers) => {
                mergers
                    .fetch
                    .run(key, || self.do_try_get_or_fetch(key, ttl, f))
                    .await
            }
            None => self.do_try_get_or_fetch(key, ttl, f).await,
        }
    }

    async fn do_try_get_or_fetch<F, Fut>(
        &self,
        key: &K,
        ttl: Option<Duration>,
        f: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        let value = f().await?;
        self.insert_entry(key, value.clone(), ttl.or(self.default_ttl))
            .await;
        Ok(value)
    }

    /// Retrieves a value, or conditionally loads and caches it.
    ///
    /// Like [`try_get_or_fetch`](Self::try_get_or_fetch), but the loader
    /// may report absence: only `Ok(Some)` results are cached. `Ok(None)`
    /// is returned without caching, so a later call retries the load.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, possibly produced by a coalesced sibling
    /// call rather than this caller's own closure.
    pub async fn try_optionally_get_or_fetch<F, Fut>(
        &self,
        key: &K,
        ttl: Option<Duration>,
        f: F,
    ) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        match &self.mergers {
            Some(mergers) => {
                mergers
                    .optional_fetch
                    .run(key, || self.do_try_optionally_get_or_fetch(key, ttl, f))
                    .await
            }
            None => self.do_try_optionally_get_or_fetch(key, ttl, f).await,
        }
    }

    async fn do_try_optionally_get_or_fetch<F, Fut>(
        &self,
        key: &K,
        ttl: Option<Duration>,
        f: F,
    ) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(Some(value));
        }
        match f().await? {
            Some(value) => {
                self.insert_entry(key, value.clone(), ttl.or(self.default_ttl))
                    .await;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
