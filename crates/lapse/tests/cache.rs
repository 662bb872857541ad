// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Behavioral tests for the cache: freshness windows, invalidation, and
//! read-through loading.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chime::ClockControl;
use lapse::Cache;

/// A structured key in the shape consumers use: an operation plus its
/// parameters.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
enum TestKey {
    Item { id: u32 },
    List { page: u32 },
}

impl TestKey {
    fn mentions(&self, id: u32) -> bool {
        matches!(self, Self::Item { id: own } if *own == id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("fetch failed")]
struct FetchFailed;

fn controlled_cache<V>(ttl: Duration) -> (Cache<TestKey, V, FetchFailed>, ClockControl)
where
    V: Clone + Send + Sync + 'static,
{
    let control = ClockControl::new();
    let cache = Cache::builder(control.to_clock()).name("test").ttl(ttl).build();
    (cache, control)
}

#[tokio::test]
async fn insert_then_get_returns_the_value() {
    let (cache, _control) = controlled_cache::<String>(Duration::from_secs(300));
    let key = TestKey::Item { id: 1 };

    cache.insert(&key, "alpine lake".to_string()).await;
    assert_eq!(cache.get(&key).await.as_deref(), Some("alpine lake"));
}

#[tokio::test]
async fn entry_expires_after_its_window() {
    let ttl = Duration::from_secs(300);
    let (cache, control) = controlled_cache::<String>(ttl);
    let key = TestKey::Item { id: 1 };

    cache.insert(&key, "dunes".to_string()).await;

    // Still valid at exactly the window edge.
    control.advance(ttl);
    assert!(cache.contains(&key).await);

    control.advance(Duration::from_secs(1));
    assert_eq!(cache.get(&key).await, None);
}

#[tokio::test]
async fn per_entry_ttl_overrides_the_default() {
    let (cache, control) = controlled_cache::<String>(Duration::from_secs(300));
    let key = TestKey::List { page: 0 };

    cache
        .insert_with_ttl(&key, "page".to_string(), Duration::from_secs(120))
        .await;

    control.advance(Duration::from_secs(121));
    assert_eq!(cache.get(&key).await, None);
}

#[tokio::test]
async fn overwriting_restarts_the_window() {
    let ttl = Duration::from_secs(300);
    let (cache, control) = controlled_cache::<u32>(ttl);
    let key = TestKey::Item { id: 9 };

    cache.insert(&key, 1).await;
    control.advance(Duration::from_secs(200));
    cache.insert(&key, 2).await;
    control.advance(Duration::from_secs(200));

    // 400 seconds after the first insert, but only 200 after the overwrite.
    assert_eq!(cache.get(&key).await, Some(2));
}

#[tokio::test]
async fn invalidate_removes_only_the_exact_key() {
    let (cache, _control) = controlled_cache::<u32>(Duration::from_secs(300));
    let kept = TestKey::Item { id: 2 };
    let dropped = TestKey::Item { id: 1 };

    cache.insert(&kept, 2).await;
    cache.insert(&dropped, 1).await;
    cache.invalidate(&dropped).await;

    assert_eq!(cache.get(&dropped).await, None);
    assert_eq!(cache.get(&kept).await, Some(2));
}

#[tokio::test]
async fn invalidate_when_drops_matching_keys_and_no_others() {
    let (cache, _control) = controlled_cache::<u32>(Duration::from_secs(300));

    // Structured keys cannot collide the way substring matching did: item
    // 42 and item 420 are distinct values, not overlapping strings.
    cache.insert(&TestKey::Item { id: 42 }, 42).await;
    cache.insert(&TestKey::Item { id: 420 }, 420).await;
    cache.insert(&TestKey::List { page: 42 }, 0).await;

    cache.invalidate_when(|key| key.mentions(42));

    assert_eq!(cache.get(&TestKey::Item { id: 42 }).await, None);
    assert_eq!(cache.get(&TestKey::Item { id: 420 }).await, Some(420));
    assert_eq!(cache.get(&TestKey::List { page: 42 }).await, Some(0));
}

#[tokio::test]
async fn clear_drops_everything() {
    let (cache, _control) = controlled_cache::<u32>(Duration::from_secs(300));

    cache.insert(&TestKey::Item { id: 1 }, 1).await;
    cache.insert(&TestKey::List { page: 1 }, 2).await;
    cache.clear();

    assert_eq!(cache.get(&TestKey::Item { id: 1 }).await, None);
    assert_eq!(cache.get(&TestKey::List { page: 1 }).await, None);
}

#[tokio::test]
async fn fetch_populates_on_miss_and_serves_from_cache_after() {
    let (cache, _control) = controlled_cache::<String>(Duration::from_secs(300));
    let key = TestKey::Item { id: 5 };
    let loads = AtomicUsize::new(0);

    let load = || async {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok::<_, FetchFailed>("fetched".to_string())
    };

    let first = cache.try_get_or_fetch(&key, None, load).await;
    assert_eq!(first.as_deref(), Ok("fetched"));

    let second = cache
        .try_get_or_fetch(&key, None, || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FetchFailed>("never used".to_string())
        })
        .await;
    assert_eq!(second.as_deref(), Ok("fetched"));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_failure_is_not_cached() {
    let (cache, _control) = controlled_cache::<String>(Duration::from_secs(300));
    let key = TestKey::Item { id: 6 };

    let failed = cache
        .try_get_or_fetch(&key, None, || async { Err::<String, _>(FetchFailed) })
        .await;
    assert!(failed.is_err());

    // The next call retries and can succeed.
    let recovered = cache
        .try_get_or_fetch(&key, None, || async {
            Ok::<_, FetchFailed>("second try".to_string())
        })
        .await;
    assert_eq!(recovered.as_deref(), Ok("second try"));
}

#[tokio::test]
async fn absent_results_are_not_cached() {
    let (cache, _control) = controlled_cache::<String>(Duration::from_secs(300));
    let key = TestKey::Item { id: 7 };

    let missing = cache
        .try_optionally_get_or_fetch(&key, None, || async { Ok::<_, FetchFailed>(None) })
        .await;
    assert_eq!(missing, Ok(None));

    let found = cache
        .try_optionally_get_or_fetch(&key, None, || async {
            Ok::<_, FetchFailed>(Some("late arrival".to_string()))
        })
        .await;
    assert_eq!(found, Ok(Some("late arrival".to_string())));
    assert!(cache.contains(&key).await);
}

#[tokio::test]
async fn explicit_fetch_ttl_governs_the_entry() {
    let (cache, control) = controlled_cache::<String>(Duration::from_secs(300));
    let key = TestKey::List { page: 3 };

    let loaded = cache
        .try_get_or_fetch(&key, Some(Duration::from_secs(120)), || async {
            Ok::<_, FetchFailed>("short lived".to_string())
        })
        .await;
    assert!(loaded.is_ok());

    control.advance(Duration::from_secs(121));
    assert_eq!(cache.get(&key).await, None);
}

#[tokio::test]
async fn coalesced_misses_share_one_load() {
    let control = ClockControl::new();
    let cache: Cache<TestKey, u32, FetchFailed> = Cache::builder(control.to_clock())
        .name("coalesced")
        .ttl(Duration::from_secs(300))
        .coalesce_misses()
        .build();
    let key = TestKey::Item { id: 8 };
    let loads = AtomicUsize::new(0);

    let slow_load = || async {
        loads.fetch_add(1, Ordering::SeqCst);
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        Ok::<_, FetchFailed>(99)
    };
    let fast_load = || async {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok::<_, FetchFailed>(99)
    };

    let (a, b) = tokio::join!(
        cache.try_get_or_fetch(&key, None, slow_load),
        cache.try_get_or_fetch(&key, None, fast_load),
    );

    assert_eq!((a, b), (Ok(99), Ok(99)));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}
