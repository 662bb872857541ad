// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A read-through cache with per-entry time-to-live expiry.
//!
//! This crate provides a cache keyed by structured values (any `Eq + Hash`
//! type, typically an enum of operation plus parameters) with:
//!
//! - Per-entry TTL stamped from an injected [`chime::Clock`], so freshness
//!   is deterministic under test
//! - Lazy expiry: an entry past its window is treated as absent and evicted
//!   by the read that observes it; there is no background sweep
//! - Exact-key invalidation and predicate ([`Cache::invalidate_when`])
//!   invalidation for dropping whole key families
//! - Read-through loading ([`Cache::try_get_or_fetch`] and
//!   [`Cache::try_optionally_get_or_fetch`]) with optional coalescing of
//!   concurrent misses through [`coalesce::Merger`]
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use chime::Clock;
//! use lapse::Cache;
//!
//! # futures::executor::block_on(async {
//! let cache: Cache<String, u32> = Cache::builder(Clock::system())
//!     .ttl(Duration::from_secs(60))
//!     .build();
//!
//! cache.insert(&"answer".to_string(), 42).await;
//! assert_eq!(cache.get(&"answer".to_string()).await, Some(42));
//!
//! cache.invalidate(&"answer".to_string()).await;
//! assert_eq!(cache.get(&"answer".to_string()).await, None);
//! # });
//! ```

mod builder;
mod cache;
mod entry;

pub use builder::CacheBuilder;
pub use cache::Cache;
