// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

/// A cached value with the metadata needed to decide freshness.
///
/// An entry is valid while `now - stored_at <= ttl`. An entry without a TTL
/// never expires on its own and can only be removed by invalidation.
#[derive(Clone, Debug)]
pub(crate) struct Entry<V> {
    value: V,
    stored_at: SystemTime,
    ttl: Option<Duration>,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, stored_at: SystemTime, ttl: Option<Duration>) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    /// Whether the entry has outlived its freshness window at `now`.
    ///
    /// If the clock went backwards relative to `stored_at`, the entry is
    /// considered expired; a cache serving data stamped in the future is
    /// worse than an extra fetch.
    pub(crate) fn is_expired(&self, now: SystemTime) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        match now.duration_since(self.stored_at) {
            Ok(elapsed) => elapsed > ttl,
            Err(_) => true,
        }
    }

    pub(crate) fn into_value(self) -> V {
        self.value
    }
}
