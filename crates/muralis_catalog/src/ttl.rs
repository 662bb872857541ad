// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::key::{KeyFamily, QueryKey};

/// Per-family freshness windows.
///
/// The defaults encode how quickly each kind of data goes stale in
/// practice: categories barely change, listings drift as wallpapers are
/// added, the featured rail is curated, and search results are the most
/// volatile.
///
/// A policy is plain data; construct one with struct update syntax to
/// override a single window:
///
/// ```
/// use std::time::Duration;
///
/// use muralis_catalog::TtlPolicy;
///
/// let policy = TtlPolicy {
///     search: Duration::from_secs(30),
///     ..TtlPolicy::default()
/// };
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Window for category data.
    pub categories: Duration,
    /// Window for wallpaper items, listings, and counts.
    pub wallpapers: Duration,
    /// Window for the featured rail.
    pub featured: Duration,
    /// Window for search results.
    pub search: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            categories: Duration::from_secs(10 * 60),
            wallpapers: Duration::from_secs(5 * 60),
            featured: Duration::from_secs(3 * 60),
            search: Duration::from_secs(2 * 60),
        }
    }
}

impl TtlPolicy {
    /// The window for one key family.
    #[must_use]
    pub fn for_family(&self, family: KeyFamily) -> Duration {
        match family {
            KeyFamily::Categories => self.categories,
            KeyFamily::Wallpapers => self.wallpapers,
            KeyFamily::Featured => self.featured,
            KeyFamily::Search => self.search,
        }
    }

    /// The window for one key.
    #[must_use]
    pub fn for_key(&self, key: &QueryKey) -> Duration {
        self.for_family(key.family())
    }
}
