// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured cache keys.
//!
//! A key is the operation plus its parameters, as a value — never a
//! formatted string. That keeps invalidation exact: dropping the entries
//! for wallpaper `42` cannot touch wallpaper `420`, which substring-matched
//! keys could not guarantee.

/// The cache key for one catalog query.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum QueryKey {
    /// The featured rail, bounded to `limit` items.
    Featured {
        /// Maximum number of items.
        limit: usize,
    },
    /// The newest wallpapers across all categories.
    Newest {
        /// Maximum number of items.
        limit: usize,
    },
    /// The most downloaded wallpapers across all categories.
    Popular {
        /// Maximum number of items.
        limit: usize,
    },
    /// The full category list.
    Categories,
    /// A single category.
    Category {
        /// Category identifier.
        id: String,
    },
    /// A single wallpaper.
    Wallpaper {
        /// Wallpaper identifier.
        id: String,
    },
    /// The first page of a category's wallpapers.
    WallpapersByCategory {
        /// Category identifier.
        category_id: String,
        /// Maximum number of items.
        limit: usize,
    },
    /// Wallpapers related to one wallpaper (same category, excluding it).
    Related {
        /// The wallpaper the results relate to.
        wallpaper_id: String,
        /// Maximum number of items.
        limit: usize,
    },
    /// The number of wallpapers in a category.
    CountForCategory {
        /// Category identifier.
        category_id: String,
    },
    /// A search, by normalized term.
    Search {
        /// The term, trimmed and lower-cased.
        term: String,
        /// Maximum number of items.
        limit: usize,
    },
}

impl QueryKey {
    /// Creates a search key with the term normalized the way the search
    /// queries expect it: trimmed and lower-cased, so `"Sky "` and `"sky"`
    /// share a cache entry.
    #[must_use]
    pub fn search(term: &str, limit: usize) -> Self {
        Self::Search {
            term: term.trim().to_lowercase(),
            limit,
        }
    }

    /// The family this key belongs to, which decides its time-to-live.
    #[must_use]
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Categories | Self::Category { .. } => KeyFamily::Categories,
            Self::Featured { .. } => KeyFamily::Featured,
            Self::Search { .. } => KeyFamily::Search,
            Self::Newest { .. }
            | Self::Popular { .. }
            | Self::Wallpaper { .. }
            | Self::WallpapersByCategory { .. }
            | Self::Related { .. }
            | Self::CountForCategory { .. } => KeyFamily::Wallpapers,
        }
    }

    /// Whether this key's cached value is derived from the given wallpaper
    /// specifically, and must be dropped when that wallpaper is mutated.
    #[must_use]
    pub fn mentions(&self, wallpaper_id: &str) -> bool {
        match self {
            Self::Wallpaper { id } => id == wallpaper_id,
            Self::Related { wallpaper_id: own, .. } => own == wallpaper_id,
            _ => false,
        }
    }
}

/// Key families, each with its own staleness tolerance.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum KeyFamily {
    /// Category data; changes rarely.
    Categories,
    /// Wallpaper data: single items, listings, and counts.
    Wallpapers,
    /// The featured rail; curated, so kept fresher than plain listings.
    Featured,
    /// Search results; the most volatile.
    Search,
}
