// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Locally persisted favorites with a short-lived in-process mirror.
//!
//! [`FavoritesStore`] keeps a user's favorited wallpaper identifiers as an
//! ordered list (insertion order is favoriting order), persisted as one
//! JSON blob under a single key of a [`BlobStore`]. Reads are served from
//! an in-process mirror for up to five minutes to avoid redundant
//! deserialization; every mutation rewrites the blob and refreshes the
//! mirror synchronously, so a stale mirror can only ever be observed
//! before the first mutation.
//!
//! Persistence failures propagate: favorites are the only locally
//! authoritative state in the application, and surfacing a failed edit
//! beats silently losing it.
//!
//! # Examples
//!
//! ```
//! use chime::Clock;
//! use muralis_favorites::FavoritesStore;
//! use muralis_store::testing::MemoryBlobs;
//!
//! # futures::executor::block_on(async {
//! let favorites = FavoritesStore::new(MemoryBlobs::new(), Clock::system());
//!
//! let toggled = favorites.toggle("w42").await?;
//! assert!(toggled.is_favorite);
//! assert!(favorites.is_favorite("w42").await?);
//! # Ok::<(), muralis_favorites::FavoritesError>(())
//! # });
//! ```

use std::time::{Duration, SystemTime};

use chime::Clock;
use muralis_store::{BlobError, BlobStore};
use parking_lot::Mutex;

/// Storage key the serialized list lives under.
const STORAGE_KEY: &str = "favorites";

/// How long the in-process mirror is trusted before the blob is re-read.
const MIRROR_WINDOW: Duration = Duration::from_secs(5 * 60);

/// An error from the favorites store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FavoritesError {
    /// The underlying blob store failed.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The persisted list could not be decoded.
    ///
    /// The stored blob is left untouched so nothing is lost; the caller
    /// decides whether to clear it.
    #[error("stored favorites are corrupt: {reason}")]
    Corrupt {
        /// The decoder's description of the problem.
        reason: String,
    },
}

/// The outcome of toggling a favorite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toggle {
    /// Whether the identifier is a favorite after the toggle.
    pub is_favorite: bool,
    /// Human-readable status for the UI.
    pub message: String,
}

/// The mirror: the last list read from or written to storage, and when.
#[derive(Clone, Debug)]
struct Mirror {
    ids: Vec<String>,
    loaded_at: SystemTime,
}

/// Persists favorited identifiers locally, with a freshness-bounded
/// in-process mirror.
///
/// Constructed once per process and shared by reference; the mirror is the
/// only mutable state and lives behind a lock.
#[derive(Debug)]
pub struct FavoritesStore<B> {
    blobs: B,
    clock: Clock,
    window: Duration,
    mirror: Mutex<Option<Mirror>>,
}

impl<B> FavoritesStore<B>
where
    B: BlobStore,
{
    /// Creates a store over the given blob storage, with the standard
    /// five-minute mirror window.
    #[must_use]
    pub fn new(blobs: B, clock: Clock) -> Self {
        Self::with_window(blobs, clock, MIRROR_WINDOW)
    }

    /// Creates a store with an explicit mirror window.
    #[must_use]
    pub fn with_window(blobs: B, clock: Clock, window: Duration) -> Self {
        Self {
            blobs,
            clock,
            window,
            mirror: Mutex::new(None),
        }
    }

    /// Returns the favorited identifiers, oldest first.
    ///
    /// Served from the mirror while it is fresh; otherwise the blob is
    /// re-read and the mirror refreshed.
    ///
    /// # Errors
    ///
    /// Propagates blob-store failures and [`FavoritesError::Corrupt`] when
    /// the persisted blob does not decode.
    pub async fn favorites(&self) -> Result<Vec<String>, FavoritesError> {
        if let Some(ids) = self.fresh_mirror() {
            return Ok(ids);
        }
        tracing::debug!("favorites mirror stale, reloading from storage");
        let ids = self.load().await?;
        self.remember(ids.clone());
        Ok(ids)
    }

    /// Whether the identifier is currently favorited.
    ///
    /// # Errors
    ///
    /// Propagates the same failures as [`favorites`](Self::favorites).
    pub async fn is_favorite(&self, id: &str) -> Result<bool, FavoritesError> {
        Ok(self.favorites().await?.iter().any(|it| it == id))
    }

    /// Flips the identifier's membership: removes it when present, appends
    /// it when absent. The full list is persisted and the mirror updated
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Propagates blob-store failures; when persisting fails, neither the
    /// blob nor the mirror has been updated.
    pub async fn toggle(&self, id: &str) -> Result<Toggle, FavoritesError> {
        let mut ids = self.favorites().await?;
        let is_favorite = match ids.iter().position(|it| it == id) {
            Some(position) => {
                ids.remove(position);
                false
            }
            None => {
                ids.push(id.to_owned());
                true
            }
        };

        self.persist(&ids).await?;
        self.remember(ids);

        let message = if is_favorite {
            "Added to favorites".to_owned()
        } else {
            "Removed from favorites".to_owned()
        };
        Ok(Toggle {
            is_favorite,
            message,
        })
    }

    /// Adds the identifier; does nothing when it is already a favorite.
    ///
    /// # Errors
    ///
    /// Propagates the same failures as [`toggle`](Self::toggle).
    pub async fn add(&self, id: &str) -> Result<(), FavoritesError> {
        if !self.is_favorite(id).await? {
            self.toggle(id).await?;
        }
        Ok(())
    }

    /// Removes the identifier; does nothing when it is not a favorite.
    ///
    /// # Errors
    ///
    /// Propagates the same failures as [`toggle`](Self::toggle).
    pub async fn remove(&self, id: &str) -> Result<(), FavoritesError> {
        if self.is_favorite(id).await? {
            self.toggle(id).await?;
        }
        Ok(())
    }

    /// Erases the persisted list and resets the mirror to empty.
    ///
    /// # Errors
    ///
    /// Propagates blob-store failures; on failure the mirror is left
    /// untouched.
    pub async fn clear(&self) -> Result<(), FavoritesError> {
        self.blobs.remove(STORAGE_KEY).await?;
        self.remember(Vec::new());
        Ok(())
    }

    /// Forces the next read to bypass the mirror and re-read storage.
    pub fn invalidate_mirror(&self) {
        *self.mirror.lock() = None;
    }

    fn fresh_mirror(&self) -> Option<Vec<String>> {
        let mirror = self.mirror.lock();
        let held = mirror.as_ref()?;
        match self.clock.now().duration_since(held.loaded_at) {
            Ok(age) if age <= self.window => Some(held.ids.clone()),
            // Too old, or the clock went backwards; either way, re-read.
            _ => None,
        }
    }

    fn remember(&self, ids: Vec<String>) {
        *self.mirror.lock() = Some(Mirror {
            ids,
            loaded_at: self.clock.now(),
        });
    }

    async fn load(&self) -> Result<Vec<String>, FavoritesError> {
        match self.blobs.read(STORAGE_KEY).await? {
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|source| FavoritesError::Corrupt {
                    reason: source.to_string(),
                })
            }
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, ids: &[String]) -> Result<(), FavoritesError> {
        let raw = serde_json::to_string(ids).map_err(|source| FavoritesError::Corrupt {
            reason: source.to_string(),
        })?;
        self.blobs.write(STORAGE_KEY, &raw).await?;
        Ok(())
    }
}
