// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The read-through catalog service for a wallpaper library.
//!
//! [`CatalogService`] sits between the UI and the remote document store.
//! Every read operation follows the same shape: compute a structured
//! [`QueryKey`] from the operation and its parameters, serve the cached
//! value when it is fresh, otherwise run the remote query, shape the raw
//! documents into typed entities, cache the result with the key family's
//! time-to-live, and return it. Concurrent misses for the same key share a
//! single remote query.
//!
//! Mutations (download and view counters) update the store first, then drop
//! every cached form of the touched wallpaper — deliberately even when the
//! remote update failed, trading a possible re-fetch of unchanged data for
//! simplicity.
//!
//! Failures surface as [`CatalogError`], so callers can tell "no data"
//! from "fetch failed". Callers that want the classic mobile-app behavior
//! of rendering an empty screen instead can opt in with
//! [`FallbackExt::or_empty`].
//!
//! # Examples
//!
//! ```
//! use chime::Clock;
//! use muralis_catalog::CatalogService;
//! use muralis_store::testing::MemoryStore;
//!
//! # futures::executor::block_on(async {
//! let service = CatalogService::new(MemoryStore::new(), Clock::system());
//! let featured = service.featured(10).await?;
//! assert!(featured.is_empty());
//! # Ok::<(), muralis_catalog::CatalogError>(())
//! # });
//! ```

mod entity;
mod error;
mod fallback;
mod key;
mod page;
mod service;
mod ttl;

pub use entity::{Category, Wallpaper};
pub use error::CatalogError;
pub use fallback::FallbackExt;
pub use key::{KeyFamily, QueryKey};
pub use page::{Page, PageCursor};
pub use service::CatalogService;
pub use ttl::TtlPolicy;
