// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The catalog service: every query the screens ask for, read-through.

use chime::Clock;
use lapse::Cache;
use muralis_store::{Direction, Document, DocumentStore, Filter, Query};

use crate::entity::{Category, Wallpaper};
use crate::error::CatalogError;
use crate::key::QueryKey;
use crate::page::{Page, PageCursor};
use crate::ttl::TtlPolicy;

const WALLPAPERS: &str = "wallpapers";
const CATEGORIES: &str = "categories";

const CATEGORY_ID: &str = "category_id";
const CREATED_AT: &str = "created_at";
const DOWNLOADS: &str = "downloads";
const FEATURED: &str = "featured";
const NAME: &str = "name";
const TAGS: &str = "tags";
const TITLE_LOWER: &str = "title_lower";
const VIEWS: &str = "views";

/// Upper bound of the prefix range used for title search: every string
/// with the prefix sorts at or before `prefix + U+F8FF`.
const PREFIX_RANGE_CEILING: char = '\u{f8ff}';

/// The catalog data service.
///
/// One instance is constructed per process and shared by reference by
/// every consumer; there is no hidden global state. All cached state lives
/// in typed caches keyed by [`QueryKey`], with freshness windows from a
/// [`TtlPolicy`] and concurrent misses coalesced per key.
///
/// Read operations return `Result`, so "no data" (`Ok` of an empty value)
/// and "fetch failed" (`Err`) stay distinguishable; see
/// [`FallbackExt`](crate::FallbackExt) for the opt-in degradation callers
/// may prefer at the screen boundary.
///
/// # Examples
///
/// ```
/// use chime::Clock;
/// use muralis_catalog::CatalogService;
/// use muralis_store::testing::MemoryStore;
///
/// # futures::executor::block_on(async {
/// let service = CatalogService::new(MemoryStore::new(), Clock::system());
/// let categories = service.categories().await?;
/// assert!(categories.is_empty());
/// # Ok::<(), muralis_catalog::CatalogError>(())
/// # });
/// ```
#[derive(Debug)]
pub struct CatalogService<S> {
    store: S,
    policy: TtlPolicy,
    /// Wallpaper listings: featured, newest, popular, per-category pages,
    /// related items, and search results.
    lists: Cache<QueryKey, Vec<Wallpaper>, CatalogError>,
    /// Single wallpapers by identifier.
    wallpapers: Cache<QueryKey, Wallpaper, CatalogError>,
    /// The category list.
    categories: Cache<QueryKey, Vec<Category>, CatalogError>,
    /// Single categories by identifier.
    category: Cache<QueryKey, Category, CatalogError>,
    /// Per-category wallpaper counts.
    counts: Cache<QueryKey, u64, CatalogError>,
}

impl<S> CatalogService<S>
where
    S: DocumentStore,
{
    /// Creates a service with the default freshness policy.
    #[must_use]
    pub fn new(store: S, clock: Clock) -> Self {
        Self::with_policy(store, clock, TtlPolicy::default())
    }

    /// Creates a service with an explicit freshness policy.
    #[must_use]
    pub fn with_policy(store: S, clock: Clock, policy: TtlPolicy) -> Self {
        Self {
            store,
            policy,
            lists: Cache::builder(clock.clone())
                .name("catalog/lists")
                .coalesce_misses()
                .build(),
            wallpapers: Cache::builder(clock.clone())
                .name("catalog/wallpapers")
                .coalesce_misses()
                .build(),
            categories: Cache::builder(clock.clone())
                .name("catalog/categories")
                .coalesce_misses()
                .build(),
            category: Cache::builder(clock.clone())
                .name("catalog/category")
                .coalesce_misses()
                .build(),
            counts: Cache::builder(clock)
                .name("catalog/counts")
                .coalesce_misses()
                .build(),
        }
    }

    /// Returns the freshness policy in effect.
    #[must_use]
    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    /// The featured rail, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote query fails or a document does not
    /// decode.
    pub async fn featured(&self, limit: usize) -> Result<Vec<Wallpaper>, CatalogError> {
        let key = QueryKey::Featured { limit };
        self.fetch_list(key, move || {
            Query::new(WALLPAPERS)
                .filter(Filter::eq(FEATURED, true))
                .order_by(CREATED_AT, Direction::Descending)
                .limit(limit)
        })
        .await
    }

    /// The newest wallpapers across all categories.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote query fails or a document does not
    /// decode.
    pub async fn newest(&self, limit: usize) -> Result<Vec<Wallpaper>, CatalogError> {
        let key = QueryKey::Newest { limit };
        self.fetch_list(key, move || {
            Query::new(WALLPAPERS)
                .order_by(CREATED_AT, Direction::Descending)
                .limit(limit)
        })
        .await
    }

    /// The most downloaded wallpapers across all categories.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote query fails or a document does not
    /// decode.
    pub async fn popular(&self, limit: usize) -> Result<Vec<Wallpaper>, CatalogError> {
        let key = QueryKey::Popular { limit };
        self.fetch_list(key, move || {
            Query::new(WALLPAPERS)
                .order_by(DOWNLOADS, Direction::Descending)
                .limit(limit)
        })
        .await
    }

    /// The first page of a category's wallpapers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote query fails or a document does not
    /// decode.
    pub async fn wallpapers_by_category(
        &self,
        category_id: &str,
        limit: usize,
    ) -> Result<Vec<Wallpaper>, CatalogError> {
        let key = QueryKey::WallpapersByCategory {
            category_id: category_id.to_owned(),
            limit,
        };
        let query_category = category_id.to_owned();
        self.fetch_list(key, move || {
            Query::new(WALLPAPERS)
                .filter(Filter::eq(CATEGORY_ID, query_category.as_str()))
                .order_by(CREATED_AT, Direction::Descending)
                .limit(limit)
        })
        .await
    }

    /// One page of a category's wallpapers, resumable with the returned
    /// cursor.
    ///
    /// The cursor-less first page is served read-through like
    /// [`wallpapers_by_category`](Self::wallpapers_by_category); pages
    /// fetched with a cursor bypass the cache, since they only exist for
    /// the duration of a scroll session. See [`Page`] for the semantics of
    /// the returned cursor.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote query fails or a document does not
    /// decode.
    pub async fn wallpapers_by_category_page(
        &self,
        category_id: &str,
        limit: usize,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<Wallpaper>, CatalogError> {
        let items = match cursor {
            None => self.wallpapers_by_category(category_id, limit).await?,
            Some(cursor) => {
                let query = Query::new(WALLPAPERS)
                    .filter(Filter::eq(CATEGORY_ID, category_id))
                    .order_by(CREATED_AT, Direction::Descending)
                    .limit(limit)
                    .start_after(cursor.last());
                decode_wallpapers(self.store.run_query(query).await?)?
            }
        };
        Ok(Page::from_items(items, limit))
    }

    /// Wallpapers in the same category as the given one, excluding it.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote query fails or a document does not
    /// decode.
    pub async fn related_wallpapers(
        &self,
        wallpaper: &Wallpaper,
        limit: usize,
    ) -> Result<Vec<Wallpaper>, CatalogError> {
        let key = QueryKey::Related {
            wallpaper_id: wallpaper.id.clone(),
            limit,
        };
        let ttl = self.policy.for_key(&key);
        let category_id = wallpaper.category_id.clone();
        let excluded = wallpaper.id.clone();
        self.lists
            .try_get_or_fetch(&key, Some(ttl), || async move {
                // The store cannot express "not equal", so fetch one extra
                // and drop the wallpaper itself client-side.
                let query = Query::new(WALLPAPERS)
                    .filter(Filter::eq(CATEGORY_ID, category_id.as_str()))
                    .order_by(CREATED_AT, Direction::Descending)
                    .limit(limit + 1);
                let mut items = decode_wallpapers(self.store.run_query(query).await?)?;
                items.retain(|item| item.id != excluded);
                items.truncate(limit);
                Ok(items)
            })
            .await
    }

    /// A single wallpaper by identifier.
    ///
    /// Returns `Ok(None)` when the wallpaper does not exist; absence is
    /// not cached, so a later call looks again.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote fetch fails or the document does
    /// not decode.
    pub async fn wallpaper_by_id(&self, id: &str) -> Result<Option<Wallpaper>, CatalogError> {
        let key = QueryKey::Wallpaper { id: id.to_owned() };
        let ttl = self.policy.for_key(&key);
        self.wallpapers
            .try_optionally_get_or_fetch(&key, Some(ttl), || async move {
                match self.store.fetch(WALLPAPERS, id).await? {
                    Some(document) => Ok(Some(Wallpaper::from_document(document)?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// The full category list, by name.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote query fails or a document does not
    /// decode.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let key = QueryKey::Categories;
        let ttl = self.policy.for_key(&key);
        self.categories
            .try_get_or_fetch(&key, Some(ttl), || async move {
                let query = Query::new(CATEGORIES).order_by(NAME, Direction::Ascending);
                self.store
                    .run_query(query)
                    .await?
                    .into_iter()
                    .map(Category::from_document)
                    .collect()
            })
            .await
    }

    /// A single category by identifier.
    ///
    /// Returns `Ok(None)` when the category does not exist; absence is not
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote fetch fails or the document does
    /// not decode.
    pub async fn category_by_id(&self, id: &str) -> Result<Option<Category>, CatalogError> {
        let key = QueryKey::Category { id: id.to_owned() };
        let ttl = self.policy.for_key(&key);
        self.category
            .try_optionally_get_or_fetch(&key, Some(ttl), || async move {
                match self.store.fetch(CATEGORIES, id).await? {
                    Some(document) => Ok(Some(Category::from_document(document)?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// The number of wallpapers in a category, counted server-side.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote aggregation fails.
    pub async fn count_by_category(&self, category_id: &str) -> Result<u64, CatalogError> {
        let key = QueryKey::CountForCategory {
            category_id: category_id.to_owned(),
        };
        let ttl = self.policy.for_key(&key);
        let query_category = category_id.to_owned();
        self.counts
            .try_get_or_fetch(&key, Some(ttl), || async move {
                let query = Query::new(WALLPAPERS)
                    .filter(Filter::eq(CATEGORY_ID, query_category.as_str()));
                Ok(self.store.count(query).await?)
            })
            .await
    }

    /// Searches wallpapers by title prefix and by tag, concurrently.
    ///
    /// The two remote queries fail independently: a failed half is logged
    /// and contributes nothing, so a partial outage degrades the results
    /// instead of failing the search. Results merge by identifier — a
    /// wallpaper found by both queries appears once, with the tag query's
    /// copy winning — and are truncated to `limit`.
    ///
    /// # Errors
    ///
    /// This operation degrades rather than fails; the `Result` carries the
    /// cache layer's contract and is always `Ok` today.
    pub async fn search(&self, term: &str, limit: usize) -> Result<Vec<Wallpaper>, CatalogError> {
        let needle = term.trim().to_lowercase();
        let key = QueryKey::Search {
            term: needle.clone(),
            limit,
        };
        let ttl = self.policy.for_key(&key);
        self.lists
            .try_get_or_fetch(&key, Some(ttl), || async move {
                Ok(self.search_remote(&needle, limit).await)
            })
            .await
    }

    async fn search_remote(&self, needle: &str, limit: usize) -> Vec<Wallpaper> {
        let by_title = Query::new(WALLPAPERS)
            .filter(Filter::range(
                TITLE_LOWER,
                needle,
                format!("{needle}{PREFIX_RANGE_CEILING}"),
            ))
            .limit(limit);
        let by_tag = Query::new(WALLPAPERS)
            .filter(Filter::contains(TAGS, needle))
            .limit(limit);

        let (titles, tags) = futures::join!(
            self.store.run_query(by_title),
            self.store.run_query(by_tag)
        );

        let mut merged: Vec<Wallpaper> = Vec::new();
        for (source, half) in [("title", titles), ("tag", tags)] {
            match half.map_err(CatalogError::from).and_then(decode_wallpapers) {
                Ok(items) => {
                    for item in items {
                        match merged.iter_mut().find(|found| found.id == item.id) {
                            Some(found) => *found = item,
                            None => merged.push(item),
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, query = source, "search degraded to partial results");
                }
            }
        }
        merged.truncate(limit);
        merged
    }

    /// Records a download: increments the remote counter, then drops every
    /// cached form of the wallpaper.
    ///
    /// Invalidation happens whether or not the increment succeeded; a
    /// subsequent read may therefore re-fetch a value that was never
    /// actually updated remotely. That staleness is accepted in exchange
    /// for never serving a counter the cache knows is suspect.
    ///
    /// # Errors
    ///
    /// Returns the increment's failure, after invalidation has run.
    pub async fn record_download(&self, id: &str) -> Result<(), CatalogError> {
        let result = self.store.increment(WALLPAPERS, id, DOWNLOADS, 1).await;
        self.invalidate_wallpaper(id);
        result.map_err(CatalogError::from)
    }

    /// Records a view: increments the remote counter, then drops every
    /// cached form of the wallpaper.
    ///
    /// See [`record_download`](Self::record_download) for the invalidation
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns the increment's failure, after invalidation has run.
    pub async fn record_view(&self, id: &str) -> Result<(), CatalogError> {
        let result = self.store.increment(WALLPAPERS, id, VIEWS, 1).await;
        self.invalidate_wallpaper(id);
        result.map_err(CatalogError::from)
    }

    /// Drops every cached entry derived from the given wallpaper.
    pub fn invalidate_wallpaper(&self, id: &str) {
        tracing::debug!(wallpaper = id, "dropping cached entries for wallpaper");
        let in_singles = id.to_owned();
        self.wallpapers
            .invalidate_when(move |key| key.mentions(&in_singles));
        let in_lists = id.to_owned();
        self.lists.invalidate_when(move |key| key.mentions(&in_lists));
    }

    /// Drops every cached entry, across all families.
    ///
    /// Used for hard resets such as pull-to-refresh.
    pub fn refresh(&self) {
        tracing::debug!("dropping all cached catalog entries");
        self.lists.clear();
        self.wallpapers.clear();
        self.categories.clear();
        self.category.clear();
        self.counts.clear();
    }

    /// Read-through shared by the uniform listing operations.
    async fn fetch_list(
        &self,
        key: QueryKey,
        make_query: impl FnOnce() -> Query + Send,
    ) -> Result<Vec<Wallpaper>, CatalogError> {
        let ttl = self.policy.for_key(&key);
        self.lists
            .try_get_or_fetch(&key, Some(ttl), || async move {
                decode_wallpapers(self.store.run_query(make_query()).await?)
            })
            .await
    }
}

fn decode_wallpapers(documents: Vec<Document>) -> Result<Vec<Wallpaper>, CatalogError> {
    documents.into_iter().map(Wallpaper::from_document).collect()
}
