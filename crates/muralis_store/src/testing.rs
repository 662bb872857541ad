// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory implementations of the storage traits for testing.
//!
//! [`MemoryStore`] evaluates the full query surface (filters, ordering,
//! limits, start-after cursors, counts, increments) against documents held
//! in memory. [`MemoryBlobs`] is a plain keyed map. Both record every
//! operation and support failure injection for exercising error paths.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::{BlobError, BlobStore, Direction, Document, DocumentStore, Filter, Query, StoreError};

/// A recorded document-store operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    /// A query was run against the collection.
    Query {
        /// Collection that was queried.
        collection: String,
    },
    /// A single document was fetched.
    Fetch {
        /// Collection the document was fetched from.
        collection: String,
        /// Identifier that was fetched.
        id: String,
    },
    /// A count aggregation was run against the collection.
    Count {
        /// Collection that was counted.
        collection: String,
    },
    /// A field of one document was incremented.
    Increment {
        /// Collection holding the document.
        collection: String,
        /// Identifier of the document.
        id: String,
        /// Field that was incremented.
        field: String,
    },
}

type StoreFailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// An in-memory document store.
///
/// Documents are seeded with [`insert`](Self::insert); queries evaluate the
/// same semantics the catalog relies on remotely. Failure injection via
/// [`fail_when`](Self::fail_when) makes any subset of operations return
/// [`StoreError::Unreachable`].
///
/// # Examples
///
/// ```
/// use muralis_store::testing::MemoryStore;
/// use muralis_store::{Document, DocumentStore, Filter, Query};
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let store = MemoryStore::new();
/// store.insert("wallpapers", Document::new("w1", json!({"featured": true})));
///
/// let query = Query::new("wallpapers").filter(Filter::eq("featured", true));
/// let docs = store.run_query(query).await.unwrap();
/// assert_eq!(docs.len(), 1);
/// # });
/// ```
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<StoreFailPredicate>>>,
    /// Stand-in for the store's server-assigned update timestamps.
    update_sequence: Arc<AtomicI64>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collections", &self.collections)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            collections: Arc::clone(&self.collections),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
            update_sequence: Arc::clone(&self.update_sequence),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            update_sequence: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Seeds a document, replacing any existing document with the same
    /// identifier.
    pub fn insert(&self, collection: &str, document: Document) {
        let mut collections = self.collections.lock();
        let documents = collections.entry(collection.to_owned()).or_default();
        if let Some(existing) = documents.iter_mut().find(|doc| doc.id == document.id) {
            *existing = document;
        } else {
            documents.push(document);
        }
    }

    /// Returns a copy of a stored document, for assertions.
    #[must_use]
    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .lock()
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| doc.id == id).cloned())
    }

    /// Sets a predicate deciding which operations fail with
    /// [`StoreError::Unreachable`].
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: &StoreOp) -> Result<(), StoreError> {
        let should_fail = self
            .fail_when
            .lock()
            .as_ref()
            .is_some_and(|predicate| predicate(op));
        self.operations.lock().push(op.clone());
        if should_fail {
            return Err(StoreError::Unreachable("injected failure".to_owned()));
        }
        Ok(())
    }

    fn matching(&self, query: &Query) -> Vec<Document> {
        let collections = self.collections.lock();
        let documents = collections
            .get(&query.collection)
            .cloned()
            .unwrap_or_default();
        drop(collections);

        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|doc| query.filters.iter().all(|filter| matches(doc, filter)))
            .collect();

        if let Some(order) = &query.order_by {
            matched.sort_by(|a, b| {
                let by_field = compare_values(
                    a.fields.get(&order.field).unwrap_or(&Value::Null),
                    b.fields.get(&order.field).unwrap_or(&Value::Null),
                )
                .then_with(|| a.id.cmp(&b.id));
                match order.direction {
                    Direction::Ascending => by_field,
                    Direction::Descending => by_field.reverse(),
                }
            });
        }
        matched
    }
}

impl DocumentStore for MemoryStore {
    async fn run_query(&self, query: Query) -> Result<Vec<Document>, StoreError> {
        self.record(&StoreOp::Query {
            collection: query.collection.clone(),
        })?;

        let mut matched = self.matching(&query);

        if let Some(after) = &query.start_after {
            match matched.iter().position(|doc| doc.id == *after) {
                Some(position) => {
                    matched.drain(..=position);
                }
                // A cursor that no longer points into the result set cannot
                // be resumed; the page comes back empty.
                None => matched.clear(),
            }
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.record(&StoreOp::Fetch {
            collection: collection.to_owned(),
            id: id.to_owned(),
        })?;
        Ok(self.document(collection, id))
    }

    async fn count(&self, query: Query) -> Result<u64, StoreError> {
        self.record(&StoreOp::Count {
            collection: query.collection.clone(),
        })?;
        Ok(self.matching(&query).len() as u64)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.record(&StoreOp::Increment {
            collection: collection.to_owned(),
            id: id.to_owned(),
            field: field.to_owned(),
        })?;

        let mut collections = self.collections.lock();
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;

        let fields = document
            .fields
            .as_object_mut()
            .ok_or_else(|| StoreError::Malformed {
                collection: collection.to_owned(),
                id: id.to_owned(),
                reason: "field data is not an object".to_owned(),
            })?;

        let slot = fields.entry(field.to_owned()).or_insert(Value::from(0));
        let current = slot.as_i64().ok_or_else(|| StoreError::Malformed {
            collection: collection.to_owned(),
            id: id.to_owned(),
            reason: format!("field `{field}` is not numeric"),
        })?;
        *slot = Value::from(current + delta);

        let stamp = self.update_sequence.fetch_add(1, Ordering::SeqCst);
        fields.insert("updated_at".to_owned(), Value::from(stamp));
        Ok(())
    }
}

fn matches(document: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { field, value } => document.fields.get(field) == Some(value),
        Filter::Range {
            field,
            lower,
            upper,
        } => document.fields.get(field).is_some_and(|actual| {
            compare_values(actual, lower) != CmpOrdering::Less
                && compare_values(actual, upper) != CmpOrdering::Greater
        }),
        Filter::Contains { field, value } => document
            .fields
            .get(field)
            .and_then(Value::as_array)
            .is_some_and(|items| items.contains(value)),
    }
}

/// Orders two field values of the same kind; values of different kinds
/// (or kinds without a meaningful order) compare equal, and the caller's
/// identifier tie-break keeps the total order deterministic.
fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(f64::NAN)
            .total_cmp(&y.as_f64().unwrap_or(f64::NAN)),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => CmpOrdering::Equal,
    }
}

/// A recorded blob-store operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlobOp {
    /// A blob was read.
    Read(String),
    /// A blob was written.
    Write(String),
    /// A blob was removed.
    Remove(String),
}

type BlobFailPredicate = Box<dyn Fn(&BlobOp) -> bool + Send + Sync>;

/// An in-memory blob store with operation recording and failure injection.
///
/// # Examples
///
/// ```
/// use muralis_store::BlobStore;
/// use muralis_store::testing::MemoryBlobs;
///
/// # futures::executor::block_on(async {
/// let blobs = MemoryBlobs::new();
/// blobs.write("favorites", "[]").await.unwrap();
/// assert_eq!(blobs.read("favorites").await.unwrap().as_deref(), Some("[]"));
/// # });
/// ```
pub struct MemoryBlobs {
    blobs: Arc<Mutex<HashMap<String, String>>>,
    operations: Arc<Mutex<Vec<BlobOp>>>,
    fail_when: Arc<Mutex<Option<BlobFailPredicate>>>,
}

impl std::fmt::Debug for MemoryBlobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlobs")
            .field("blobs", &self.blobs)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MemoryBlobs {
    fn clone(&self) -> Self {
        Self {
            blobs: Arc::clone(&self.blobs),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MemoryBlobs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobs {
    /// Creates a new, empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets a predicate deciding which operations fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&BlobOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<BlobOp> {
        self.operations.lock().clone()
    }

    /// Returns the raw blob under a key, bypassing the trait, for
    /// assertions.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.lock().get(key).cloned()
    }

    fn record(&self, op: &BlobOp, operation: &'static str) -> Result<(), BlobError> {
        let should_fail = self
            .fail_when
            .lock()
            .as_ref()
            .is_some_and(|predicate| predicate(op));
        self.operations.lock().push(op.clone());
        if should_fail {
            return Err(BlobError::Failed {
                operation,
                reason: "injected failure".to_owned(),
            });
        }
        Ok(())
    }
}

impl BlobStore for MemoryBlobs {
    async fn read(&self, key: &str) -> Result<Option<String>, BlobError> {
        self.record(&BlobOp::Read(key.to_owned()), "read")?;
        Ok(self.blobs.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), BlobError> {
        self.record(&BlobOp::Write(key.to_owned()), "write")?;
        self.blobs.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), BlobError> {
        self.record(&BlobOp::Remove(key.to_owned()), "remove")?;
        self.blobs.lock().remove(key);
        Ok(())
    }
}
