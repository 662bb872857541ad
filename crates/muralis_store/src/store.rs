// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The storage traits.
//!
//! Implementations wrap a concrete client (or, for tests, the in-memory
//! doubles in [`crate::testing`]). Consumers stay generic over these traits
//! and never see the client's own types.

use crate::{BlobError, Document, Query, StoreError};

/// The remote document store, reduced to the surface the catalog consumes.
pub trait DocumentStore: Send + Sync {
    /// Runs a query and returns the matching documents.
    fn run_query(&self, query: Query)
    -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Fetches a single document by identifier.
    ///
    /// Returns `Ok(None)` when the document does not exist; `Err` is
    /// reserved for transport and store failures.
    fn fetch(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Counts the documents matching a query server-side, without
    /// transferring them.
    fn count(&self, query: Query) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Atomically increments a numeric field of one document and stamps the
    /// store's own update timestamp.
    fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The local string-keyed blob store.
///
/// Used for small persisted state that must survive without network
/// connectivity. Serialization is the caller's concern; the store only
/// moves opaque strings.
pub trait BlobStore: Send + Sync {
    /// Reads the blob stored under a key, if any.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>, BlobError>> + Send;

    /// Writes a blob under a key, replacing any previous value.
    fn write(&self, key: &str, value: &str)
    -> impl Future<Output = Result<(), BlobError>> + Send;

    /// Removes the blob stored under a key. Removing an absent key is not
    /// an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), BlobError>> + Send;
}
