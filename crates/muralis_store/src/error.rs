// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for the storage boundaries.
//!
//! Both error types are `Clone`: a failed remote fetch can be coalesced
//! with concurrent identical requests, and every waiter receives the same
//! outcome.

/// An error from the remote document store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the request outright.
    #[error("document store unreachable: {0}")]
    Unreachable(String),

    /// A targeted operation referenced a document that does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound {
        /// Collection the document was looked up in.
        collection: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// A document's field data does not have the shape the operation needs.
    #[error("document {collection}/{id} is malformed: {reason}")]
    Malformed {
        /// Collection holding the document.
        collection: String,
        /// Identifier of the document.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// An error from the local blob store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    /// The underlying storage failed.
    #[error("blob storage failed during {operation}: {reason}")]
    Failed {
        /// Which operation failed (`read`, `write`, or `remove`).
        operation: &'static str,
        /// The storage layer's description of the failure.
        reason: String,
    },
}
