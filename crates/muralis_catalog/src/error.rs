// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use muralis_store::StoreError;

/// An error from a catalog operation.
///
/// `Clone` because a failure produced by one coalesced remote query is
/// shared with every caller that was merged into it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The remote document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A document came back in a shape the entity decoder does not accept.
    #[error("failed to decode {collection} document {id}: {reason}")]
    Decode {
        /// Collection the document came from.
        collection: &'static str,
        /// Identifier of the offending document.
        id: String,
        /// The decoder's description of the mismatch.
        reason: String,
    },
}
