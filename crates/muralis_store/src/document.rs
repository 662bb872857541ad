// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde_json::Value;

/// A raw record returned by the document store.
///
/// The store keeps the generated identifier separate from the field data;
/// consumers build typed entities by merging the two.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The store-generated identifier.
    pub id: String,
    /// The field data, as a JSON object.
    pub fields: Value,
}

impl Document {
    /// Creates a document from an identifier and its field data.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}
