// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Typed entities built from raw store documents.
//!
//! The document store keeps generated identifiers separate from field
//! data; an entity is the merge of the two. Field data is tolerated being
//! sparse — a document missing a field decodes with that field defaulted —
//! but a field of the wrong type is a decode failure and is reported as a
//! remote-read failure.

use muralis_store::Document;
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// A wallpaper in the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallpaper {
    /// Store-generated identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Full-resolution image location.
    pub image_url: String,
    /// Thumbnail location for grids.
    pub thumb_url: String,
    /// Identifier of the category this wallpaper belongs to.
    pub category_id: String,
    /// Free-form tags used by search.
    pub tags: Vec<String>,
    /// Number of recorded downloads.
    pub downloads: i64,
    /// Number of recorded views.
    pub views: i64,
    /// Whether the wallpaper appears in the featured rail.
    pub featured: bool,
    /// Creation time in milliseconds since the UNIX epoch; listings order
    /// newest-first by this field.
    pub created_at: i64,
}

impl Wallpaper {
    /// Builds a wallpaper by merging a document's identifier with its
    /// field data.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Decode`] when the field data does not have
    /// the expected shape.
    pub fn from_document(document: Document) -> Result<Self, CatalogError> {
        let Document { id, fields } = document;
        let mut wallpaper: Self =
            serde_json::from_value(fields).map_err(|source| CatalogError::Decode {
                collection: "wallpapers",
                id: id.clone(),
                reason: source.to_string(),
            })?;
        wallpaper.id = id;
        Ok(wallpaper)
    }
}

/// A category grouping wallpapers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    /// Store-generated identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cover image location.
    pub image_url: String,
    /// Creation time in milliseconds since the UNIX epoch.
    pub created_at: i64,
}

impl Category {
    /// Builds a category by merging a document's identifier with its field
    /// data.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Decode`] when the field data does not have
    /// the expected shape.
    pub fn from_document(document: Document) -> Result<Self, CatalogError> {
        let Document { id, fields } = document;
        let mut category: Self =
            serde_json::from_value(fields).map_err(|source| CatalogError::Decode {
                collection: "categories",
                id: id.clone(),
                reason: source.to_string(),
            })?;
        category.id = id;
        Ok(category)
    }
}
