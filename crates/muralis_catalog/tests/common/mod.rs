// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared fixtures: a seeded store and a service on a controlled clock.

use chime::ClockControl;
use muralis_catalog::CatalogService;
use muralis_store::Document;
use muralis_store::testing::{MemoryStore, StoreOp};
use serde_json::json;

pub fn wallpaper_doc(
    id: &str,
    title: &str,
    category_id: &str,
    tags: &[&str],
    downloads: i64,
    created_at: i64,
    featured: bool,
) -> Document {
    Document::new(
        id,
        json!({
            "title": title,
            "title_lower": title.to_lowercase(),
            "image_url": format!("https://img.example/{id}.jpg"),
            "thumb_url": format!("https://img.example/{id}_t.jpg"),
            "category_id": category_id,
            "tags": tags,
            "downloads": downloads,
            "views": 0,
            "featured": featured,
            "created_at": created_at,
        }),
    )
}

pub fn category_doc(id: &str, name: &str, created_at: i64) -> Document {
    Document::new(
        id,
        json!({
            "name": name,
            "image_url": format!("https://img.example/cat_{id}.jpg"),
            "created_at": created_at,
        }),
    )
}

/// A small catalog: three nature wallpapers, one city wallpaper, two
/// categories.
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(
        "wallpapers",
        wallpaper_doc("w1", "Misty Pines", "nature", &["forest", "fog"], 40, 100, true),
    );
    store.insert(
        "wallpapers",
        wallpaper_doc("w2", "Skyline Dusk", "city", &["sky", "night"], 90, 200, false),
    );
    store.insert(
        "wallpapers",
        wallpaper_doc("w3", "Sky Mirror Lake", "nature", &["sky", "water"], 10, 300, true),
    );
    store.insert(
        "wallpapers",
        wallpaper_doc("w4", "Dune Sea", "nature", &["desert"], 25, 400, false),
    );
    store.insert("categories", category_doc("nature", "Nature", 1));
    store.insert("categories", category_doc("city", "City", 2));
    store
}

pub fn service_over(store: MemoryStore) -> (CatalogService<MemoryStore>, ClockControl) {
    let control = ClockControl::new();
    let service = CatalogService::new(store, control.to_clock());
    (service, control)
}

/// Number of collection queries the store has served so far.
pub fn queries(store: &MemoryStore) -> usize {
    store
        .operations()
        .iter()
        .filter(|op| matches!(op, StoreOp::Query { .. }))
        .count()
}

/// Number of single-document fetches the store has served so far.
pub fn fetches(store: &MemoryStore) -> usize {
    store
        .operations()
        .iter()
        .filter(|op| matches!(op, StoreOp::Fetch { .. }))
        .count()
}

pub fn ids(wallpapers: &[muralis_catalog::Wallpaper]) -> Vec<&str> {
    wallpapers.iter().map(|w| w.id.as_str()).collect()
}
