// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Behavioral tests: round-trips, mirror freshness, and failure
//! propagation.

use std::time::Duration;

use chime::ClockControl;
use muralis_favorites::{FavoritesError, FavoritesStore};
use muralis_store::BlobStore;
use muralis_store::testing::{BlobOp, MemoryBlobs};

const WINDOW: Duration = Duration::from_secs(5 * 60);

fn store() -> (FavoritesStore<MemoryBlobs>, MemoryBlobs, ClockControl) {
    let control = ClockControl::new();
    let blobs = MemoryBlobs::new();
    let favorites = FavoritesStore::new(blobs.clone(), control.to_clock());
    (favorites, blobs, control)
}

fn reads(blobs: &MemoryBlobs) -> usize {
    blobs
        .operations()
        .iter()
        .filter(|op| matches!(op, BlobOp::Read(_)))
        .count()
}

#[tokio::test]
async fn toggle_round_trip() {
    let (favorites, _blobs, _control) = store();

    let added = favorites.toggle("w1").await.expect("toggle succeeds");
    assert!(added.is_favorite);
    assert_eq!(added.message, "Added to favorites");
    assert_eq!(favorites.favorites().await.expect("read"), vec!["w1"]);

    let removed = favorites.toggle("w1").await.expect("toggle succeeds");
    assert!(!removed.is_favorite);
    assert_eq!(removed.message, "Removed from favorites");
    assert!(favorites.favorites().await.expect("read").is_empty());
}

#[tokio::test]
async fn list_preserves_favoriting_order() {
    let (favorites, _blobs, _control) = store();

    for id in ["w3", "w1", "w2"] {
        favorites.add(id).await.expect("add succeeds");
    }

    assert_eq!(
        favorites.favorites().await.expect("read"),
        vec!["w3", "w1", "w2"]
    );
}

#[tokio::test]
async fn add_and_remove_are_idempotent() {
    let (favorites, blobs, _control) = store();

    favorites.add("w1").await.expect("add succeeds");
    let writes_after_first = blobs
        .operations()
        .iter()
        .filter(|op| matches!(op, BlobOp::Write(_)))
        .count();

    // Requested state already holds: no further persistence.
    favorites.add("w1").await.expect("add succeeds");
    favorites.remove("w9").await.expect("remove succeeds");
    let writes_after = blobs
        .operations()
        .iter()
        .filter(|op| matches!(op, BlobOp::Write(_)))
        .count();

    assert_eq!(writes_after, writes_after_first);
    assert_eq!(favorites.favorites().await.expect("read"), vec!["w1"]);
}

#[tokio::test]
async fn mirror_serves_reads_within_the_window() {
    let (favorites, blobs, control) = store();

    favorites.favorites().await.expect("read");
    favorites.is_favorite("w1").await.expect("read");
    assert_eq!(reads(&blobs), 1);

    // Still fresh at exactly the window edge.
    control.advance(WINDOW);
    favorites.favorites().await.expect("read");
    assert_eq!(reads(&blobs), 1);

    control.advance(Duration::from_secs(1));
    favorites.favorites().await.expect("read");
    assert_eq!(reads(&blobs), 2);
}

#[tokio::test]
async fn mutations_refresh_the_mirror_synchronously() {
    let (favorites, blobs, _control) = store();

    favorites.favorites().await.expect("read");
    favorites.toggle("w1").await.expect("toggle succeeds");

    // The mirror already reflects the mutation; no storage read needed.
    let before = reads(&blobs);
    assert_eq!(favorites.favorites().await.expect("read"), vec!["w1"]);
    assert_eq!(reads(&blobs), before);
}

#[tokio::test]
async fn invalidate_mirror_forces_a_reload() {
    let (favorites, blobs, _control) = store();

    favorites.favorites().await.expect("read");
    favorites.invalidate_mirror();
    favorites.favorites().await.expect("read");

    assert_eq!(reads(&blobs), 2);
}

#[tokio::test]
async fn clear_erases_storage_and_mirror() {
    let (favorites, blobs, _control) = store();

    favorites.add("w1").await.expect("add succeeds");
    favorites.clear().await.expect("clear succeeds");

    assert!(blobs.raw("favorites").is_none());
    assert!(favorites.favorites().await.expect("read").is_empty());
}

#[tokio::test]
async fn persistence_failure_propagates_and_leaves_state_alone() {
    let (favorites, blobs, _control) = store();
    favorites.add("w1").await.expect("add succeeds");

    blobs.fail_when(|op| matches!(op, BlobOp::Write(_)));
    let result = favorites.toggle("w2").await;
    assert!(matches!(result, Err(FavoritesError::Blob(_))));

    // The failed edit must not have reached the mirror or the blob.
    blobs.clear_failures();
    assert_eq!(favorites.favorites().await.expect("read"), vec!["w1"]);
    favorites.invalidate_mirror();
    assert_eq!(favorites.favorites().await.expect("read"), vec!["w1"]);
}

#[tokio::test]
async fn corrupt_blob_surfaces_as_an_error() {
    let (favorites, blobs, _control) = store();

    blobs
        .write("favorites", "not json")
        .await
        .expect("seeding the corrupt blob succeeds");

    let result = favorites.favorites().await;
    assert!(matches!(result, Err(FavoritesError::Corrupt { .. })));
    // The blob is left in place for the caller to inspect or clear.
    assert_eq!(blobs.raw("favorites").as_deref(), Some("not json"));
}
