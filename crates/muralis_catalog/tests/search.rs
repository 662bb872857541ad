// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Search: the two-query merge, failure isolation, and term-normalized
//! caching.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{ids, queries, seeded_store, service_over};
use muralis_store::testing::StoreOp;

#[tokio::test]
async fn search_matches_title_prefixes_and_tags() {
    let store = seeded_store();
    let (service, _control) = service_over(store);

    // "sky" prefixes the titles of w2 and w3, and tags w2 and w3 as well;
    // the merged result carries each exactly once.
    let results = service.search("sky", 10).await.expect("search succeeds");
    let mut found = ids(&results);
    found.sort_unstable();
    assert_eq!(found, vec!["w2", "w3"]);
}

#[tokio::test]
async fn overlapping_halves_merge_by_identifier() {
    let store = seeded_store();
    let (service, _control) = service_over(store);

    let results = service.search("sky", 10).await.expect("search succeeds");
    let mut found = ids(&results);
    let total = found.len();
    found.sort_unstable();
    found.dedup();
    assert_eq!(found.len(), total, "no identifier may appear twice");
}

#[tokio::test]
async fn terms_are_normalized_before_querying_and_caching() {
    let store = seeded_store();
    let (service, _control) = service_over(store.clone());

    let loud = service.search("  SKY ", 10).await.expect("search succeeds");
    assert_eq!(loud.len(), 2);
    let after_first = queries(&store);

    // The differently-written same term is a cache hit.
    let quiet = service.search("sky", 10).await.expect("search succeeds");
    assert_eq!(quiet, loud);
    assert_eq!(queries(&store), after_first);
}

#[tokio::test]
async fn search_respects_the_limit() {
    let store = seeded_store();
    let (service, _control) = service_over(store);

    let results = service.search("sky", 1).await.expect("search succeeds");
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn a_failed_half_degrades_to_partial_results() {
    let store = seeded_store();
    let (service, _control) = service_over(store.clone());

    // The title query runs first; fail exactly that one.
    let seen = Arc::new(AtomicUsize::new(0));
    let gate = Arc::clone(&seen);
    store.fail_when(move |op| {
        matches!(op, StoreOp::Query { .. }) && gate.fetch_add(1, Ordering::SeqCst) == 0
    });

    let results = service.search("sky", 10).await.expect("search degrades");
    // The tag half still answers: both sky-tagged wallpapers come back.
    let mut found = ids(&results);
    found.sort_unstable();
    assert_eq!(found, vec!["w2", "w3"]);
}

#[tokio::test]
async fn a_fully_failed_search_is_an_empty_result() {
    let store = seeded_store();
    let (service, _control) = service_over(store.clone());

    store.fail_when(|op| matches!(op, StoreOp::Query { .. }));
    let results = service.search("sky", 10).await.expect("search degrades");
    assert!(results.is_empty());
}

#[tokio::test]
async fn unmatched_terms_come_back_empty() {
    let store = seeded_store();
    let (service, _control) = service_over(store);

    let results = service
        .search("aurora borealis", 10)
        .await
        .expect("search succeeds");
    assert!(results.is_empty());
}
