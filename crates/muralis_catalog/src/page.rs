// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::entity::Wallpaper;

/// One page of a paginated listing.
///
/// `cursor` is `Some` exactly when the fetched page was full, which the
/// catalog takes as "there is probably more". This is a heuristic, not a
/// precise end-of-data signal: when the total number of items is an exact
/// multiple of the page size, the final full page still carries a cursor
/// and the follow-up fetch comes back empty (with no cursor), which is
/// what actually ends the scroll.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    /// The items of this page, in listing order.
    pub items: Vec<T>,
    /// Cursor for fetching the next page, when the page was full.
    pub cursor: Option<PageCursor>,
}

impl Page<Wallpaper> {
    pub(crate) fn from_items(items: Vec<Wallpaper>, limit: usize) -> Self {
        let cursor = if limit > 0 && items.len() == limit {
            items.last().map(|item| PageCursor::after(item.id.clone()))
        } else {
            None
        };
        Self { items, cursor }
    }
}

/// An opaque reference to the last item of a fetched page.
///
/// Cursors are forward-only and live in the caller's memory for the
/// duration of a scroll session; they are not persisted and cannot be
/// resumed across restarts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageCursor {
    last: String,
}

impl PageCursor {
    pub(crate) fn after(last: String) -> Self {
        Self { last }
    }

    pub(crate) fn last(&self) -> &str {
        &self.last
    }
}
