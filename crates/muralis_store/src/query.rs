// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde_json::Value;

/// A predicate applied to a document field.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// The field equals the value.
    Eq {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// The field is within the inclusive range `[lower, upper]`.
    ///
    /// With a string field this expresses prefix matching: range from the
    /// prefix to the prefix followed by a maximal code point.
    Range {
        /// Field name.
        field: String,
        /// Inclusive lower bound.
        lower: Value,
        /// Inclusive upper bound.
        upper: Value,
    },
    /// The field is an array containing the value.
    Contains {
        /// Field name.
        field: String,
        /// Element that must be present.
        value: Value,
    },
}

impl Filter {
    /// Creates an equality filter.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an inclusive range filter.
    #[must_use]
    pub fn range(
        field: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Creates an array-containment filter.
    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Sort direction for an ordered query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Smallest values first.
    Ascending,
    /// Largest values first.
    Descending,
}

/// An ordering applied to query results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    /// Field name to order by.
    pub field: String,
    /// Direction of the ordering.
    pub direction: Direction,
}

/// A query against one collection of the document store.
///
/// Built fluently:
///
/// ```
/// use muralis_store::{Direction, Filter, Query};
///
/// let query = Query::new("wallpapers")
///     .filter(Filter::eq("category_id", "nature"))
///     .order_by("created_at", Direction::Descending)
///     .limit(20);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    /// Collection to query.
    pub collection: String,
    /// Filters, all of which must match.
    pub filters: Vec<Filter>,
    /// Optional ordering of the result set.
    pub order_by: Option<Order>,
    /// Optional bound on the number of results.
    pub limit: Option<usize>,
    /// Resume the ordered result set after the document with this
    /// identifier. An identifier that is not part of the result set yields
    /// an empty page.
    pub start_after: Option<String>,
}

impl Query {
    /// Creates a query over the given collection with no constraints.
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
            start_after: None,
        }
    }

    /// Adds a filter; all filters must match.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Orders the result set by a field.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(Order {
            field: field.into(),
            direction,
        });
        self
    }

    /// Bounds the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resumes the ordered result set after the given document.
    #[must_use]
    pub fn start_after(mut self, id: impl Into<String>) -> Self {
        self.start_after = Some(id.into());
        self
    }
}
