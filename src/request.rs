//! The normalized request bundle consumed by the listing layer.
//!
//! A [`ParsedRequest`] is built once per inbound request, optionally
//! mutated by trusted server code (scoping constraints), handed to the
//! storage layer, and discarded. It holds a single canonical
//! [`FilterExpression`]; the flat `(field, operator, value)` triple list
//! some callers expect is a read-only projection over the same tree, so
//! the two views can never disagree.
//!
//! ```rust
//! use crudql::{CompareOp, ParsedRequest};
//!
//! let mut req = ParsedRequest::new(1, 100);
//! req.add_constraint("owner_id", 7i64, CompareOp::Eq).unwrap();
//!
//! // The same field cannot be constrained twice.
//! let err = req.add_constraint("owner_id", 8i64, CompareOp::Eq).unwrap_err();
//! assert_eq!(err.kind(), crudql::ErrorKind::Forbidden);
//!
//! // Remove-then-add succeeds.
//! req.remove_constraint("owner_id");
//! req.add_constraint("owner_id", 8i64, CompareOp::Eq).unwrap();
//! ```

use tracing::trace;

use crate::error::{FilterError, FilterResult};
use crate::expr::{CompareOp, Comparison, FilterExpression};
use crate::pagination::Page;
use crate::types::SortField;
use crate::value::FilterValue;

/// Read-only flat view of one top-level constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintView<'a> {
    /// The constrained field.
    pub field: &'a str,
    /// The comparison operator.
    pub operator: CompareOp,
    /// The constraint value.
    pub value: &'a FilterValue,
}

/// Normalized paging + sort + filter bundle.
#[derive(Debug, Clone, Default)]
pub struct ParsedRequest {
    /// 1-indexed page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Resolved sort criteria, in priority order.
    pub sort: Vec<SortField>,
    search: FilterExpression,
}

impl ParsedRequest {
    /// Create a request with the given paging and an empty search.
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            sort: Vec::new(),
            search: FilterExpression::empty(),
        }
    }

    pub(crate) fn with_search(mut self, search: FilterExpression) -> Self {
        self.search = search;
        self
    }

    /// The canonical search tree.
    pub fn search(&self) -> &FilterExpression {
        &self.search
    }

    /// Consume the request, yielding the search tree.
    pub fn into_search(self) -> FilterExpression {
        self.search
    }

    /// Check whether any constraint is present.
    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty()
    }

    /// Flat projection of the top-level constraints.
    ///
    /// This is a view over the canonical tree, not a second store: a field
    /// appears here exactly when it is constrained in the tree.
    pub fn constraint_list(&self) -> Vec<ConstraintView<'_>> {
        self.search
            .top_level_constraints()
            .into_iter()
            .map(|c| ConstraintView {
                field: c.field.as_str(),
                operator: c.op,
                value: &c.value,
            })
            .collect()
    }

    /// Skip/take pair for the listing query.
    pub fn pagination(&self) -> Page {
        Page::page(self.page, self.limit)
    }

    /// Append a scoping constraint injected by trusted server code.
    ///
    /// Fails with a `Forbidden`-kind error when `field` already carries a
    /// constraint, so a caller-supplied filter can never collide with (or
    /// override) a server-injected one. This is a hard precondition, not a
    /// merge.
    pub fn add_constraint(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FilterValue>,
        operator: CompareOp,
    ) -> FilterResult<()> {
        let field = field.into();
        if self.search.constrains_field(&field) {
            return Err(FilterError::duplicate_constraint(field));
        }
        let comparison = Comparison::new(field, operator, value)?;
        trace!(field = %comparison.field, operator = ?operator, "injecting scoping constraint");
        self.search.push_constraint(comparison);
        Ok(())
    }

    /// Delete any constraint on `field`; no-op when absent.
    pub fn remove_constraint(&mut self, field: &str) {
        if self.search.remove_field(field) {
            trace!(field = %field, "removed scoping constraint");
        }
    }
}
