//! Bridging raw HTTP request payloads into [`ParsedRequest`]s.
//!
//! Two entry points cover the ways a listing request arrives:
//!
//! - [`RequestAdapter::from_query_parameters`] for query-string requests
//!   (`?s={"name":"jo"}&sort=name,ASC&page=2&per_page=20`);
//! - [`RequestAdapter::from_body`] for synthetic requests carried in a
//!   JSON body under a configurable key (default `"query"`).
//!
//! Both normalize into the same canonical shape: the search tree's root is
//! always an `$and` group, with any top-level flat comparison keys hoisted
//! into it, so the tree view and the flat constraint view stay consistent.
//!
//! ```rust
//! use crudql::{QueryConfig, RawQueryParameters, RequestAdapter};
//!
//! let adapter = RequestAdapter::new(QueryConfig::default());
//! let raw = RawQueryParameters {
//!     s: Some(r#"{"name": {"$cont": "jo"}}"#.to_string()),
//!     sort: Some("name,ASC".to_string()),
//!     page: Some(2),
//!     per_page: Some(20),
//!     ..Default::default()
//! };
//!
//! let req = adapter.from_query_parameters(&raw, "User").unwrap();
//! assert_eq!(req.page, 2);
//! assert_eq!(req.limit, 20);
//! assert_eq!(req.sort[0].field, "\"User\".\"name\"");
//! ```

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::QueryConfig;
use crate::error::{FilterError, FilterResult};
use crate::expr::{BoolOp, CompareOp, Comparison, FilterExpression};
use crate::request::ParsedRequest;
use crate::types::{SortField, SortOrder};
use crate::value::FilterValue;

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQueryParameters {
    /// Serialized filter expression (short alias).
    pub s: Option<String>,
    /// Serialized filter expression.
    pub search: Option<String>,
    /// Serialized filter expression (legacy alias).
    pub filter: Option<String>,
    /// Sort criterion, exactly `"<field>,<ASC|DESC>"`.
    pub sort: Option<String>,
    /// Page size; mutually exclusive with `per_page`.
    pub limit: Option<u64>,
    /// Page size; mutually exclusive with `limit`.
    pub per_page: Option<u64>,
    /// 1-indexed page number.
    pub page: Option<u64>,
}

/// Normalizes inbound request payloads into [`ParsedRequest`]s.
#[derive(Debug, Clone, Default)]
pub struct RequestAdapter {
    config: QueryConfig,
}

impl RequestAdapter {
    /// Create an adapter with the given configuration.
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// The adapter's configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Normalize query-string parameters into a [`ParsedRequest`].
    ///
    /// `s` takes precedence over `search`, which takes precedence over
    /// `filter`; whichever is present is parsed as a serialized filter
    /// expression. Supplying both `limit` and `per_page` fails with a
    /// `BadRequest`-kind error naming `limit`.
    pub fn from_query_parameters(
        &self,
        raw: &RawQueryParameters,
        table_alias: &str,
    ) -> FilterResult<ParsedRequest> {
        let (page, limit) = self.resolve_paging(raw.limit, raw.per_page, raw.page)?;

        let payload = raw
            .s
            .as_deref()
            .or(raw.search.as_deref())
            .or(raw.filter.as_deref());
        let search = match payload {
            Some(payload) => canonicalize(FilterExpression::parse_str(payload)?),
            None => FilterExpression::and_group([]),
        };

        let mut req = ParsedRequest::new(page, limit).with_search(search);
        if let Some(sort) = raw.sort.as_deref() {
            req.sort.push(Self::parse_sort(sort, table_alias)?);
        }

        debug!(
            page = req.page,
            limit = req.limit,
            filtered = req.is_filtered(),
            "normalized listing request"
        );
        Ok(req)
    }

    /// Build a synthetic [`ParsedRequest`] from a JSON request body.
    ///
    /// The query object is looked up under the configured body key. Within
    /// it, `search` (or its `s` alias) may be a serialized string or a
    /// nested object; a flat `filter` rule list
    /// (`[{"field", "operator", "value"}, ...]`) is folded into the search
    /// tree when the tree holds no constraints of its own.
    pub fn from_body(&self, body: &JsonValue, table_alias: &str) -> FilterResult<ParsedRequest> {
        let Some(query) = body.get(&self.config.body_key) else {
            return Err(FilterError::missing_query_body(&self.config.body_key));
        };
        let JsonValue::Object(query) = query else {
            return Err(FilterError::malformed(format!(
                "'{}' must be a JSON object",
                self.config.body_key
            ))
            .with_parameter(&self.config.body_key));
        };

        let (page, limit) = self.resolve_paging(
            body_paging_value(query, "limit")?,
            body_paging_value(query, "per_page")?,
            body_paging_value(query, "page")?,
        )?;

        let search_value = query.get("search").or_else(|| query.get("s"));
        let parsed = match search_value {
            Some(JsonValue::String(payload)) => FilterExpression::parse_str(payload)?,
            Some(value) => FilterExpression::parse_json(value)?,
            None => FilterExpression::Empty,
        };
        let mut search = canonicalize(parsed);

        if search.is_empty() {
            if let Some(JsonValue::Array(rules)) = query.get("filter") {
                let mut children = Vec::with_capacity(rules.len());
                for rule in rules {
                    children.push(FilterExpression::Comparison(parse_filter_rule(rule)?));
                }
                search = FilterExpression::Group(BoolOp::And, children);
            }
        }

        let mut req = ParsedRequest::new(page, limit).with_search(search);
        if let Some(sort) = query.get("sort").and_then(JsonValue::as_str) {
            req.sort.push(Self::parse_sort(sort, table_alias)?);
        }

        debug!(
            page = req.page,
            limit = req.limit,
            filtered = req.is_filtered(),
            "normalized body-borne listing request"
        );
        Ok(req)
    }

    /// Parse a sort parameter of the exact shape `"<field>,<ASC|DESC>"`.
    ///
    /// The field is qualified with the table alias for the target query.
    /// Any other shape fails with a `BadRequest`-kind error naming `sort`.
    pub fn parse_sort(sort: &str, table_alias: &str) -> FilterResult<SortField> {
        let mut parts = sort.split(',');
        let (Some(field), Some(direction), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(FilterError::invalid_sort(sort));
        };
        let Some(order) = SortOrder::from_request_str(direction) else {
            return Err(FilterError::invalid_sort(sort));
        };
        if field.is_empty() {
            return Err(FilterError::invalid_sort(sort));
        }
        Ok(SortField::qualified(table_alias, field, order))
    }

    fn resolve_paging(
        &self,
        limit: Option<u64>,
        per_page: Option<u64>,
        page: Option<u64>,
    ) -> FilterResult<(u64, u64)> {
        if limit.is_some() && per_page.is_some() {
            return Err(FilterError::conflicting_limit());
        }
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(FilterError::invalid_page());
        }
        let mut limit = limit.or(per_page).unwrap_or(self.config.default_limit);
        if limit == 0 {
            return Err(FilterError::invalid_limit());
        }
        if limit > self.config.max_limit {
            debug!(
                requested = limit,
                max = self.config.max_limit,
                "clamping limit to configured ceiling"
            );
            limit = self.config.max_limit;
        }
        Ok((page, limit))
    }
}

/// Hoist any top-level flat comparison keys into the `$and` list form, so
/// the canonical root is always an `$and` group.
fn canonicalize(expr: FilterExpression) -> FilterExpression {
    match expr {
        FilterExpression::Empty => FilterExpression::and_group([]),
        FilterExpression::Group(BoolOp::And, children) => {
            FilterExpression::Group(BoolOp::And, children)
        }
        FilterExpression::All(children) => FilterExpression::Group(BoolOp::And, children),
        other => FilterExpression::and_group([other]),
    }
}

/// Read a paging value from the query object, rejecting wrong-typed
/// entries (strings, negatives, floats) instead of silently defaulting.
fn body_paging_value(
    query: &serde_json::Map<String, JsonValue>,
    key: &str,
) -> FilterResult<Option<u64>> {
    match query.get(key) {
        None => Ok(None),
        Some(value) => match value.as_u64() {
            Some(n) => Ok(Some(n)),
            None => Err(if key == "page" {
                FilterError::invalid_page()
            } else {
                FilterError::invalid_limit()
            }),
        },
    }
}

fn parse_filter_rule(rule: &JsonValue) -> FilterResult<Comparison> {
    let JsonValue::Object(rule) = rule else {
        return Err(FilterError::malformed("Filter rules must be objects"));
    };
    let Some(field) = rule.get("field").and_then(JsonValue::as_str) else {
        return Err(FilterError::malformed("Filter rule is missing 'field'"));
    };
    let Some(operator) = rule.get("operator").and_then(JsonValue::as_str) else {
        return Err(FilterError::malformed("Filter rule is missing 'operator'").with_field(field));
    };
    let Some(op) = CompareOp::from_short_key(operator) else {
        return Err(FilterError::unknown_operator(operator).with_field(field));
    };
    let value = match rule.get("value") {
        Some(value) => FilterValue::from_json(value)?,
        None => FilterValue::Null,
    };
    Comparison::new(field, op, value)
}
