//! Filter expression trees and the JSON filter DSL.
//!
//! A filter arrives as a JSON-compatible nested mapping:
//!
//! ```json
//! { "$and": [ { "name": { "$cont": "jo" } }, { "age": { "$gte": 21 } } ] }
//! ```
//!
//! Reserved composite keys are exactly `$and` and `$or`; any other key at a
//! composite level is a field name. A bare (non-object) value is an equality
//! comparison; an object value carries exactly one operator key from the
//! recognized set. The parsed tree keeps the caller's key insertion order,
//! which governs the textual layout of the rendered predicate.
//!
//! # Examples
//!
//! ```rust
//! use crudql::FilterExpression;
//!
//! // Implicit AND of two field constraints
//! let expr = FilterExpression::parse_str(r#"{"name": "jo", "age": {"$gte": 21}}"#).unwrap();
//! assert!(expr.constrains_field("name"));
//!
//! // Explicit composition
//! let expr = FilterExpression::parse_str(
//!     r#"{"$or": [{"status": "active"}, {"status": "pending"}]}"#,
//! ).unwrap();
//! assert!(!expr.is_empty());
//! ```

use serde_json::Value as JsonValue;

use crate::error::{FilterError, FilterResult};
use crate::value::FilterValue;

/// Boolean composition operator for filter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    /// All children must match.
    And,
    /// Any child must match.
    Or,
}

impl BoolOp {
    /// The SQL keyword for this operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// The exact joiner literal used between rendered children.
    pub fn joiner(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }

    /// The reserved DSL key for this operator.
    pub fn dsl_key(&self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
        }
    }

    /// Recognize a reserved composite key.
    pub fn from_dsl_key(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(Self::And),
            "$or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// Comparison operator for a single field constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equality (`field = value`), the default for bare values.
    Eq,
    /// Greater than (`$gt`).
    Gt,
    /// Greater than or equal (`$gte`).
    Gte,
    /// Less than (`$lt`).
    Lt,
    /// Less than or equal (`$lte`).
    Lte,
    /// Range check with exactly two bounds, in given order (`$between`).
    Between,
    /// Membership in a non-empty list (`$in`).
    In,
    /// Prefix match (`$starts`, `LIKE 'v%'`).
    Starts,
    /// Suffix match (`$ends`, `LIKE '%v'`).
    Ends,
    /// Substring match (`$cont`, `LIKE '%v%'`).
    Cont,
}

impl CompareOp {
    /// The DSL key for this operator.
    pub fn dsl_key(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Between => "$between",
            Self::In => "$in",
            Self::Starts => "$starts",
            Self::Ends => "$ends",
            Self::Cont => "$cont",
        }
    }

    /// Recognize a `$`-prefixed operator key on a comparison value object.
    pub fn from_dsl_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(Self::Eq),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$between" => Some(Self::Between),
            "$in" => Some(Self::In),
            "$starts" => Some(Self::Starts),
            "$ends" => Some(Self::Ends),
            "$cont" => Some(Self::Cont),
            _ => None,
        }
    }

    /// Recognize the short operator names used by flat filter rule lists
    /// (`{"field": ..., "operator": "eq", "value": ...}`).
    pub fn from_short_key(key: &str) -> Option<Self> {
        match key {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "between" => Some(Self::Between),
            "in" => Some(Self::In),
            "starts" => Some(Self::Starts),
            "ends" => Some(Self::Ends),
            "cont" => Some(Self::Cont),
            _ => None,
        }
    }
}

/// A single field/operator/value constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Field name as supplied by the caller (normalized at render time).
    pub field: String,
    /// The comparison operator.
    pub op: CompareOp,
    /// The value; its shape must match the operator's arity.
    pub value: FilterValue,
}

impl Comparison {
    /// Create a comparison, validating the operator's arity.
    ///
    /// `$between` requires exactly two values, `$in` a non-empty list, and
    /// every other operator a single scalar.
    pub fn new(
        field: impl Into<String>,
        op: CompareOp,
        value: impl Into<FilterValue>,
    ) -> FilterResult<Self> {
        let field = field.into();
        let value = value.into();
        Self::validate(op, &value).map_err(|e| e.with_field(&field))?;
        Ok(Self { field, op, value })
    }

    fn validate(op: CompareOp, value: &FilterValue) -> FilterResult<()> {
        match op {
            CompareOp::Between => match value {
                FilterValue::List(values) if values.len() == 2 => Ok(()),
                other => Err(FilterError::invalid_arity(
                    "$between",
                    "exactly 2 values",
                    other.arity(),
                )),
            },
            CompareOp::In => match value {
                FilterValue::List(values) if !values.is_empty() => Ok(()),
                other => Err(FilterError::invalid_arity(
                    "$in",
                    "a non-empty value list",
                    if other.is_list() { 0 } else { other.arity() },
                )),
            },
            _ => {
                if value.is_list() {
                    Err(FilterError::invalid_arity(
                        op.dsl_key(),
                        "exactly 1 scalar",
                        value.arity(),
                    ))
                } else if value.is_null() && op != CompareOp::Eq {
                    // null only makes sense as IS NULL; a null LIKE pattern
                    // would render '%%' and match every row.
                    Err(FilterError::malformed(format!(
                        "{} does not accept null",
                        op.dsl_key()
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// The recursive tree of comparisons and conjunctions.
///
/// `Group` nodes come from explicit `$and`/`$or` keys and render inside
/// parentheses. `All` nodes are implicit conjunctions of sibling field
/// constraints (a flat multi-key map) and render without parentheses,
/// joined with `" AND "`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterExpression {
    /// No constraints; the default "empty AND".
    #[default]
    Empty,
    /// A single field constraint.
    Comparison(Comparison),
    /// Explicit `$and`/`$or` group.
    Group(BoolOp, Vec<FilterExpression>),
    /// Implicit conjunction of sibling field constraints.
    All(Vec<FilterExpression>),
}

impl FilterExpression {
    /// Create an empty expression (matches everything).
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create an explicit `$and` group.
    pub fn and_group(children: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::Group(BoolOp::And, children.into_iter().collect())
    }

    /// Create an explicit `$or` group.
    pub fn or_group(children: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::Group(BoolOp::Or, children.into_iter().collect())
    }

    /// Create a single comparison, validating operator arity.
    pub fn comparison(
        field: impl Into<String>,
        op: CompareOp,
        value: impl Into<FilterValue>,
    ) -> FilterResult<Self> {
        Ok(Self::Comparison(Comparison::new(field, op, value)?))
    }

    /// Check whether the expression holds no constraints at any depth.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Comparison(_) => false,
            Self::Group(_, children) | Self::All(children) => {
                children.iter().all(FilterExpression::is_empty)
            }
        }
    }

    /// Parse a serialized filter expression.
    pub fn parse_str(payload: &str) -> FilterResult<Self> {
        let value: JsonValue = serde_json::from_str(payload)
            .map_err(|e| FilterError::malformed("Filter payload is not valid JSON").with_source(e))?;
        Self::parse_json(&value)
    }

    /// Parse a deserialized filter expression.
    ///
    /// Mapping iteration follows the caller's key insertion order, so the
    /// same input always yields the same tree (and the same rendered
    /// predicate).
    pub fn parse_json(value: &JsonValue) -> FilterResult<Self> {
        let JsonValue::Object(map) = value else {
            return Err(FilterError::malformed(
                "Filter expression must be a JSON object",
            ));
        };
        Self::parse_map(map)
    }

    fn parse_map(map: &serde_json::Map<String, JsonValue>) -> FilterResult<Self> {
        let mut nodes = Vec::with_capacity(map.len());
        for (key, value) in map {
            if let Some(op) = BoolOp::from_dsl_key(key) {
                nodes.push(Self::parse_group(op, value)?);
            } else {
                nodes.push(Self::Comparison(parse_field_entry(key, value)?));
            }
        }
        Ok(match nodes.len() {
            0 => Self::Empty,
            1 => nodes.pop().unwrap_or(Self::Empty),
            _ => Self::All(nodes),
        })
    }

    fn parse_group(op: BoolOp, value: &JsonValue) -> FilterResult<Self> {
        match value {
            // List form: every element is a sub-expression.
            JsonValue::Array(items) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    let JsonValue::Object(map) = item else {
                        return Err(FilterError::malformed(format!(
                            "Elements of {} must be objects",
                            op.dsl_key()
                        )));
                    };
                    children.push(Self::parse_map(map)?);
                }
                Ok(Self::Group(op, children))
            }
            // Flat field-map form: its own keys joined with this operator.
            JsonValue::Object(map) => {
                let mut children = Vec::with_capacity(map.len());
                for (key, entry) in map {
                    if let Some(nested) = BoolOp::from_dsl_key(key) {
                        children.push(Self::parse_group(nested, entry)?);
                    } else {
                        children.push(Self::Comparison(parse_field_entry(key, entry)?));
                    }
                }
                Ok(Self::Group(op, children))
            }
            _ => Err(FilterError::malformed(format!(
                "{} expects a list or an object",
                op.dsl_key()
            ))),
        }
    }

    /// Check whether `field` is constrained in the top-level conjunction.
    ///
    /// Scans direct children and first-level implicit sibling groups; does
    /// not descend into explicit nested `$and`/`$or` groups.
    pub fn constrains_field(&self, field: &str) -> bool {
        self.top_level_constraints()
            .iter()
            .any(|c| c.field == field)
    }

    /// Flat view of the top-level constraints as (field, operator, value)
    /// triples.
    pub fn top_level_constraints(&self) -> Vec<&Comparison> {
        let mut out = Vec::new();
        match self {
            Self::Empty => {}
            Self::Comparison(c) => out.push(c),
            Self::Group(_, children) | Self::All(children) => {
                for node in children {
                    match node {
                        Self::Comparison(c) => out.push(c),
                        Self::All(inner) => {
                            for nested in inner {
                                if let Self::Comparison(c) = nested {
                                    out.push(c);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        out
    }

    /// Append a constraint to the top-level conjunction.
    ///
    /// Expressions whose root is not an `$and` group are wrapped into one
    /// first. Callers are responsible for the duplicate-field check.
    pub(crate) fn push_constraint(&mut self, comparison: Comparison) {
        match self {
            Self::Empty => *self = Self::Group(BoolOp::And, vec![Self::Comparison(comparison)]),
            Self::Group(BoolOp::And, children) => children.push(Self::Comparison(comparison)),
            Self::All(children) => children.push(Self::Comparison(comparison)),
            _ => {
                let existing = std::mem::take(self);
                *self = Self::Group(BoolOp::And, vec![existing, Self::Comparison(comparison)]);
            }
        }
    }

    /// Remove every top-level constraint on `field`.
    ///
    /// Returns whether anything was removed; same scan depth as
    /// [`constrains_field`](Self::constrains_field).
    pub(crate) fn remove_field(&mut self, field: &str) -> bool {
        let mut removed = false;
        match self {
            Self::Empty => {}
            Self::Comparison(c) => {
                if c.field == field {
                    *self = Self::Empty;
                    removed = true;
                }
            }
            Self::Group(_, children) | Self::All(children) => {
                for node in children.iter_mut() {
                    match node {
                        Self::Comparison(c) if c.field == field => {
                            *node = Self::Empty;
                            removed = true;
                        }
                        Self::All(inner) => {
                            let before = inner.len();
                            inner.retain(
                                |n| !matches!(n, Self::Comparison(c) if c.field == field),
                            );
                            if inner.len() != before {
                                removed = true;
                            }
                        }
                        _ => {}
                    }
                }
                children.retain(|n| !matches!(n, Self::Empty));
            }
        }
        removed
    }
}

fn parse_field_entry(field: &str, value: &JsonValue) -> FilterResult<Comparison> {
    match value {
        JsonValue::Object(map) => {
            let mut found: Option<(CompareOp, &JsonValue)> = None;
            for (key, raw) in map {
                let Some(op) = CompareOp::from_dsl_key(key) else {
                    return Err(FilterError::unknown_operator(key).with_field(field));
                };
                if found.is_some() {
                    return Err(FilterError::ambiguous_operators(field));
                }
                found = Some((op, raw));
            }
            let Some((op, raw)) = found else {
                return Err(FilterError::malformed(format!(
                    "Comparison on '{}' carries no operator",
                    field
                ))
                .with_field(field));
            };
            Comparison::new(field, op, FilterValue::from_json(raw)?)
        }
        JsonValue::Array(_) => Err(FilterError::malformed(format!(
            "Bare list on '{}' needs an operator such as $in",
            field
        ))
        .with_field(field)),
        scalar => Comparison::new(field, CompareOp::Eq, FilterValue::from_json(scalar)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_parse_bare_value_is_equality() {
        let expr = FilterExpression::parse_json(&json!({"name": "jo"})).unwrap();
        match expr {
            FilterExpression::Comparison(c) => {
                assert_eq!(c.field, "name");
                assert_eq!(c.op, CompareOp::Eq);
                assert_eq!(c.value, FilterValue::String("jo".into()));
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_top_level_flat_map_is_implicit_and() {
        let expr =
            FilterExpression::parse_json(&json!({"name": "jo", "age": {"$gte": 21}})).unwrap();
        match &expr {
            FilterExpression::All(children) => assert_eq!(children.len(), 2),
            other => panic!("expected implicit conjunction, got {:?}", other),
        }
        assert!(expr.constrains_field("name"));
        assert!(expr.constrains_field("age"));
        assert!(!expr.constrains_field("email"));
    }

    #[test]
    fn test_parse_and_list() {
        let expr = FilterExpression::parse_json(&json!({
            "$and": [{"name": {"$cont": "jo"}}, {"age": {"$gte": 21}}]
        }))
        .unwrap();
        match &expr {
            FilterExpression::Group(BoolOp::And, children) => assert_eq!(children.len(), 2),
            other => panic!("expected $and group, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_or_flat_map() {
        let expr =
            FilterExpression::parse_json(&json!({"$or": {"a": 1, "b": 2}})).unwrap();
        match expr {
            FilterExpression::Group(BoolOp::Or, children) => assert_eq!(children.len(), 2),
            other => panic!("expected $or group, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_multi_key_list_element_is_sibling_group() {
        let expr = FilterExpression::parse_json(&json!({
            "$or": [{"a": 1, "b": 2}, {"c": 3}]
        }))
        .unwrap();
        let FilterExpression::Group(BoolOp::Or, children) = expr else {
            panic!("expected $or group");
        };
        assert!(matches!(&children[0], FilterExpression::All(inner) if inner.len() == 2));
        assert!(matches!(&children[1], FilterExpression::Comparison(_)));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err =
            FilterExpression::parse_json(&json!({"age": {"$near": 3}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownOperator);
    }

    #[test]
    fn test_multiple_operator_keys_rejected() {
        let err = FilterExpression::parse_json(&json!({"age": {"$gt": 1, "$lt": 9}}))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AmbiguousOperators);
        assert_eq!(err.field.as_deref(), Some("age"));
    }

    #[test]
    fn test_between_arity_enforced() {
        let err = FilterExpression::parse_json(&json!({"age": {"$between": [1, 2, 3]}}))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArity);

        let err = FilterExpression::parse_json(&json!({"age": {"$between": 5}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArity);

        assert!(
            FilterExpression::parse_json(&json!({"age": {"$between": [5, 10]}})).is_ok()
        );
    }

    #[test]
    fn test_in_requires_non_empty_list() {
        let err = FilterExpression::parse_json(&json!({"status": {"$in": []}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArity);

        let err =
            FilterExpression::parse_json(&json!({"status": {"$in": "active"}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArity);
    }

    #[test]
    fn test_scalar_operator_rejects_null() {
        let err =
            FilterExpression::parse_json(&json!({"name": {"$cont": null}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedFilter);

        let err = FilterExpression::parse_json(&json!({"age": {"$gt": null}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedFilter);

        // Equality with null stays valid (renders IS NULL).
        assert!(FilterExpression::parse_json(&json!({"deleted_at": null})).is_ok());
        assert!(FilterExpression::parse_json(&json!({"deleted_at": {"$eq": null}})).is_ok());
    }

    #[test]
    fn test_scalar_operator_rejects_list() {
        let err = FilterExpression::parse_json(&json!({"age": {"$gt": [1, 2]}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArity);
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let err = FilterExpression::parse_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedFilter);
        let err = FilterExpression::parse_str("not json at all {").unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedFilter);
    }

    #[test]
    fn test_empty_object_parses_to_empty() {
        let expr = FilterExpression::parse_json(&json!({})).unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn test_push_and_remove_constraint() {
        let mut expr = FilterExpression::parse_json(&json!({
            "$and": [{"name": {"$cont": "jo"}}]
        }))
        .unwrap();

        let scoped = Comparison::new("owner_id", CompareOp::Eq, 7i64).unwrap();
        expr.push_constraint(scoped);
        assert!(expr.constrains_field("owner_id"));
        assert_eq!(expr.top_level_constraints().len(), 2);

        assert!(expr.remove_field("owner_id"));
        assert!(!expr.constrains_field("owner_id"));
        assert!(!expr.remove_field("owner_id"));
    }

    #[test]
    fn test_push_wraps_or_root() {
        let mut expr =
            FilterExpression::parse_json(&json!({"$or": [{"a": 1}, {"b": 2}]})).unwrap();
        let scoped = Comparison::new("tenant_id", CompareOp::Eq, "t1").unwrap();
        expr.push_constraint(scoped);
        let FilterExpression::Group(BoolOp::And, children) = &expr else {
            panic!("expected wrapping $and group");
        };
        assert_eq!(children.len(), 2);
        assert!(expr.constrains_field("tenant_id"));
    }
}
