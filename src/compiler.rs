//! Rendering filter expressions into WHERE-clause fragments.
//!
//! The compiler is a pure transformation: it never touches storage, only
//! produces a predicate string the listing layer splices into its query
//! builder. Rendering is deterministic — the textual layout follows the
//! insertion order of the parsed mapping, and the same tree always yields
//! byte-identical output.
//!
//! # Examples
//!
//! ```rust
//! use crudql::{FilterCompiler, FilterExpression};
//!
//! let expr = FilterExpression::parse_str(
//!     r#"{"$and": [{"name": {"$cont": "jo"}}, {"age": {"$gte": 21}}]}"#,
//! ).unwrap();
//!
//! let compiler = FilterCompiler::new();
//! let predicate = compiler.render(&expr).unwrap();
//! assert_eq!(predicate, "(name LIKE '%jo%' AND age >= 21)");
//! ```
//!
//! With a table alias and a schema descriptor:
//!
//! ```rust
//! use crudql::{EntityScheme, FieldKind, FilterCompiler, FilterExpression};
//!
//! let scheme = EntityScheme::new("Document")
//!     .field("title", FieldKind::Text);
//!
//! let compiler = FilterCompiler::new()
//!     .with_table_alias("Document")
//!     .with_scheme(scheme);
//!
//! let expr = FilterExpression::parse_str(r#"{"title": "draft"}"#).unwrap();
//! assert_eq!(
//!     compiler.render(&expr).unwrap(),
//!     "\"Document\".\"title\" = 'draft'"
//! );
//! ```

use std::fmt::Write;

use convert_case::{Case, Casing};
use tracing::debug;

use crate::error::{FilterError, FilterResult};
use crate::expr::{CompareOp, Comparison, FilterExpression};
use crate::schema::EntityScheme;
use crate::value::FilterValue;

/// Renders a [`FilterExpression`] into a SQL predicate fragment.
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    table_alias: Option<String>,
    scheme: Option<EntityScheme>,
}

impl FilterCompiler {
    /// Create a compiler with no alias qualification and no schema checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualify rendered columns with a table alias (`"Alias"."column"`).
    pub fn with_table_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = Some(alias.into());
        self
    }

    /// Validate field names against an entity scheme; unknown fields fail
    /// with [`ErrorCode::UnknownField`](crate::ErrorCode::UnknownField).
    pub fn with_scheme(mut self, scheme: EntityScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Render the expression into a WHERE-clause fragment.
    ///
    /// An empty expression renders to an empty string; callers check
    /// [`FilterExpression::is_empty`] before splicing.
    pub fn render(&self, expr: &FilterExpression) -> FilterResult<String> {
        let mut sql = String::with_capacity(64);
        self.write_expr(expr, &mut sql)?;
        if !sql.is_empty() {
            debug!(predicate = %sql, "rendered filter predicate");
        }
        Ok(sql)
    }

    fn write_expr(&self, expr: &FilterExpression, buf: &mut String) -> FilterResult<()> {
        match expr {
            FilterExpression::Empty => Ok(()),
            FilterExpression::Comparison(c) => self.write_comparison(c, buf),
            FilterExpression::Group(op, children) => {
                let live: Vec<_> = children.iter().filter(|c| !c.is_empty()).collect();
                if live.is_empty() {
                    return Ok(());
                }
                buf.push('(');
                for (i, child) in live.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(op.joiner());
                    }
                    self.write_expr(child, buf)?;
                }
                buf.push(')');
                Ok(())
            }
            FilterExpression::All(children) => {
                let live: Vec<_> = children.iter().filter(|c| !c.is_empty()).collect();
                for (i, child) in live.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(" AND ");
                    }
                    self.write_expr(child, buf)?;
                }
                Ok(())
            }
        }
    }

    fn write_comparison(&self, c: &Comparison, buf: &mut String) -> FilterResult<()> {
        let column = c.field.to_case(Case::Snake);
        if let Some(scheme) = &self.scheme {
            if !scheme.contains(&column) {
                return Err(FilterError::unknown_field(column, scheme.entity()));
            }
        }

        if let Some(alias) = &self.table_alias {
            let _ = write!(buf, "\"{}\".\"{}\"", alias, column);
        } else {
            buf.push_str(&column);
        }

        match c.op {
            CompareOp::Eq => {
                if c.value.is_null() {
                    buf.push_str(" IS NULL");
                } else {
                    buf.push_str(" = ");
                    c.value.write_sql_literal(buf);
                }
            }
            CompareOp::Gt => {
                buf.push_str(" > ");
                c.value.write_sql_literal(buf);
            }
            CompareOp::Gte => {
                buf.push_str(" >= ");
                c.value.write_sql_literal(buf);
            }
            CompareOp::Lt => {
                buf.push_str(" < ");
                c.value.write_sql_literal(buf);
            }
            CompareOp::Lte => {
                buf.push_str(" <= ");
                c.value.write_sql_literal(buf);
            }
            CompareOp::Between => {
                let FilterValue::List(bounds) = &c.value else {
                    return Err(FilterError::invalid_arity(
                        "$between",
                        "exactly 2 values",
                        c.value.arity(),
                    ));
                };
                if bounds.len() != 2 {
                    return Err(FilterError::invalid_arity(
                        "$between",
                        "exactly 2 values",
                        bounds.len(),
                    ));
                }
                // Bounds render in given order, never sorted.
                buf.push_str(" BETWEEN ");
                bounds[0].write_sql_literal(buf);
                buf.push_str(" AND ");
                bounds[1].write_sql_literal(buf);
            }
            CompareOp::In => {
                let FilterValue::List(values) = &c.value else {
                    return Err(FilterError::invalid_arity(
                        "$in",
                        "a non-empty value list",
                        c.value.arity(),
                    ));
                };
                if values.is_empty() {
                    return Err(FilterError::invalid_arity("$in", "a non-empty value list", 0));
                }
                buf.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    value.write_sql_literal(buf);
                }
                buf.push(')');
            }
            CompareOp::Starts => {
                buf.push_str(" LIKE ");
                c.value.write_like_pattern(buf, false, true);
            }
            CompareOp::Ends => {
                buf.push_str(" LIKE ");
                c.value.write_like_pattern(buf, true, false);
            }
            CompareOp::Cont => {
                buf.push_str(" LIKE ");
                c.value.write_like_pattern(buf, true, true);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::schema::FieldKind;
    use serde_json::json;

    fn render(payload: serde_json::Value) -> String {
        let expr = FilterExpression::parse_json(&payload).unwrap();
        FilterCompiler::new().render(&expr).unwrap()
    }

    #[test]
    fn test_equality_of_bare_value() {
        assert_eq!(render(json!({"name": "jo"})), "name = 'jo'");
        assert_eq!(render(json!({"age": 21})), "age = 21");
    }

    #[test]
    fn test_ordering_operators() {
        assert_eq!(render(json!({"age": {"$gt": 21}})), "age > 21");
        assert_eq!(render(json!({"age": {"$gte": 21}})), "age >= 21");
        assert_eq!(render(json!({"age": {"$lt": 21}})), "age < 21");
        assert_eq!(render(json!({"age": {"$lte": 21}})), "age <= 21");
    }

    #[test]
    fn test_between_keeps_given_order() {
        assert_eq!(
            render(json!({"age": {"$between": [5, 10]}})),
            "age BETWEEN 5 AND 10"
        );
        assert_eq!(
            render(json!({"age": {"$between": [10, 5]}})),
            "age BETWEEN 10 AND 5"
        );
    }

    #[test]
    fn test_in_list() {
        assert_eq!(
            render(json!({"status": {"$in": ["a", "b"]}})),
            "status IN ('a', 'b')"
        );
    }

    #[test]
    fn test_like_operators() {
        assert_eq!(render(json!({"name": {"$starts": "jo"}})), "name LIKE 'jo%'");
        assert_eq!(render(json!({"name": {"$ends": "jo"}})), "name LIKE '%jo'");
        assert_eq!(render(json!({"name": {"$cont": "jo"}})), "name LIKE '%jo%'");
    }

    #[test]
    fn test_and_group_mixing_like_and_ordering() {
        assert_eq!(
            render(json!({"$and": [{"name": {"$cont": "jo"}}, {"age": {"$gte": 21}}]})),
            "(name LIKE '%jo%' AND age >= 21)"
        );
    }

    #[test]
    fn test_implicit_and_has_no_parentheses() {
        assert_eq!(
            render(json!({"name": "jo", "age": {"$gte": 21}})),
            "name = 'jo' AND age >= 21"
        );
    }

    #[test]
    fn test_or_group() {
        assert_eq!(
            render(json!({"$or": [{"a": 1}, {"b": 2}]})),
            "(a = 1 OR b = 2)"
        );
        assert_eq!(
            render(json!({"$or": {"a": 1, "b": 2}})),
            "(a = 1 OR b = 2)"
        );
    }

    #[test]
    fn test_sibling_group_inside_or_joins_with_and() {
        assert_eq!(
            render(json!({"$or": [{"a": 1, "b": 2}, {"c": 3}]})),
            "(a = 1 AND b = 2 OR c = 3)"
        );
    }

    #[test]
    fn test_nested_groups() {
        assert_eq!(
            render(json!({
                "$and": [
                    {"$or": [{"role": "admin"}, {"role": "editor"}]},
                    {"active": true}
                ]
            })),
            "((role = 'admin' OR role = 'editor') AND active = 'true')"
        );
    }

    #[test]
    fn test_joiner_count_matches_leaf_count() {
        let sql = render(json!({"$and": [{"a": 1}, {"b": 2}, {"c": 3}, {"d": 4}]}));
        assert_eq!(sql.matches(" AND ").count(), 3);

        let sql = render(json!({"$or": [{"a": 1}, {"b": 2}, {"c": 3}]}));
        assert_eq!(sql.matches(" OR ").count(), 2);
    }

    #[test]
    fn test_quote_doubling_survives_like_wrapping() {
        assert_eq!(
            render(json!({"name": {"$cont": "o'connor"}})),
            "name LIKE '%o''connor%'"
        );
        assert_eq!(render(json!({"name": "o'connor"})), "name = 'o''connor'");
    }

    #[test]
    fn test_field_names_are_snake_cased() {
        assert_eq!(
            render(json!({"createdAt": {"$lt": 5}})),
            "created_at < 5"
        );
    }

    #[test]
    fn test_null_equality_renders_is_null() {
        assert_eq!(render(json!({"deleted_at": null})), "deleted_at IS NULL");
    }

    #[test]
    fn test_empty_expression_renders_nothing() {
        assert_eq!(render(json!({})), "");
        assert_eq!(render(json!({"$and": []})), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let expr = FilterExpression::parse_json(
            &json!({"$and": [{"b": 2}, {"a": 1}, {"name": {"$cont": "x"}}]}),
        )
        .unwrap();
        let compiler = FilterCompiler::new();
        let first = compiler.render(&expr).unwrap();
        let second = compiler.render(&expr).unwrap();
        assert_eq!(first, second);
        // Insertion order governs layout; nothing is reordered.
        assert_eq!(first, "(b = 2 AND a = 1 AND name LIKE '%x%')");
    }

    #[test]
    fn test_table_alias_qualification() {
        let expr = FilterExpression::parse_json(&json!({"title": "x"})).unwrap();
        let compiler = FilterCompiler::new().with_table_alias("Document");
        assert_eq!(
            compiler.render(&expr).unwrap(),
            "\"Document\".\"title\" = 'x'"
        );
    }

    #[test]
    fn test_scheme_rejects_unknown_fields() {
        let scheme = EntityScheme::new("Event").field("name", FieldKind::Text);
        let compiler = FilterCompiler::new().with_scheme(scheme);

        let ok = FilterExpression::parse_json(&json!({"name": "x"})).unwrap();
        assert!(compiler.render(&ok).is_ok());

        let bad = FilterExpression::parse_json(&json!({"secret": "x"})).unwrap();
        let err = compiler.render(&bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownField);
    }
}
