//! Filter values and SQL literal rendering.
//!
//! Quoting rules:
//! - Numbers render bare.
//! - Every other scalar is single-quoted; embedded `'` characters are
//!   doubled (`''`). This doubling is the predicate's only injection
//!   defense and is applied unconditionally, before any `%` wildcards.
//! - Date values are formatted to the fixed timestamp pattern
//!   `%Y-%m-%dT%H:%M:%S%.3f %:z` before quoting.
//!
//! ```rust
//! use crudql::FilterValue;
//!
//! let val = FilterValue::from("O'Hara");
//! assert_eq!(val.to_sql_literal(), "'O''Hara'");
//!
//! let val: FilterValue = 42.into();
//! assert_eq!(val.to_sql_literal(), "42");
//! ```

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Fixed timestamp pattern for date literals (`YYYY-MM-DDTHH:mm:ss.SSS Z`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f %:z";

/// Value list for `$in` and `$between`.
pub type ValueList = Vec<FilterValue>;

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Timestamp value, rendered with [`TIMESTAMP_FORMAT`].
    DateTime(DateTime<FixedOffset>),
    /// List of values.
    List(ValueList),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is a list value.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Number of values: list length, or 1 for a scalar.
    pub fn arity(&self) -> usize {
        match self {
            Self::List(values) => values.len(),
            _ => 1,
        }
    }

    /// Convert a JSON scalar (or flat array of scalars) into a value.
    ///
    /// Objects and nested arrays are not valid comparison values.
    pub fn from_json(value: &serde_json::Value) -> FilterResult<Self> {
        use serde_json::Value;
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(FilterError::malformed(format!(
                        "Unrepresentable number {}",
                        n
                    )))
                }
            }
            Value::String(s) => Ok(Self::String(s.clone())),
            Value::Array(items) => {
                let mut list = ValueList::with_capacity(items.len());
                for item in items {
                    let parsed = Self::from_json(item)?;
                    if parsed.is_list() {
                        return Err(FilterError::malformed(
                            "Nested arrays are not valid comparison values",
                        ));
                    }
                    list.push(parsed);
                }
                Ok(Self::List(list))
            }
            Value::Object(_) => Err(FilterError::malformed(
                "Objects are not valid comparison values",
            )),
        }
    }

    /// Render this value as a self-contained SQL literal.
    pub fn to_sql_literal(&self) -> String {
        let mut buf = String::with_capacity(16);
        self.write_sql_literal(&mut buf);
        buf
    }

    /// Write this value as a SQL literal directly to a buffer.
    pub fn write_sql_literal(&self, buf: &mut String) {
        use std::fmt::Write;
        match self {
            Self::Null => buf.push_str("NULL"),
            Self::Bool(b) => {
                buf.push('\'');
                buf.push_str(if *b { "true" } else { "false" });
                buf.push('\'');
            }
            Self::Int(i) => {
                let _ = write!(buf, "{}", i);
            }
            Self::Float(f) => {
                let _ = write!(buf, "{}", f);
            }
            Self::String(s) => {
                buf.push('\'');
                write_escaped(buf, s);
                buf.push('\'');
            }
            Self::DateTime(dt) => {
                buf.push('\'');
                let _ = write!(buf, "{}", dt.format(TIMESTAMP_FORMAT));
                buf.push('\'');
            }
            Self::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    value.write_sql_literal(buf);
                }
            }
        }
    }

    /// Write this value as a quoted LIKE pattern.
    ///
    /// Escaping happens before the wildcards are added, so quote doubling
    /// can never swallow a `%`.
    pub(crate) fn write_like_pattern(&self, buf: &mut String, leading: bool, trailing: bool) {
        use std::fmt::Write;
        buf.push('\'');
        if leading {
            buf.push('%');
        }
        match self {
            Self::Null => {}
            Self::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
            Self::Int(i) => {
                let _ = write!(buf, "{}", i);
            }
            Self::Float(f) => {
                let _ = write!(buf, "{}", f);
            }
            Self::String(s) => write_escaped(buf, s),
            Self::DateTime(dt) => {
                let _ = write!(buf, "{}", dt.format(TIMESTAMP_FORMAT));
            }
            // Lists never reach LIKE rendering; arity is validated upstream.
            Self::List(_) => {}
        }
        if trailing {
            buf.push('%');
        }
        buf.push('\'');
    }
}

/// Append `s` with every single quote doubled.
fn write_escaped(buf: &mut String, s: &str) {
    for ch in s.chars() {
        if ch == '\'' {
            buf.push_str("''");
        } else {
            buf.push(ch);
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<FixedOffset>> for FilterValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTime(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v.fixed_offset())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_ladder() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(
            FilterValue::from("hello"),
            FilterValue::String("hello".to_string())
        );
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
    }

    #[test]
    fn test_numbers_render_bare() {
        assert_eq!(FilterValue::Int(21).to_sql_literal(), "21");
        assert_eq!(FilterValue::Float(3.5).to_sql_literal(), "3.5");
    }

    #[test]
    fn test_strings_are_quoted() {
        assert_eq!(FilterValue::from("jo").to_sql_literal(), "'jo'");
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        assert_eq!(FilterValue::from("O'Hara").to_sql_literal(), "'O''Hara'");
        assert_eq!(FilterValue::from("''").to_sql_literal(), "''''''");
        assert_eq!(FilterValue::from("'lead").to_sql_literal(), "'''lead'");
    }

    #[test]
    fn test_like_pattern_wraps_after_escaping() {
        let mut buf = String::new();
        FilterValue::from("o'connor").write_like_pattern(&mut buf, true, true);
        assert_eq!(buf, "'%o''connor%'");

        let mut buf = String::new();
        FilterValue::from("jo").write_like_pattern(&mut buf, false, true);
        assert_eq!(buf, "'jo%'");

        let mut buf = String::new();
        FilterValue::from("jo").write_like_pattern(&mut buf, true, false);
        assert_eq!(buf, "'%jo'");
    }

    #[test]
    fn test_datetime_literal_format() {
        let dt = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 13, 45, 30)
            .unwrap();
        let val = FilterValue::DateTime(dt);
        assert_eq!(val.to_sql_literal(), "'2024-03-05T13:45:30.000 +00:00'");
    }

    #[test]
    fn test_from_json_scalars() {
        let v = FilterValue::from_json(&serde_json::json!(7)).unwrap();
        assert_eq!(v, FilterValue::Int(7));
        let v = FilterValue::from_json(&serde_json::json!("x")).unwrap();
        assert_eq!(v, FilterValue::String("x".into()));
        let v = FilterValue::from_json(&serde_json::json!([1, 2])).unwrap();
        assert_eq!(v.arity(), 2);
    }

    #[test]
    fn test_from_json_rejects_objects_and_nested_arrays() {
        assert!(FilterValue::from_json(&serde_json::json!({"a": 1})).is_err());
        assert!(FilterValue::from_json(&serde_json::json!([[1]])).is_err());
    }

    #[test]
    fn test_list_literal_joins_with_comma() {
        let list: FilterValue = vec!["a", "b"].into();
        assert_eq!(list.to_sql_literal(), "'a', 'b'");
    }

    #[test]
    fn test_list_elements_live_behind_indirection() {
        let list: FilterValue = vec![1i64, 2, 3].into();
        assert_eq!(list.arity(), 3);
        // The list variant must not embed its elements inline.
        assert!(std::mem::size_of::<FilterValue>() <= 48);
    }
}
