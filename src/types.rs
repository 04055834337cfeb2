//! Common types used in request normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Recognize the exact request-parameter spelling (`ASC`/`DESC`).
    ///
    /// Lowercase or mixed-case directions are not accepted; the sort
    /// parameter contract is case-sensitive.
    pub fn from_request_str(s: &str) -> Option<Self> {
        match s {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Asc
    }
}

/// A single resolved sort criterion.
///
/// The field is already alias-qualified for the target query
/// (`"Document"."title"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Alias-qualified column reference.
    pub field: String,
    /// The sort order.
    pub order: SortOrder,
}

impl SortField {
    /// Create a sort field from an already-qualified column reference.
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Create a sort field qualified with a table alias.
    ///
    /// Both parts are quoted identifiers; embedded `"` characters are
    /// doubled so a caller-supplied field cannot break out of the quoting.
    pub fn qualified(alias: &str, column: &str, order: SortOrder) -> Self {
        let mut field = String::with_capacity(alias.len() + column.len() + 5);
        push_quoted_ident(&mut field, alias);
        field.push('.');
        push_quoted_ident(&mut field, column);
        Self { field, order }
    }

    /// Generate the SQL for this sort criterion.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(self.field.len() + 5);
        self.write_sql(&mut sql);
        sql
    }

    /// Write the SQL directly to a buffer.
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        buffer.push_str(&self.field);
        buffer.push(' ');
        buffer.push_str(self.order.as_sql());
    }
}

/// Append a double-quoted identifier with embedded `"` doubled.
fn push_quoted_ident(buf: &mut String, ident: &str) {
    buf.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            buf.push_str("\"\"");
        } else {
            buf.push(ch);
        }
    }
    buf.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }

    #[test]
    fn test_from_request_str_is_case_sensitive() {
        assert_eq!(SortOrder::from_request_str("ASC"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::from_request_str("DESC"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::from_request_str("asc"), None);
        assert_eq!(SortOrder::from_request_str("SIDEWAYS"), None);
    }

    #[test]
    fn test_sort_field_sql() {
        let sort = SortField::qualified("Document", "title", SortOrder::Asc);
        assert_eq!(sort.field, "\"Document\".\"title\"");
        assert_eq!(sort.to_sql(), "\"Document\".\"title\" ASC");
    }

    #[test]
    fn test_embedded_quote_cannot_escape_identifier() {
        let sort = SortField::qualified("Doc", "ti\"le", SortOrder::Asc);
        assert_eq!(sort.field, "\"Doc\".\"ti\"\"le\"");
    }
}
