//! Error types for filter parsing and request normalization.
//!
//! Every failure in this crate is synchronous and raised straight back to
//! the caller; there are no partial-failure states because the crate does
//! no I/O. Errors carry:
//! - A numeric [`ErrorCode`] for programmatic handling
//! - An [`ErrorKind`] the enclosing HTTP layer maps to a status code
//! - The offending request parameter name(s), when known
//!
//! # Error Codes
//!
//! Error codes follow a pattern: F{category}{number}
//! - 1xxx: Filter parse errors (malformed DSL, arity, unknown operators)
//! - 2xxx: Request shape errors (sort, paging)
//! - 3xxx: Constraint mutation errors (double-constrained fields)
//!
//! ```rust
//! use crudql::{ErrorCode, ErrorKind};
//!
//! let code = ErrorCode::InvalidSort;
//! assert_eq!(code.code(), "F2001");
//! assert_eq!(code.kind(), ErrorKind::BadRequest);
//!
//! let code = ErrorCode::DuplicateConstraint;
//! assert_eq!(code.kind(), ErrorKind::Forbidden);
//! ```
//!
//! # Creating Errors
//!
//! ```rust
//! use crudql::{FilterError, ErrorCode};
//!
//! let err = FilterError::invalid_sort("title;ASC");
//! assert_eq!(err.code, ErrorCode::InvalidSort);
//! assert_eq!(err.parameters, vec!["sort".to_string()]);
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for filter and request operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Filter parse errors (1xxx)
    /// The filter payload is not a valid filter expression (F1001).
    MalformedFilter = 1001,
    /// An operator key is not in the recognized operator set (F1002).
    UnknownOperator = 1002,
    /// An operator received the wrong number of values (F1003).
    InvalidArity = 1003,
    /// A field name is not present in the entity scheme (F1004).
    UnknownField = 1004,
    /// A comparison object carries more than one operator key (F1005).
    AmbiguousOperators = 1005,

    // Request shape errors (2xxx)
    /// The sort parameter is not `"<field>,<ASC|DESC>"` (F2001).
    InvalidSort = 2001,
    /// Both `limit` and `per_page` were supplied (F2002).
    ConflictingLimit = 2002,
    /// The page number is zero (F2003).
    InvalidPage = 2003,
    /// The request body has no query object under the configured key (F2004).
    MissingQueryBody = 2004,
    /// The limit is zero (F2005).
    InvalidLimit = 2005,

    // Constraint mutation errors (3xxx)
    /// A field is already constrained in the request (F3001).
    DuplicateConstraint = 3001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "F2001").
    pub fn code(&self) -> String {
        format!("F{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MalformedFilter => "Malformed filter expression",
            Self::UnknownOperator => "Unknown filter operator",
            Self::InvalidArity => "Wrong number of operator values",
            Self::UnknownField => "Unknown field",
            Self::AmbiguousOperators => "Multiple operators on one comparison",
            Self::InvalidSort => "Invalid sort parameter",
            Self::ConflictingLimit => "Conflicting limit parameters",
            Self::InvalidPage => "Invalid page number",
            Self::MissingQueryBody => "Missing query object in request body",
            Self::InvalidLimit => "Invalid limit",
            Self::DuplicateConstraint => "Field is already constrained",
        }
    }

    /// The error class the HTTP layer maps to a status code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateConstraint => ErrorKind::Forbidden,
            _ => ErrorKind::BadRequest,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Coarse error class for the enclosing HTTP layer.
///
/// The crate never produces a response itself; it only signals a
/// distinguishable kind plus a descriptive payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller supplied a malformed request (400).
    BadRequest,
    /// The caller attempted to override a server-injected constraint (403).
    Forbidden,
}

impl ErrorKind {
    /// The conventional HTTP status code for this kind.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
        }
    }
}

/// Errors raised by filter parsing, compilation and request normalization.
#[derive(Error, Debug)]
pub struct FilterError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Offending request parameter name(s), when known.
    pub parameters: Vec<String>,
    /// The field involved, when known.
    pub field: Option<String>,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl FilterError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            parameters: Vec::new(),
            field: None,
            source: None,
        }
    }

    /// The error class the HTTP layer maps to a status code.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Name an offending request parameter.
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// Set the field involved.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a malformed-filter error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedFilter, message)
    }

    /// Create an unknown-operator error.
    pub fn unknown_operator(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::UnknownOperator,
            format!("Unrecognized filter operator '{}'", key),
        )
    }

    /// Create a wrong-arity error for an operator.
    pub fn invalid_arity(operator: &str, expected: &str, got: usize) -> Self {
        Self::new(
            ErrorCode::InvalidArity,
            format!("{} expects {} but got {} value(s)", operator, expected, got),
        )
    }

    /// Create an unknown-field error.
    pub fn unknown_field(field: impl Into<String>, entity: &str) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::UnknownField,
            format!("Field '{}' does not exist on entity {}", field, entity),
        )
        .with_field(field)
    }

    /// Create an ambiguous-operators error.
    pub fn ambiguous_operators(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::AmbiguousOperators,
            format!(
                "Comparison on '{}' carries more than one operator key",
                field
            ),
        )
        .with_field(field)
    }

    /// Create an invalid-sort error, naming the `sort` parameter.
    pub fn invalid_sort(given: &str) -> Self {
        Self::new(
            ErrorCode::InvalidSort,
            format!("Sort must be \"<field>,<ASC|DESC>\", got \"{}\"", given),
        )
        .with_parameter("sort")
    }

    /// Create a conflicting-limit error, naming the `limit` parameter.
    pub fn conflicting_limit() -> Self {
        Self::new(
            ErrorCode::ConflictingLimit,
            "Supply either limit or per_page, not both",
        )
        .with_parameter("limit")
    }

    /// Create an invalid-page error, naming the `page` parameter.
    pub fn invalid_page() -> Self {
        Self::new(ErrorCode::InvalidPage, "Page must be a positive integer").with_parameter("page")
    }

    /// Create an invalid-limit error, naming the `limit` parameter.
    pub fn invalid_limit() -> Self {
        Self::new(ErrorCode::InvalidLimit, "Limit must be a positive integer")
            .with_parameter("limit")
    }

    /// Create a missing-query-body error.
    pub fn missing_query_body(key: &str) -> Self {
        Self::new(
            ErrorCode::MissingQueryBody,
            format!("Request body has no query object under '{}'", key),
        )
        .with_parameter(key)
    }

    /// Create a duplicate-constraint error.
    pub fn duplicate_constraint(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::DuplicateConstraint,
            format!("Field '{}' is already constrained", field),
        )
        .with_field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::MalformedFilter.code(), "F1001");
        assert_eq!(ErrorCode::ConflictingLimit.code(), "F2002");
        assert_eq!(ErrorCode::DuplicateConstraint.code(), "F3001");
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(ErrorCode::InvalidSort.kind(), ErrorKind::BadRequest);
        assert_eq!(ErrorCode::InvalidArity.kind(), ErrorKind::BadRequest);
        assert_eq!(ErrorCode::DuplicateConstraint.kind(), ErrorKind::Forbidden);
        assert_eq!(ErrorKind::BadRequest.http_status(), 400);
        assert_eq!(ErrorKind::Forbidden.http_status(), 403);
    }

    #[test]
    fn test_display_includes_code() {
        let err = FilterError::conflicting_limit();
        let rendered = err.to_string();
        assert!(rendered.starts_with("[F2002]"));
        assert_eq!(err.parameters, vec!["limit".to_string()]);
    }

    #[test]
    fn test_invalid_sort_names_parameter() {
        let err = FilterError::invalid_sort("title");
        assert_eq!(err.code, ErrorCode::InvalidSort);
        assert_eq!(err.parameters, vec!["sort".to_string()]);
    }

    #[test]
    fn test_duplicate_constraint_carries_field() {
        let err = FilterError::duplicate_constraint("owner_id");
        assert_eq!(err.field.as_deref(), Some("owner_id"));
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
