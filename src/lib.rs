//! # crudql
//!
//! Filter-expression compiler and request adapter for CRUD listing endpoints.
//!
//! This crate turns the JSON filter DSL used by generic CRUD APIs
//! (`{"$and": [{"name": {"$cont": "jo"}}, {"age": {"$gte": 21}}]}`) into
//! SQL `WHERE` fragments, and normalizes raw listing requests (search,
//! sort, pagination) into a single canonical form. It provides:
//!
//! - A parsed filter tree ([`FilterExpression`]) with `$and`/`$or` groups
//!   and ten comparison operators
//! - A compiler ([`FilterCompiler`]) rendering trees to deterministic SQL
//!   condition strings, with optional table-alias qualification and
//!   schema validation
//! - A request adapter ([`RequestAdapter`]) normalizing query-string or
//!   body-borne parameters into [`ParsedRequest`]s
//! - Structured error codes ([`ErrorCode`]) mapping to HTTP 400/403
//!
//! ## Compiling a filter
//!
//! ```rust
//! use crudql::{FilterCompiler, FilterExpression};
//!
//! let expr = FilterExpression::parse_str(
//!     r#"{"$and": [{"name": {"$cont": "jo"}}, {"age": {"$gte": 21}}]}"#,
//! ).unwrap();
//!
//! let sql = FilterCompiler::new().render(&expr).unwrap();
//! assert_eq!(sql, "(name LIKE '%jo%' AND age >= 21)");
//! ```
//!
//! ## Qualifying with a table alias
//!
//! ```rust
//! use crudql::{FilterCompiler, FilterExpression};
//!
//! let expr = FilterExpression::parse_str(r#"{"age": {"$between": [5, 10]}}"#).unwrap();
//! let sql = FilterCompiler::new()
//!     .with_table_alias("User")
//!     .render(&expr)
//!     .unwrap();
//! assert_eq!(sql, "\"User\".\"age\" BETWEEN 5 AND 10");
//! ```
//!
//! ## Filter values
//!
//! ```rust
//! use crudql::FilterValue;
//!
//! let val: FilterValue = 42.into();
//! assert!(matches!(val, FilterValue::Int(42)));
//!
//! let val: FilterValue = "o'neil".into();
//! assert_eq!(val.to_sql_literal(), "'o''neil'");
//!
//! let val = FilterValue::Null;
//! assert!(val.is_null());
//! ```
//!
//! ## Normalizing a request
//!
//! ```rust
//! use crudql::{QueryConfig, RawQueryParameters, RequestAdapter};
//!
//! let adapter = RequestAdapter::new(QueryConfig::default());
//! let raw = RawQueryParameters {
//!     s: Some(r#"{"status": "active"}"#.to_string()),
//!     sort: Some("title,ASC".to_string()),
//!     ..Default::default()
//! };
//!
//! let req = adapter.from_query_parameters(&raw, "Document").unwrap();
//! assert_eq!(req.page, 1);
//! assert_eq!(req.limit, 100);
//! assert_eq!(req.sort[0].to_sql(), "\"Document\".\"title\" ASC");
//! assert_eq!(req.constraint_list().len(), 1);
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use crudql::{ErrorKind, FilterError, ErrorCode};
//!
//! let err = FilterError::conflicting_limit();
//! assert_eq!(err.code, ErrorCode::ConflictingLimit);
//! assert_eq!(err.code.kind(), ErrorKind::BadRequest);
//! assert_eq!(err.code.kind().http_status(), 400);
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod adapter;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expr;
pub mod logging;
pub mod pagination;
pub mod request;
pub mod schema;
pub mod types;
pub mod value;

pub use adapter::{RawQueryParameters, RequestAdapter};
pub use compiler::FilterCompiler;
pub use config::QueryConfig;
pub use error::{ErrorCode, ErrorKind, FilterError, FilterResult};
pub use expr::{BoolOp, CompareOp, Comparison, FilterExpression};
pub use pagination::Page;
pub use request::{ConstraintView, ParsedRequest};
pub use schema::{EntityScheme, FieldDescriptor, FieldKind};
pub use types::{SortField, SortOrder};
pub use value::{FilterValue, TIMESTAMP_FORMAT, ValueList};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::adapter::{RawQueryParameters, RequestAdapter};
    pub use crate::compiler::FilterCompiler;
    pub use crate::config::QueryConfig;
    pub use crate::error::{ErrorCode, ErrorKind, FilterError, FilterResult};
    pub use crate::expr::{BoolOp, CompareOp, Comparison, FilterExpression};
    pub use crate::pagination::Page;
    pub use crate::request::{ConstraintView, ParsedRequest};
    pub use crate::schema::{EntityScheme, FieldKind};
    pub use crate::types::{SortField, SortOrder};
    pub use crate::value::FilterValue;
}
