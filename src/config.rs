//! Listing-query configuration.
//!
//! An explicit value passed to [`RequestAdapter`](crate::RequestAdapter) at
//! construction; there is no process-wide configuration state.
//!
//! ```rust
//! use crudql::QueryConfig;
//!
//! let config = QueryConfig::new()
//!     .with_default_limit(50)
//!     .with_max_limit(10_000);
//!
//! assert_eq!(config.default_limit, 50);
//! assert_eq!(config.body_key, "query");
//! ```

use serde::{Deserialize, Serialize};

/// Configuration for request normalization and the listing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size applied when neither `limit` nor `per_page` is given.
    pub default_limit: u64,
    /// Ceiling a caller-supplied limit is clamped to.
    pub max_limit: u64,
    /// Result-cache TTL in milliseconds, handed through to the listing
    /// layer (this crate does not cache anything itself).
    pub cache_ttl_ms: u64,
    /// Request-body key holding the query object for body-borne requests.
    pub body_key: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 100_000,
            cache_ttl_ms: 2_000,
            body_key: "query".to_string(),
        }
    }
}

impl QueryConfig {
    /// Create a configuration with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default page size.
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the limit ceiling.
    pub fn with_max_limit(mut self, limit: u64) -> Self {
        self.max_limit = limit;
        self
    }

    /// Set the result-cache TTL in milliseconds.
    pub fn with_cache_ttl_ms(mut self, ttl: u64) -> Self {
        self.cache_ttl_ms = ttl;
        self
    }

    /// Set the request-body key holding the query object.
    pub fn with_body_key(mut self, key: impl Into<String>) -> Self {
        self.body_key = key.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.default_limit, 100);
        assert_eq!(config.max_limit, 100_000);
        assert_eq!(config.cache_ttl_ms, 2_000);
        assert_eq!(config.body_key, "query");
    }

    #[test]
    fn test_builder() {
        let config = QueryConfig::new()
            .with_default_limit(25)
            .with_body_key("q");
        assert_eq!(config.default_limit, 25);
        assert_eq!(config.body_key, "q");
    }
}
