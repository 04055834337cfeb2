//! Opt-in structured logging.
//!
//! The adapter and compiler emit `tracing` events as they work (request
//! normalization, limit clamping, rendered predicates). Those events go
//! nowhere until a subscriber is installed; hosts that already run their
//! own `tracing` setup need nothing from this module. For everything
//! else, [`init`] wires up a `tracing-subscriber` registry (behind the
//! `tracing-subscriber` cargo feature) driven by environment variables:
//!
//! - `CRUDQL_DEBUG=true|1|yes` enables debug-level output
//! - `CRUDQL_LOG_LEVEL=trace|debug|info|warn|error` picks an exact level
//! - `CRUDQL_LOG_FORMAT=json|pretty|compact` picks the output shape
//!   (default: `json`)
//!
//! When neither `CRUDQL_DEBUG` nor `CRUDQL_LOG_LEVEL` is set, [`init`]
//! installs nothing, so embedding the crate never hijacks the host's
//! logging.
//!
//! ```rust,no_run
//! crudql::logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check whether `CRUDQL_DEBUG` requests debug output.
///
/// Accepts "true", "1" or "yes", case-insensitive.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("CRUDQL_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn requested_level() -> Option<&'static str> {
    let level = env::var("CRUDQL_LOG_LEVEL").ok()?;
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// The effective log level.
///
/// `CRUDQL_LOG_LEVEL` wins when it names a valid level; otherwise
/// "debug" when `CRUDQL_DEBUG` is on, "warn" when it is not.
pub fn log_level() -> &'static str {
    requested_level().unwrap_or(if is_debug_enabled() { "debug" } else { "warn" })
}

/// The effective output format from `CRUDQL_LOG_FORMAT`.
pub fn log_format() -> &'static str {
    match env::var("CRUDQL_LOG_FORMAT")
        .map(|f| f.to_lowercase())
        .as_deref()
    {
        Ok("pretty") => "pretty",
        Ok("compact") => "compact",
        _ => "json",
    }
}

/// Install an environment-driven subscriber, once.
///
/// A no-op unless `CRUDQL_DEBUG` or `CRUDQL_LOG_LEVEL` is set, and on
/// every call after the first. Requires the `tracing-subscriber`
/// feature; without it the crate's events stay silent until the host
/// installs its own subscriber.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && requested_level().is_none() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(format!("crudql={}", level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            match log_format() {
                "pretty" => registry.with(fmt::layer().pretty()).init(),
                "compact" => registry.with(fmt::layer().compact()).init(),
                _ => registry.with(fmt::layer().json()).init(),
            }

            tracing::info!(level, format = log_format(), "logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_by_default() {
        // SAFETY: Test runs in isolation
        unsafe {
            env::remove_var("CRUDQL_DEBUG");
            env::remove_var("CRUDQL_LOG_LEVEL");
        }
        assert!(!is_debug_enabled());
        assert_eq!(log_level(), "warn");
    }

    #[test]
    fn test_format_defaults_to_json() {
        // SAFETY: Test runs in isolation
        unsafe {
            env::remove_var("CRUDQL_LOG_FORMAT");
        }
        assert_eq!(log_format(), "json");
    }
}
