//! Integration tests for Rain Advisory.
//!
//! # Running Tests
//!
//! ```bash
//! # Library-level tests (no services needed)
//! cargo test -p rain-advisory-integration-tests
//!
//! # Live tests against a running server
//! cargo run -p rain-advisory-web &
//! cargo test -p rain-advisory-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `guard` - Access Guard and Role Resolver through the public API
//! - `reports` - Rainfall and crop aggregations
//! - `live_server` - HTTP checks against a running server (ignored by default)

use std::time::Duration;

/// Base URL of the server under test (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("RAIN_ADVISORY_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// HTTP client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location` headers.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}
