//! Client for the hosted data service.
//!
//! # Architecture
//!
//! - PostgREST (`/rest/v1`) for read-only table access, built with [`Select`]
//! - GoTrue (`/auth/v1`) for password sign-in, sign-up, token refresh and logout
//! - Every request carries the project's publishable key in the `apikey`
//!   header; user-scoped reads add the caller's access token as a bearer
//!   token so row-level security applies
//! - The global crop advisory catalogue is cached in-process via `moka`
//!   (5 minute TTL). Nothing user-scoped is cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use rain_advisory_web::supabase::{Select, SupabaseClient, Table};
//!
//! let client = SupabaseClient::new(&config.supabase);
//! let session = client.sign_in_with_password("farmer@example.com", "hunter22").await?;
//! let crops: Vec<Crop> = client
//!     .select(&Select::from(Table::Crops).eq("user_id", session.user.id), Some(&token))
//!     .await?;
//! ```

pub mod auth;
mod client;
pub mod query;
pub mod tables;

pub use auth::{AuthSession, AuthUser, SignUpOutcome};
pub use client::SupabaseClient;
pub use query::{Direction, Filter, Select, Table};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the hosted data service.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Transport failure (DNS, connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A count request returned no usable `Content-Range` header.
    #[error("Invalid content range: {0}")]
    InvalidContentRange(String),
}

impl SupabaseError {
    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body returned by either PostgREST or GoTrue.
///
/// PostgREST sends `{code, message, details, hint}`; GoTrue sends
/// `{error, error_description}` or `{code, error_code, msg}` depending on version.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
}

impl ApiErrorBody {
    /// Best human-readable description available in the body.
    fn describe(&self) -> Option<String> {
        let primary = self
            .message
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .or(self.error_code.as_deref())?;

        let mut out = primary.to_string();
        if let Some(details) = self.details.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(" (");
            out.push_str(details);
            out.push(')');
        }
        if let Some(hint) = self.hint.as_deref().filter(|h| !h.is_empty()) {
            out.push_str(" hint: ");
            out.push_str(hint);
        }
        Some(out)
    }
}

/// Build an [`SupabaseError::Api`] from a failed response body.
fn api_error(status: u16, body: &str) -> SupabaseError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.describe())
        .unwrap_or_else(|| body.chars().take(200).collect());

    SupabaseError::Api { status, message }
}
