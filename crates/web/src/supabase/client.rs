//! HTTP client for PostgREST and GoTrue.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{CONTENT_RANGE, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use rain_advisory_core::CropAdvisory;

use super::query::Select;
use super::{SupabaseError, api_error};
use crate::config::SupabaseConfig;
use crate::models::AccessToken;

/// Request timeout for every call to the data service.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the advisory catalogue stays cached.
const ADVISORY_CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for the hosted data service.
///
/// Cheap to clone; all clones share one connection pool and one advisory cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    rest_url: String,
    auth_url: String,
    anon_key: SecretString,
    advisories: Cache<usize, Arc<Vec<CropAdvisory>>>,
}

impl SupabaseClient {
    /// Create a new client for the configured project.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        let base = config.url.as_str().trim_end_matches('/');

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        let advisories = Cache::builder()
            .max_capacity(16)
            .time_to_live(ADVISORY_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(SupabaseClientInner {
                http,
                rest_url: format!("{base}/rest/v1"),
                auth_url: format!("{base}/auth/v1"),
                anon_key: config.anon_key.clone(),
                advisories,
            }),
        }
    }

    /// Run a select and deserialize every returned row.
    ///
    /// With a token the request runs as that user; without one it runs as the
    /// anonymous role.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport failure, a non-success status,
    /// or rows that do not match `T`.
    #[instrument(skip(self, token), fields(table = %query.table()))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        query: &Select,
        token: Option<&AccessToken>,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = format!("{}/{}", self.inner.rest_url, query.table());

        let response = self
            .rest_request(self.inner.http.get(&url), token)
            .query(&query.to_query())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Data service returned non-success status"
            );
            return Err(api_error(status.as_u16(), &body));
        }

        let rows: Vec<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse data service rows"
            );
            SupabaseError::Parse(e)
        })?;

        debug!(rows = rows.len(), "Select complete");
        Ok(rows)
    }

    /// Exact number of rows matching the query's filters.
    ///
    /// Issues a `HEAD` request with `Prefer: count=exact` and reads the total
    /// from the `Content-Range` header, so no rows are transferred.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport failure, a non-success status, or a
    /// missing or malformed `Content-Range` header.
    #[instrument(skip(self, token), fields(table = %query.table()))]
    pub async fn count(
        &self,
        query: &Select,
        token: Option<&AccessToken>,
    ) -> Result<u64, SupabaseError> {
        let url = format!("{}/{}", self.inner.rest_url, query.table());

        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.filter_pairs());

        let response = self
            .rest_request(self.inner.http.head(&url), token)
            .header("Prefer", "count=exact")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // HEAD responses carry no body
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("count request failed")
                    .to_string(),
            });
        }

        total_from_headers(response.headers())
    }

    /// Attach the key and authorization headers for a PostgREST call.
    fn rest_request(
        &self,
        builder: reqwest::RequestBuilder,
        token: Option<&AccessToken>,
    ) -> reqwest::RequestBuilder {
        let anon_key = self.inner.anon_key.expose_secret();
        let bearer = token.map_or(anon_key, AccessToken::expose);

        builder
            .header("apikey", anon_key)
            .header("Accept", "application/json")
            .bearer_auth(bearer)
    }

    /// Request builder for a GoTrue endpoint.
    pub(super) fn auth_request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.inner.auth_url, path.trim_start_matches('/'));
        self.inner
            .http
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
    }

    /// Shared advisory catalogue cache.
    pub(super) fn advisory_cache(&self) -> &Cache<usize, Arc<Vec<CropAdvisory>>> {
        &self.inner.advisories
    }
}

/// Read the total from a `Content-Range` header.
fn total_from_headers(headers: &HeaderMap) -> Result<u64, SupabaseError> {
    let raw = headers
        .get(CONTENT_RANGE)
        .ok_or_else(|| SupabaseError::InvalidContentRange("missing header".to_string()))?
        .to_str()
        .map_err(|e| SupabaseError::InvalidContentRange(e.to_string()))?;

    parse_content_range(raw)
}

/// Parse the total out of `0-24/310`, `*/0` or `*/310`.
pub(crate) fn parse_content_range(raw: &str) -> Result<u64, SupabaseError> {
    let (_, total) = raw
        .trim()
        .rsplit_once('/')
        .ok_or_else(|| SupabaseError::InvalidContentRange(raw.to_string()))?;

    total
        .parse::<u64>()
        .map_err(|_| SupabaseError::InvalidContentRange(raw.to_string()))
}
