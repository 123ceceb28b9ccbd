//! GoTrue endpoints: password sign-in, sign-up, refresh, get-user, logout.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rain_advisory_core::UserId;

use super::{SupabaseClient, SupabaseError, api_error};
use crate::models::{AccessToken, RefreshToken};

// =============================================================================
// Wire Types
// =============================================================================

/// A signed-in session as returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Absolute expiry as a Unix timestamp, when the server sends one.
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// The identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Result of a sign-up call.
///
/// With email confirmation disabled the provider returns a full session;
/// otherwise it returns only the pending user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired(AuthUser),
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Serialize)]
struct SignUpMetadata<'a> {
    full_name: &'a str,
}

// =============================================================================
// Endpoints
// =============================================================================

impl SupabaseClient {
    /// Exchange an email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` with status 400 for wrong credentials,
    /// or a transport/parse error.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let response = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        read_json(response).await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the refresh token was revoked or expired,
    /// or on transport failure.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AuthSession, SupabaseError> {
        let response = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant {
                refresh_token: refresh_token.expose(),
            })
            .send()
            .await?;

        read_json(response).await
    }

    /// Create an account. `full_name` is stored in the user metadata, from
    /// which the `profiles` row is created.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` if the provider rejects the sign-up
    /// (e.g. the email is already registered), or a transport/parse error.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let response = self
            .auth_request(Method::POST, "signup")
            .json(&SignUpRequest {
                email,
                password,
                data: SignUpMetadata { full_name },
            })
            .send()
            .await?;

        read_json(response).await
    }

    /// Fetch the user the access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` with status 401/403 if the token is
    /// invalid, or a transport/parse error.
    #[instrument(skip_all)]
    pub async fn get_user(&self, token: &AccessToken) -> Result<AuthUser, SupabaseError> {
        let response = self
            .auth_request(Method::GET, "user")
            .bearer_auth(token.expose())
            .send()
            .await?;

        read_json(response).await
    }

    /// Revoke the session the access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, token: &AccessToken) -> Result<(), SupabaseError> {
        let response = self
            .auth_request(Method::POST, "logout")
            .bearer_auth(token.expose())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        Err(api_error(status.as_u16(), &body))
    }
}

/// Read a JSON body, mapping non-success statuses to `SupabaseError::Api`.
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SupabaseError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::debug!(status = %status, "Session provider returned non-success status");
        return Err(api_error(status.as_u16(), &body));
    }

    Ok(serde_json::from_str(&body)?)
}
