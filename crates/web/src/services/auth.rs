//! Session Provider: sign-in, sign-up, sign-out and the current identity.
//!
//! Identity and tokens come from the hosted session provider; the
//! application keeps them in the server-side session so they survive page
//! loads. Sessions are created at sign-in and flushed at sign-out.

use chrono::Utc;
use thiserror::Error;
use tower_sessions::Session;

use rain_advisory_core::Email;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, keys};
use crate::supabase::{SignUpOutcome, SupabaseClient, SupabaseError};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The provider did not confirm the identity behind a fresh token.
    #[error("unable to verify user")]
    UnverifiedUser,

    /// Sign-up with an email that already has an account.
    #[error("email already registered")]
    AlreadyRegistered,

    /// The session provider failed or rejected the request.
    #[error("session provider error: {0}")]
    Provider(#[from] SupabaseError),

    /// The server-side session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Outcome of a successful sign-up.
#[derive(Debug)]
pub enum Registration {
    /// The account is active and signed in.
    SignedIn(CurrentUser),
    /// The provider sent a confirmation email; the user signs in afterwards.
    ConfirmationRequired,
}

/// Check credentials with the session provider.
///
/// Does not touch the local session; call [`establish`] once the caller has
/// decided the identity may be kept.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` for a wrong email/password and
/// `AuthError::Provider` for anything else.
pub async fn authenticate(
    client: &SupabaseClient,
    email: &Email,
    password: &str,
) -> Result<CurrentUser, AuthError> {
    let session = client
        .sign_in_with_password(email.as_str(), password)
        .await
        .map_err(|e| match e.status() {
            Some(400 | 401) => AuthError::InvalidCredentials,
            _ => AuthError::Provider(e),
        })?;

    Ok(CurrentUser::from_auth_session(session, email.as_str(), Utc::now()))
}

/// Confirm with the provider that the token belongs to the expected user.
///
/// # Errors
///
/// Returns `AuthError::UnverifiedUser` if the provider rejects the token or
/// reports a different identity.
pub async fn verify(client: &SupabaseClient, user: &CurrentUser) -> Result<(), AuthError> {
    match client.get_user(&user.access_token).await {
        Ok(verified) if verified.id == user.id => Ok(()),
        Ok(verified) => {
            tracing::warn!(
                expected = %user.id,
                actual = %verified.id,
                "Token belongs to a different user"
            );
            Err(AuthError::UnverifiedUser)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to verify user");
            Err(AuthError::UnverifiedUser)
        }
    }
}

/// Create an account.
///
/// # Errors
///
/// Returns `AuthError::AlreadyRegistered` if the email is taken and
/// `AuthError::Provider` for other failures.
pub async fn register(
    client: &SupabaseClient,
    email: &Email,
    password: &str,
    full_name: &str,
) -> Result<Registration, AuthError> {
    let outcome = client
        .sign_up(email.as_str(), password, full_name)
        .await
        .map_err(|e| match &e {
            SupabaseError::Api { status, message }
                if *status == 422 || message.to_lowercase().contains("already registered") =>
            {
                AuthError::AlreadyRegistered
            }
            _ => AuthError::Provider(e),
        })?;

    Ok(match outcome {
        SignUpOutcome::SignedIn(session) => Registration::SignedIn(
            CurrentUser::from_auth_session(session, email.as_str(), Utc::now()),
        ),
        SignUpOutcome::ConfirmationRequired(_) => Registration::ConfirmationRequired,
    })
}

/// Store the identity in the session.
///
/// The session ID is cycled first so a pre-login session ID cannot be reused.
///
/// # Errors
///
/// Returns `AuthError::Session` if the session cannot be modified.
pub async fn establish(session: &Session, user: &CurrentUser) -> Result<(), AuthError> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await?;
    set_sentry_user(&user.id, Some(&user.email));
    tracing::info!(user_id = %user.id, "User signed in");
    Ok(())
}

/// The signed-in identity, refreshing an expired access token if needed.
///
/// A failed refresh signs the user out locally and returns `None`.
pub async fn current_user(client: &SupabaseClient, session: &Session) -> Option<CurrentUser> {
    let user: CurrentUser = match session.get(keys::CURRENT_USER).await {
        Ok(user) => user?,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            return None;
        }
    };

    let now = Utc::now();
    if !user.needs_refresh(now) {
        return Some(user);
    }

    match client.refresh_session(&user.refresh_token).await {
        Ok(refreshed) => {
            let refreshed = CurrentUser::from_auth_session(refreshed, &user.email, now);
            if let Err(e) = session.insert(keys::CURRENT_USER, &refreshed).await {
                tracing::warn!(error = %e, "Failed to store refreshed session");
            }
            tracing::debug!(user_id = %refreshed.id, "Access token refreshed");
            Some(refreshed)
        }
        Err(e) => {
            tracing::info!(user_id = %user.id, error = %e, "Token refresh failed, signing out");
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "Failed to flush session");
            }
            clear_sentry_user();
            None
        }
    }
}

/// Revoke the provider session (best effort) and flush the local session.
///
/// # Errors
///
/// Returns `AuthError::Session` if the local session cannot be flushed.
pub async fn sign_out(client: &SupabaseClient, session: &Session) -> Result<(), AuthError> {
    let user: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.ok().flatten();

    if let Some(user) = &user {
        revoke(client, user).await;
    }

    session.flush().await?;
    clear_sentry_user();
    Ok(())
}

/// Revoke a provider session that was never stored locally.
pub async fn revoke(client: &SupabaseClient, user: &CurrentUser) {
    if let Err(e) = client.sign_out(&user.access_token).await {
        tracing::warn!(user_id = %user.id, error = %e, "Provider sign-out failed");
    }
}
