//! Authentication and authorization extractors.
//!
//! - [`OptionalAuth`]: the signed-in user, if any
//! - [`RequireAuth`]: the signed-in user, or a redirect to the sign-in page
//! - [`RequireAdmin`]: the signed-in admin, or the Access Denied page
//!
//! Each extractor reads the session placed in the request extensions by the
//! session layer and refreshes an expired access token on the way.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::CurrentUser;
use crate::routes::admin::AccessDeniedTemplate;
use crate::routes::nav::NavContext;
use crate::services::access::{AccessGuard, DenialReason, GuardState};
use crate::services::auth::current_user;
use crate::state::AppState;

/// Sign-in page that [`RequireAuth`] redirects to.
pub const LOGIN_PATH: &str = "/auth";

async fn session_user(parts: &Parts, state: &AppState) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    current_user(state.supabase(), session).await
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Returned when a page requires a signed-in user and there is none.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_user(parts, state).await.map(Self).ok_or(AuthRejection)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts, state).await))
    }
}

/// Extractor that requires a signed-in admin.
///
/// Runs a fresh [`AccessGuard`] for every request. The handler body only
/// runs once the guard has settled on `Granted`.
pub struct RequireAdmin(pub CurrentUser);

/// Rendered Access Denied page.
pub struct AdminRejection {
    pub reason: DenialReason,
    pub user: Option<CurrentUser>,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        let status = match self.reason {
            DenialReason::LookupFailed => StatusCode::SERVICE_UNAVAILABLE,
            DenialReason::NotSignedIn | DenialReason::NotAdmin => StatusCode::FORBIDDEN,
        };

        let nav = self
            .user
            .as_ref()
            .map_or_else(NavContext::guest, |user| NavContext::for_user(user, false));

        let page = AccessDeniedTemplate {
            nav,
            message: self.reason.message(),
        };

        (status, page).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state).await;

        let mut guard = AccessGuard::new();
        let reason = match guard.check(state.supabase(), user.as_ref()).await {
            GuardState::Granted => match user {
                Some(user) => return Ok(Self(user)),
                None => DenialReason::NotSignedIn,
            },
            GuardState::Denied(reason) => reason,
            GuardState::Unresolved => DenialReason::LookupFailed,
        };

        tracing::info!(
            path = %parts.uri.path(),
            reason = ?reason,
            "Admin access denied"
        );
        Err(AdminRejection { reason, user })
    }
}
