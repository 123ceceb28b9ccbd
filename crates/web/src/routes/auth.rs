//! Farmer sign-in, sign-up and sign-out.
//!
//! Forms are validated locally first; a form with field errors re-renders
//! with status 422 and never reaches the session provider.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::MessageQuery;
use crate::routes::nav::NavContext;
use crate::services::auth::{self, AuthError, Registration};
use crate::services::validation::{FieldErrors, validate_credentials, validate_registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: NavContext,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
    pub email: String,
    pub errors: FieldErrors,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: NavContext,
    pub error: Option<&'static str>,
    pub full_name: String,
    pub email: String,
    pub errors: FieldErrors,
}

// =============================================================================
// Sign-in Routes
// =============================================================================

/// Display the sign-in page. Signed-in users go straight to the dashboard.
///
/// GET /auth
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    LoginTemplate {
        nav: NavContext::guest(),
        error: query.error_message(),
        success: query.success_message(),
        email: String::new(),
        errors: FieldErrors::default(),
    }
    .into_response()
}

/// Handle the sign-in form.
///
/// POST /auth/login
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = match validate_credentials(&form.email, &form.password) {
        Ok(credentials) => credentials,
        Err(errors) => {
            let page = LoginTemplate {
                nav: NavContext::guest(),
                error: None,
                success: None,
                email: form.email,
                errors,
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let user = match auth::authenticate(state.supabase(), &credentials.email, &credentials.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Sign-in rejected: invalid credentials");
            return Redirect::to("/auth?error=credentials").into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            return Redirect::to("/auth?error=service").into_response();
        }
    };

    if let Err(e) = auth::establish(&session, &user).await {
        tracing::error!(error = %e, "Failed to store session");
        auth::revoke(state.supabase(), &user).await;
        return Redirect::to("/auth?error=session").into_response();
    }

    add_breadcrumb("auth", "User signed in", None);
    Redirect::to("/dashboard").into_response()
}

// =============================================================================
// Sign-up Routes
// =============================================================================

/// Display the sign-up page.
///
/// GET /auth/register
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    RegisterTemplate {
        nav: NavContext::guest(),
        error: query.error_message(),
        full_name: String::new(),
        email: String::new(),
        errors: FieldErrors::default(),
    }
    .into_response()
}

/// Handle the sign-up form.
///
/// POST /auth/register
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let (credentials, full_name) =
        match validate_registration(&form.email, &form.password, &form.full_name) {
            Ok(valid) => valid,
            Err(errors) => {
                let page = RegisterTemplate {
                    nav: NavContext::guest(),
                    error: None,
                    full_name: form.full_name,
                    email: form.email,
                    errors,
                };
                return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
            }
        };

    let outcome = auth::register(
        state.supabase(),
        &credentials.email,
        &credentials.password,
        &full_name,
    )
    .await;

    match outcome {
        Ok(Registration::SignedIn(user)) => {
            if let Err(e) = auth::establish(&session, &user).await {
                tracing::error!(error = %e, "Failed to store session after sign-up");
                return Redirect::to("/auth?error=session").into_response();
            }
            add_breadcrumb("auth", "User signed up", None);
            Redirect::to("/dashboard").into_response()
        }
        Ok(Registration::ConfirmationRequired) => {
            tracing::info!("Sign-up pending email confirmation");
            Redirect::to("/auth?success=check_email").into_response()
        }
        Err(AuthError::AlreadyRegistered) => {
            Redirect::to("/auth/register?error=registered").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-up failed");
            Redirect::to("/auth/register?error=service").into_response()
        }
    }
}

// =============================================================================
// Sign-out
// =============================================================================

/// Sign out: revoke the provider session and flush the local one.
///
/// POST /auth/logout
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Err(e) = auth::sign_out(state.supabase(), &session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }

    Redirect::to("/auth?success=signed_out")
}
