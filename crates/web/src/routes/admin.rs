//! Admin login and admin panel.
//!
//! The panel is behind [`RequireAdmin`], so its handler only runs once the
//! Access Guard has granted the request. The login flow signs in, verifies
//! the identity and then requires an admin role assignment; any account
//! that fails the role check is signed out again before the page responds.

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

use rain_advisory_core::Profile;

use crate::error::{add_breadcrumb, clear_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAdmin};
use crate::models::CurrentUser;
use crate::routes::MessageQuery;
use crate::routes::nav::NavContext;
use crate::services::auth::{self, AuthError};
use crate::services::roles::is_admin;
use crate::services::validation::{FieldErrors, validate_credentials};
use crate::state::AppState;
use crate::supabase::{SupabaseError, Table};

// =============================================================================
// Form Types
// =============================================================================

/// Admin sign-in form data.
#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Admin panel query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    /// Profile name search.
    pub q: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// View Models
// =============================================================================

/// One headline count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

impl StatCard {
    fn new(label: &'static str, count: Option<u64>) -> Self {
        Self {
            label,
            value: count.map_or_else(|| "n/a".to_string(), |c| c.to_string()),
        }
    }
}

/// One row of the recent-profiles table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub farm_size: String,
    pub joined: String,
}

impl From<&Profile> for ProfileRow {
    fn from(profile: &Profile) -> Self {
        let or_dash = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or("-")
                .to_string()
        };

        Self {
            full_name: or_dash(Some(&profile.full_name)),
            email: profile.email.clone(),
            phone: or_dash(profile.phone_number.as_deref()),
            location: or_dash(profile.farm_location.as_deref()),
            farm_size: profile
                .farm_size_acres
                .map_or_else(|| "-".to_string(), |a| format!("{a:.1} acres")),
            joined: profile.created_at.format("%-d %b %Y").to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Admin sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub nav: NavContext,
    pub error: Option<&'static str>,
    pub email: String,
    pub errors: FieldErrors,
}

/// Admin panel template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
    pub nav: NavContext,
    pub success: Option<&'static str>,
    pub notices: Vec<&'static str>,
    pub stats: Vec<StatCard>,
    pub profiles: Vec<ProfileRow>,
    pub search: String,
}

/// Access Denied page, rendered when the Access Guard denies a request.
#[derive(Template, WebTemplate)]
#[template(path = "admin/access_denied.html")]
pub struct AccessDeniedTemplate {
    pub nav: NavContext,
    pub message: &'static str,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the admin sign-in page. A signed-in admin goes to the panel.
///
/// GET /admin/login
#[instrument(skip(state, user, query))]
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    let nav = NavContext::resolve(&state, user.as_ref()).await;
    if nav.is_admin {
        return Redirect::to("/admin").into_response();
    }

    AdminLoginTemplate {
        nav,
        error: query.error_message(),
        email: String::new(),
        errors: FieldErrors::default(),
    }
    .into_response()
}

/// Handle the admin sign-in form.
///
/// 1. Validate locally; field errors re-render the form (422).
/// 2. Sign in with the session provider.
/// 3. Verify the identity behind the new token.
/// 4. Require an admin role assignment.
///
/// Failing step 3 or 4 revokes the provider session and flushes the local
/// one, so a non-admin never leaves this handler signed in.
///
/// POST /admin/login
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Response {
    let credentials = match validate_credentials(&form.email, &form.password) {
        Ok(credentials) => credentials,
        Err(errors) => {
            let page = AdminLoginTemplate {
                nav: NavContext::guest(),
                error: None,
                email: form.email,
                errors,
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let client = state.supabase();

    let user = match auth::authenticate(client, &credentials.email, &credentials.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Admin sign-in rejected: invalid credentials");
            return Redirect::to("/admin/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Admin sign-in failed");
            return Redirect::to("/admin/login?error=service").into_response();
        }
    };

    if auth::verify(client, &user).await.is_err() {
        return reject(&state, &session, &user, "unverified").await;
    }

    match is_admin(client, Some(&user)).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(user_id = %user.id, "Admin sign-in by non-admin");
            return reject(&state, &session, &user, "access_denied").await;
        }
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Admin role lookup failed");
            return reject(&state, &session, &user, "role_lookup").await;
        }
    }

    if let Err(e) = auth::establish(&session, &user).await {
        tracing::error!(error = %e, "Failed to store admin session");
        auth::revoke(client, &user).await;
        return Redirect::to("/admin/login?error=session").into_response();
    }

    add_breadcrumb("auth", "Admin signed in", None);
    Redirect::to("/admin?success=welcome_admin").into_response()
}

/// Sign a rejected admin login out everywhere and show why.
async fn reject(state: &AppState, session: &Session, user: &CurrentUser, code: &str) -> Response {
    auth::revoke(state.supabase(), user).await;
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session");
    }
    clear_sentry_user();
    add_breadcrumb("auth", "Admin sign-in rejected", Some(&[("reason", code)]));

    Redirect::to(&format!("/admin/login?error={}", urlencoding::encode(code))).into_response()
}

// =============================================================================
// Panel Routes
// =============================================================================

/// Display the admin panel.
///
/// GET /admin
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<AdminQuery>,
) -> impl IntoResponse {
    let client = state.supabase();
    let search = query.q.as_deref().map(str::trim).unwrap_or_default();

    let (profiles_count, crops_count, weather_count, advisory_count, profiles) = tokio::join!(
        client.table_count(&admin, Table::Profiles),
        client.table_count(&admin, Table::Crops),
        client.table_count(&admin, Table::WeatherData),
        client.table_count(&admin, Table::CropAdvisory),
        client.recent_profiles(&admin, Some(search)),
    );

    let mut notices = Vec::new();
    let stats = vec![
        StatCard::new("Farmers", count_or_notice(profiles_count, &mut notices)),
        StatCard::new("Crop fields", count_or_notice(crops_count, &mut notices)),
        StatCard::new("Weather records", count_or_notice(weather_count, &mut notices)),
        StatCard::new("Advisories", count_or_notice(advisory_count, &mut notices)),
    ];

    let profiles = profiles.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch recent profiles");
        notices.push("Recent profiles could not be loaded.");
        Vec::new()
    });

    AdminTemplate {
        nav: NavContext::for_user(&admin, true),
        success: query.success.as_deref().and_then(crate::routes::success_notice),
        notices,
        stats,
        profiles: profiles.iter().map(ProfileRow::from).collect(),
        search: search.to_string(),
    }
}

/// Keep a count, or log the failure and add one shared notice.
fn count_or_notice(
    result: Result<u64, SupabaseError>,
    notices: &mut Vec<&'static str>,
) -> Option<u64> {
    const NOTICE: &str = "Some counts could not be loaded.";

    result
        .inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to count rows");
            if !notices.contains(&NOTICE) {
                notices.push(NOTICE);
            }
        })
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(phone: Option<&str>, size: Option<f64>) -> Profile {
        serde_json::from_value(serde_json::json!({
            "id": "0b7a3d52-8f0e-4c9d-9d64-2f6c2b8e5a10",
            "user_id": "6f1c1f0e-2d7a-4c1b-9a57-3c0c5e0f9b11",
            "full_name": "Otieno Ochieng",
            "email": "otieno@example.com",
            "phone_number": phone,
            "farm_location": "Kisumu",
            "farm_size_acres": size,
            "created_at": "2025-02-03T12:00:00Z",
            "updated_at": "2025-02-03T12:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_profile_row_formats_optional_fields() {
        let row = ProfileRow::from(&profile(None, Some(2.5)));
        assert_eq!(row.full_name, "Otieno Ochieng");
        assert_eq!(row.phone, "-");
        assert_eq!(row.location, "Kisumu");
        assert_eq!(row.farm_size, "2.5 acres");
        assert_eq!(row.joined, "3 Feb 2025");
    }

    #[test]
    fn test_stat_card_shows_missing_count() {
        assert_eq!(StatCard::new("Farmers", Some(310)).value, "310");
        assert_eq!(StatCard::new("Farmers", None).value, "n/a");
    }

    #[test]
    fn test_count_failures_share_one_notice() {
        let mut notices = Vec::new();
        let err = || Err(SupabaseError::InvalidContentRange("*/x".to_string()));

        assert_eq!(count_or_notice(Ok(4), &mut notices), Some(4));
        assert_eq!(count_or_notice(err(), &mut notices), None);
        assert_eq!(count_or_notice(err(), &mut notices), None);
        assert_eq!(notices.len(), 1);
    }
}
