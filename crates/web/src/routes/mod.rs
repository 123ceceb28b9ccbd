//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Home page (nav depends on auth and role)
//! GET  /health            - Liveness
//! GET  /health/ready      - Readiness (session database)
//!
//! # Auth
//! GET  /auth              - Sign-in page
//! POST /auth/login        - Sign-in action (rate limited)
//! GET  /auth/register     - Sign-up page
//! POST /auth/register     - Sign-up action (rate limited)
//! POST /auth/logout       - Sign out
//!
//! # Signed-in pages
//! GET  /dashboard         - Weather, advisories, alerts, crops
//! GET  /reports           - Rainfall and crop reports (?from=&to=)
//!
//! # Admin
//! GET  /admin/login       - Admin sign-in page
//! POST /admin/login       - Admin sign-in action (rate limited)
//! GET  /admin             - Admin panel (?q= profile search)
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod home;
pub mod nav;
pub mod reports;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{
    create_session_layer, login_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/web/static";

// =============================================================================
// Notices
// =============================================================================

/// Query parameters for error/success display after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl MessageQuery {
    /// Human-readable error banner for a known code.
    #[must_use]
    pub fn error_message(&self) -> Option<&'static str> {
        self.error.as_deref().and_then(error_notice)
    }

    /// Human-readable success banner for a known code.
    #[must_use]
    pub fn success_message(&self) -> Option<&'static str> {
        self.success.as_deref().and_then(success_notice)
    }
}

/// Map an error code to its banner. Unknown codes show nothing.
#[must_use]
pub fn error_notice(code: &str) -> Option<&'static str> {
    Some(match code {
        "credentials" => "Invalid email or password.",
        "unverified" => "Unable to verify user.",
        "access_denied" => "Access Denied: you do not have administrator privileges.",
        "role_lookup" => "We could not verify administrator privileges. Please try again.",
        "registered" => "An account with this email already exists.",
        "service" => "The sign-in service is unavailable. Please try again shortly.",
        "session" => "Your session could not be saved. Please try again.",
        _ => return None,
    })
}

/// Map a success code to its banner. Unknown codes show nothing.
#[must_use]
pub fn success_notice(code: &str) -> Option<&'static str> {
    Some(match code {
        "welcome_admin" => "Welcome Admin",
        "signed_out" => "You have been signed out.",
        "check_email" => "Check your email to confirm your account, then sign in.",
        _ => return None,
    })
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::login_page))
        .route("/login", post(auth::login).layer(login_rate_limiter()))
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(login_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route(
            "/login",
            get(admin::login_page).merge(post(admin::login).layer(login_rate_limiter())),
        )
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/reports", get(reports::reports))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}

/// Assemble the full application: routes, static files, sessions and the
/// middleware stack.
///
/// Production passes a `PostgresStore`; router tests pass a `MemoryStore`.
pub fn build_app<S: SessionStore + Clone>(state: AppState, store: S) -> Router {
    let session_layer = create_session_layer(store, state.config());

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::test_support::{FakeProvider, TABLE_COUNTS};
    use super::*;

    fn app() -> Router {
        build_app(test_support::state(), MemoryStore::default())
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_unknown_notice_codes_show_nothing() {
        assert_eq!(error_notice("<script>"), None);
        assert_eq!(success_notice("anything"), None);
        assert_eq!(success_notice("welcome_admin"), Some("Welcome Admin"));
    }

    #[tokio::test]
    async fn test_health_is_ok_with_security_headers() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_inbound_request_id_is_echoed() {
        let response = app()
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "edge-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "edge-123");
    }

    #[tokio::test]
    async fn test_free_text_request_id_is_replaced() {
        let response = app()
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "forged entry <b>")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_dashboard_redirects_guests_to_sign_in() {
        let response = app()
            .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth");
    }

    #[tokio::test]
    async fn test_admin_without_session_renders_access_denied() {
        let response = app()
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_text(response).await;
        assert!(body.contains("Access Denied"));
        assert!(body.contains("href=\"/admin/login\""));
    }

    #[tokio::test]
    async fn test_home_for_guest_shows_only_home_link() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Rain Advisory"));
        assert!(!body.contains("href=\"/dashboard\""));
        assert!(!body.contains("href=\"/admin\""));
    }

    #[tokio::test]
    async fn test_admin_login_validation_fails_before_any_network_call() {
        // The data service URL points at a closed port; a network call would
        // surface as a redirect with ?error=service instead of a 422.
        let response = app()
            .oneshot(
                Request::post("/admin/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header("x-forwarded-for", "198.51.100.4")
                    .body(Body::from("email=bad-email&password=abc"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("Invalid email address"));
        assert!(body.contains("Password must be at least 6 characters"));
    }

    #[tokio::test]
    async fn test_sign_up_validation_reports_every_field() {
        let response = app()
            .oneshot(
                Request::post("/auth/register")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header("x-forwarded-for", "198.51.100.5")
                    .body(Body::from("full_name=&email=nope&password=1"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("Full name is required"));
        assert!(body.contains("Invalid email address"));
    }

    async fn app_with(provider: &FakeProvider) -> Router {
        let url = provider.spawn().await;
        build_app(test_support::state_with_supabase(url), MemoryStore::default())
    }

    fn sign_in(path: &str, client_ip: &str) -> Request<Body> {
        Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", client_ip)
            .body(Body::from("email=grower%40example.com&password=secret123"))
            .unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_non_admin_at_admin_login_is_signed_out_everywhere() {
        let provider = FakeProvider::new(false);
        let app = app_with(&provider).await;

        // Signed in as a farmer first, so there is a local session to lose.
        let response = app
            .clone()
            .oneshot(sign_in("/auth/login", "198.51.100.6"))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/dashboard");
        let cookie = session_cookie(&response);

        let mut request = sign_in("/admin/login", "198.51.100.6");
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/admin/login?error=access_denied"
        );
        assert_eq!(provider.logouts(), 1);

        let response = app
            .oneshot(
                Request::get("/dashboard")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/auth");
    }

    #[tokio::test]
    async fn test_admin_sign_in_opens_panel_with_exact_counts() {
        let provider = FakeProvider::new(true);
        let app = app_with(&provider).await;

        let response = app
            .clone()
            .oneshot(sign_in("/admin/login", "198.51.100.7"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/admin?success=welcome_admin"
        );
        assert_eq!(provider.logouts(), 0);

        let response = app
            .oneshot(
                Request::get("/admin?success=welcome_admin")
                    .header(header::COOKIE, session_cookie(&response))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Welcome Admin"));
        assert!(!body.contains("Access Denied"));
        for (_, count) in TABLE_COUNTS {
            assert!(body.contains(&format!("<span class=\"stat-value\">{count}</span>")));
        }
    }
}
