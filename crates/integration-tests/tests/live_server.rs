//! HTTP checks against a running server.
//!
//! These tests require:
//! - The web server running (cargo run -p rain-advisory-web)
//! - `SUPABASE_URL` / `SUPABASE_ANON_KEY` configured for that server
//!
//! None of them sign in, so no accounts are needed.
//!
//! Run with: cargo test -p rain-advisory-integration-tests -- --ignored

use rain_advisory_integration_tests::{base_url, client};
use reqwest::StatusCode;
use reqwest::header::LOCATION;

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_endpoints() {
    let client = client();

    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");

    let resp = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_signed_in_pages_redirect_guests() {
    let client = client();

    for path in ["/dashboard", "/reports"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to reach server");

        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(resp.headers()[LOCATION], "/auth", "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_panel_denies_guests() {
    let resp = client()
        .get(format!("{}/admin", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = resp.text().await.expect("body");
    assert!(body.contains("Access Denied"));
    assert!(body.contains("/admin/login"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_login_validates_before_signing_in() {
    let resp = client()
        .post(format!("{}/admin/login", base_url()))
        .form(&[("email", "bad-email"), ("password", "abc")])
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("body");
    assert!(body.contains("Invalid email address"));
    assert!(body.contains("Password must be at least 6 characters"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_wrong_password_redirects_with_notice() {
    let resp = client()
        .post(format!("{}/admin/login", base_url()))
        .form(&[
            ("email", "nobody@example.com"),
            ("password", "definitely-wrong"),
        ])
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[LOCATION], "/admin/login?error=credentials");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_pages_carry_security_headers() {
    let resp = client()
        .get(base_url())
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert!(resp.headers().contains_key("content-security-policy"));
    assert!(resp.headers().contains_key("x-request-id"));
}
