//! Role inspection commands.
//!
//! # Usage
//!
//! ```bash
//! rain-cli roles check -e admin@example.com -p 'password'
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - project URL
//! - `SUPABASE_ANON_KEY` - public anon key
//!
//! The check signs in as the account, runs the role lookup with the account's
//! own token (so row-level security applies exactly as in the web app) and
//! then revokes the session it created.

use thiserror::Error;

use rain_advisory_web::config::{ConfigError, SupabaseConfig};
use rain_advisory_web::services::auth::{self, AuthError};
use rain_advisory_web::services::roles::{RoleError, is_admin};
use rain_advisory_web::services::validation::validate_credentials;
use rain_advisory_web::supabase::SupabaseClient;

/// Errors that can occur during a role check.
#[derive(Debug, Error)]
pub enum RoleCheckError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The email or password failed local validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Sign-in failed.
    #[error("Sign-in failed: {0}")]
    Auth(#[from] AuthError),

    /// The role lookup itself failed.
    #[error("{0}")]
    Role(#[from] RoleError),
}

/// Sign in and report whether the account holds the admin role.
///
/// # Errors
///
/// Returns `RoleCheckError` if configuration is missing, the credentials are
/// invalid, or the lookup fails. A lookup failure is never reported as admin.
pub async fn check(email: &str, password: &str) -> Result<bool, RoleCheckError> {
    let config = SupabaseConfig::from_env()?;
    let client = SupabaseClient::new(&config);

    let credentials = validate_credentials(email, password).map_err(|errors| {
        let messages: Vec<&str> = [errors.email, errors.password].into_iter().flatten().collect();
        RoleCheckError::InvalidInput(messages.join(", "))
    })?;

    tracing::info!("Signing in...");
    let user = auth::authenticate(&client, &credentials.email, &credentials.password).await?;

    let result = is_admin(&client, Some(&user)).await;
    auth::revoke(&client, &user).await;

    Ok(result?)
}

/// Print the outcome of a role check.
#[allow(clippy::print_stdout)]
pub fn print_result(email: &str, admin: bool) {
    if admin {
        println!("{email}: admin");
    } else {
        println!("{email}: not an admin");
    }
}
