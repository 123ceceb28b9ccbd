//! Navigation bar state.
//!
//! Resolved once per page render from the session identity and a fresh role
//! lookup. Never cached across requests.

use crate::models::CurrentUser;
use crate::services::roles::is_admin;
use crate::state::AppState;

/// What the navigation bar shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavContext {
    /// Email of the signed-in user; `None` for guests.
    pub email: Option<String>,
    /// Whether to show the Admin link.
    pub is_admin: bool,
}

impl NavContext {
    /// Navigation for a visitor who is not signed in.
    #[must_use]
    pub const fn guest() -> Self {
        Self {
            email: None,
            is_admin: false,
        }
    }

    /// Navigation for a signed-in user with a known admin flag.
    #[must_use]
    pub fn for_user(user: &CurrentUser, is_admin: bool) -> Self {
        Self {
            email: Some(user.email.clone()),
            is_admin,
        }
    }

    /// Resolve the admin flag for this render.
    ///
    /// A failed lookup hides the Admin link; it never shows it.
    pub async fn resolve(state: &AppState, user: Option<&CurrentUser>) -> Self {
        let Some(user) = user else {
            return Self::guest();
        };

        let admin = is_admin(state.supabase(), Some(user))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %user.id, error = %e, "Admin flag lookup failed");
                false
            });

        Self::for_user(user, admin)
    }

    /// Whether someone is signed in.
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.email.is_some()
    }
}
