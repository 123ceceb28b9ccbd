//! Access Guard for admin-only views.
//!
//! Every request starts a fresh guard in [`GuardState::Unresolved`]; nothing
//! is carried over between requests. The guard only reaches
//! [`GuardState::Granted`] once the role lookup has completed with an
//! explicit "yes". Every other outcome is a denial with a reason.

use crate::models::CurrentUser;
use crate::services::roles::{RoleLookup, is_admin};

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No signed-in identity.
    NotSignedIn,
    /// Signed in, but no admin role assignment.
    NotAdmin,
    /// The role lookup failed, so privileges could not be confirmed.
    LookupFailed,
}

impl DenialReason {
    /// Short explanation for the Access Denied page.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotSignedIn => "Please sign in with an administrator account.",
            Self::NotAdmin => "You do not have administrator privileges.",
            Self::LookupFailed => {
                "We could not verify your administrator privileges. Please try again shortly."
            }
        }
    }
}

/// State of the guard for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unresolved,
    Granted,
    Denied(DenialReason),
}

/// Per-request authorization gate for admin content.
#[derive(Debug)]
pub struct AccessGuard {
    state: GuardState,
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessGuard {
    /// A guard that has not consulted the resolver yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: GuardState::Unresolved,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// Whether admin content may be produced.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self.state, GuardState::Granted)
    }

    /// Consult the resolver and settle the guard.
    ///
    /// Only an `Ok(true)` answer grants access. A guard that has already
    /// settled is returned unchanged.
    pub async fn check<L: RoleLookup>(
        &mut self,
        lookup: &L,
        user: Option<&CurrentUser>,
    ) -> GuardState {
        if self.state != GuardState::Unresolved {
            return self.state;
        }

        self.state = match (user, is_admin(lookup, user).await) {
            (None, _) => GuardState::Denied(DenialReason::NotSignedIn),
            (Some(_), Ok(true)) => GuardState::Granted,
            (Some(_), Ok(false)) => GuardState::Denied(DenialReason::NotAdmin),
            (Some(user), Err(e)) => {
                tracing::warn!(user_id = %user.id, error = %e, "Admin role lookup failed");
                GuardState::Denied(DenialReason::LookupFailed)
            }
        };

        self.state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Notify;

    use rain_advisory_core::AppRole;

    use super::*;
    use crate::services::roles::RoleError;
    use crate::services::roles::fakes::{FixedLookup, user};

    /// Lookup that answers `true` only after it is released.
    struct GatedLookup {
        release: Arc<Notify>,
    }

    impl RoleLookup for GatedLookup {
        async fn has_role(&self, _user: &CurrentUser, _role: AppRole) -> Result<bool, RoleError> {
            self.release.notified().await;
            Ok(true)
        }
    }

    #[test]
    fn test_new_guard_is_unresolved() {
        let guard = AccessGuard::new();
        assert_eq!(guard.state(), GuardState::Unresolved);
        assert!(!guard.is_granted());
    }

    #[tokio::test]
    async fn test_no_assignment_is_denied() {
        let mut guard = AccessGuard::new();
        let state = guard.check(&FixedLookup::not_admin(), Some(&user())).await;
        assert_eq!(state, GuardState::Denied(DenialReason::NotAdmin));
        assert!(!guard.is_granted());
    }

    #[tokio::test]
    async fn test_admin_assignment_is_granted() {
        let mut guard = AccessGuard::new();
        let state = guard.check(&FixedLookup::admin(), Some(&user())).await;
        assert_eq!(state, GuardState::Granted);
    }

    #[tokio::test]
    async fn test_lookup_fault_is_denied() {
        let mut guard = AccessGuard::new();
        let state = guard.check(&FixedLookup::failing(), Some(&user())).await;
        assert_eq!(state, GuardState::Denied(DenialReason::LookupFailed));
    }

    #[tokio::test]
    async fn test_signed_out_is_denied_without_lookup() {
        let lookup = FixedLookup::admin();
        let mut guard = AccessGuard::new();
        let state = guard.check(&lookup, None).await;
        assert_eq!(state, GuardState::Denied(DenialReason::NotSignedIn));
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_settled_guard_does_not_recheck() {
        let lookup = FixedLookup::admin();
        let mut guard = AccessGuard::new();
        guard.check(&FixedLookup::not_admin(), Some(&user())).await;
        let state = guard.check(&lookup, Some(&user())).await;
        assert_eq!(state, GuardState::Denied(DenialReason::NotAdmin));
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_granted_only_after_lookup_completes() {
        let release = Arc::new(Notify::new());
        let lookup = GatedLookup {
            release: Arc::clone(&release),
        };
        let current = user();
        let mut guard = AccessGuard::new();

        {
            let check = guard.check(&lookup, Some(&current));
            tokio::pin!(check);

            // Lookup still pending: the check cannot settle
            let pending = tokio::time::timeout(Duration::from_millis(50), &mut check).await;
            assert!(pending.is_err());

            release.notify_one();
            assert_eq!(check.await, GuardState::Granted);
        }

        assert!(guard.is_granted());
    }
}
