//! Role Resolver: decides whether an identity holds an application role.

use std::future::Future;

use thiserror::Error;

use rain_advisory_core::AppRole;

use crate::models::CurrentUser;
use crate::supabase::{SupabaseClient, SupabaseError};

/// The role lookup could not be completed.
///
/// Never interpreted as "has the role".
#[derive(Debug, Error)]
pub enum RoleError {
    /// The `user_roles` read failed.
    #[error("role lookup failed: {0}")]
    Lookup(#[from] SupabaseError),
}

/// Source of role assignments.
///
/// Implemented by [`SupabaseClient`]; tests substitute in-memory fakes.
pub trait RoleLookup: Send + Sync {
    /// Whether `user` has at least one assignment of `role`.
    ///
    /// A missing row is `Ok(false)`, not an error.
    fn has_role(
        &self,
        user: &CurrentUser,
        role: AppRole,
    ) -> impl Future<Output = Result<bool, RoleError>> + Send;
}

impl RoleLookup for SupabaseClient {
    async fn has_role(&self, user: &CurrentUser, role: AppRole) -> Result<bool, RoleError> {
        Ok(self.has_role_assignment(user, role).await?)
    }
}

/// Whether the (possibly absent) identity is an admin.
///
/// No identity short-circuits to `Ok(false)` without a lookup.
///
/// # Errors
///
/// Returns `RoleError` if the lookup itself fails.
pub async fn is_admin<L: RoleLookup>(
    lookup: &L,
    user: Option<&CurrentUser>,
) -> Result<bool, RoleError> {
    let Some(user) = user else {
        return Ok(false);
    };

    let admin = lookup.has_role(user, AppRole::Admin).await?;
    tracing::debug!(user_id = %user.id, admin, "Resolved admin role");
    Ok(admin)
}
