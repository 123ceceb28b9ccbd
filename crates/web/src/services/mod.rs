//! Application services.

pub mod access;
pub mod auth;
pub mod reports;
pub mod roles;
pub mod validation;

pub use access::{AccessGuard, DenialReason, GuardState};
pub use auth::{AuthError, Registration};
pub use roles::{RoleError, RoleLookup, is_admin};
