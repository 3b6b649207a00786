//! Verified-status and role policy.

use super::errors::AuthError;
use crate::db::{Role, User};

/// Per-route policy combining verified status and role membership.
///
/// Constructed with the roles a route accepts and injected into the
/// router's state. The verified check always runs first: an unverified
/// admin fails with `AccountNotVerified`, never `InsufficientPermission`.
#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    allowed: &'static [Role],
}

impl RoleGate {
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Authorize a resolved user, or report why not.
    pub fn authorize(&self, user: &User) -> Result<(), AuthError> {
        if !user.is_verified {
            return Err(AuthError::AccountNotVerified);
        }
        if !self.allowed.contains(&user.role) {
            return Err(AuthError::InsufficientPermission);
        }
        Ok(())
    }
}
