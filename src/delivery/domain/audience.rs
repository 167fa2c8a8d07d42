//! Audience authorization rules.

use super::{AudienceError, AudienceTarget};
use crate::subscription::domain::{TenantId, UserId};
use serde::{Deserialize, Serialize};

/// What a caller is allowed to address, as reported by the identity
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "tenant_id", rename_all = "snake_case")]
pub enum CallerAuthority {
    /// Platform-level role; may address any tenant or everyone.
    Unrestricted,
    /// Scoped to a single tenant.
    Tenant(TenantId),
    /// No tenant scope and no platform role.
    Unscoped,
}

/// Registry lookup the caller is authorized to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceQuery {
    /// Registrations owned by a user.
    Owner(UserId),
    /// Registrations belonging to a tenant.
    Tenant(TenantId),
    /// Every registration.
    All,
}

impl AudienceQuery {
    /// Maps a requested target onto the lookup the caller may perform.
    ///
    /// Owner targets are always allowed. Tenant targets require an
    /// unrestricted caller or one scoped to that tenant. A broadcast (`None`
    /// or [`AudienceTarget::Everyone`]) reaches every registration for
    /// unrestricted callers and narrows to the caller's own tenant for
    /// tenant-scoped callers.
    ///
    /// # Errors
    ///
    /// Returns [`AudienceError::Unauthorized`] when the caller may not
    /// address the target.
    pub fn authorize(
        target: Option<AudienceTarget>,
        authority: &CallerAuthority,
    ) -> Result<Self, AudienceError> {
        let requested = target.unwrap_or(AudienceTarget::Everyone);
        match (requested, authority) {
            (AudienceTarget::Owner(owner_id), _) => Ok(Self::Owner(owner_id)),
            (AudienceTarget::Tenant(tenant_id), CallerAuthority::Unrestricted) => {
                Ok(Self::Tenant(tenant_id))
            }
            (AudienceTarget::Tenant(tenant_id), CallerAuthority::Tenant(own))
                if tenant_id == *own =>
            {
                Ok(Self::Tenant(tenant_id))
            }
            (AudienceTarget::Everyone, CallerAuthority::Unrestricted) => Ok(Self::All),
            (AudienceTarget::Everyone, CallerAuthority::Tenant(own)) => Ok(Self::Tenant(*own)),
            (
                AudienceTarget::Tenant(_) | AudienceTarget::Everyone,
                CallerAuthority::Tenant(_) | CallerAuthority::Unscoped,
            ) => Err(AudienceError::Unauthorized { target: requested }),
        }
    }
}
