//! Subscriber registration aggregate root.

use super::{AuthSecret, ClientPublicKey, PushEndpoint, SubscriptionId, TenantId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Server-side record binding one browser's push endpoint to its key
/// material and owning identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRegistration {
    id: SubscriptionId,
    owner_id: UserId,
    tenant_id: Option<TenantId>,
    endpoint: PushEndpoint,
    client_public_key: ClientPublicKey,
    client_auth_secret: AuthSecret,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Validated fields supplied when a browser subscribes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationParams {
    /// Owning user.
    pub owner_id: UserId,
    /// Owning organisation, if any.
    pub tenant_id: Option<TenantId>,
    /// Push service endpoint.
    pub endpoint: PushEndpoint,
    /// Browser ECDH public key.
    pub client_public_key: ClientPublicKey,
    /// Browser auth secret.
    pub client_auth_secret: AuthSecret,
    /// Diagnostic user agent string.
    pub user_agent: Option<String>,
}

/// Parameter object for reconstructing a persisted registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSubscriptionData {
    /// Persisted registration identifier.
    pub id: SubscriptionId,
    /// Persisted owner.
    pub owner_id: UserId,
    /// Persisted tenant.
    pub tenant_id: Option<TenantId>,
    /// Persisted endpoint.
    pub endpoint: PushEndpoint,
    /// Persisted client public key.
    pub client_public_key: ClientPublicKey,
    /// Persisted client auth secret.
    pub client_auth_secret: AuthSecret,
    /// Persisted user agent.
    pub user_agent: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest overwrite timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SubscriberRegistration {
    /// Creates a new registration with a fresh identifier.
    #[must_use]
    pub fn new(params: RegistrationParams, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let RegistrationParams {
            owner_id,
            tenant_id,
            endpoint,
            client_public_key,
            client_auth_secret,
            user_agent,
        } = params;
        Self {
            id: SubscriptionId::new(),
            owner_id,
            tenant_id,
            endpoint,
            client_public_key,
            client_auth_secret,
            user_agent: normalize_user_agent(user_agent),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a registration from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSubscriptionData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            tenant_id: data.tenant_id,
            endpoint: data.endpoint,
            client_public_key: data.client_public_key,
            client_auth_secret: data.client_auth_secret,
            user_agent: data.user_agent,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the registration identifier.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the owning tenant, if any.
    #[must_use]
    pub const fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the push endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &PushEndpoint {
        &self.endpoint
    }

    /// Returns the browser ECDH public key.
    #[must_use]
    pub const fn client_public_key(&self) -> &ClientPublicKey {
        &self.client_public_key
    }

    /// Returns the browser auth secret.
    #[must_use]
    pub const fn client_auth_secret(&self) -> &AuthSecret {
        &self.client_auth_secret
    }

    /// Returns the diagnostic user agent.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest overwrite timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a re-subscription of the same endpoint.
    ///
    /// Owner, tenant, keys and user agent are replaced by `incoming`; the
    /// identifier and creation timestamp of `self` are kept.
    pub fn overwrite_with(&mut self, incoming: &Self) {
        self.owner_id = incoming.owner_id;
        self.tenant_id = incoming.tenant_id;
        self.client_public_key = incoming.client_public_key;
        self.client_auth_secret = incoming.client_auth_secret;
        self.user_agent.clone_from(&incoming.user_agent);
        self.updated_at = incoming.updated_at;
    }
}

fn normalize_user_agent(user_agent: Option<String>) -> Option<String> {
    user_agent
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
