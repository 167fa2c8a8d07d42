//! Service layer for the subscription lifecycle boundary.
//!
//! Provides [`SubscriptionService`] which validates browser subscribe and
//! unsubscribe payloads before handing them to the registry.

use crate::subscription::{
    domain::{
        AuthSecret, ClientPublicKey, PushEndpoint, RegistrationParams, SubscriberRegistration,
        SubscriptionDomainError, TenantId, UserId,
    },
    ports::{SubscriptionRepository, SubscriptionRepositoryError},
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Key material as serialised by the browser's `PushSubscription.toJSON()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSubscriptionKeys {
    /// Base64url uncompressed P-256 public key.
    pub p256dh: String,
    /// Base64url 16-byte auth secret.
    pub auth: String,
}

/// Subscription payload as serialised by the browser's
/// `PushSubscription.toJSON()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSubscription {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Client key material.
    pub keys: BrowserSubscriptionKeys,
}

/// Request payload for registering a browser push subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    owner_id: UserId,
    tenant_id: Option<TenantId>,
    endpoint: String,
    p256dh: String,
    auth: String,
    user_agent: Option<String>,
}

impl SubscribeRequest {
    /// Creates a request with the required subscription fields.
    #[must_use]
    pub fn new(
        owner_id: UserId,
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            tenant_id: None,
            endpoint: endpoint.into(),
            p256dh: p256dh.into(),
            auth: auth.into(),
            user_agent: None,
        }
    }

    /// Creates a request from the browser's subscription JSON.
    #[must_use]
    pub fn from_browser(owner_id: UserId, subscription: BrowserSubscription) -> Self {
        let BrowserSubscription { endpoint, keys } = subscription;
        Self::new(owner_id, endpoint, keys.p256dh, keys.auth)
    }

    /// Sets the owner's tenant.
    #[must_use]
    pub const fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Sets the diagnostic user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Service-level errors for subscription lifecycle operations.
#[derive(Debug, Error)]
pub enum SubscriptionServiceError {
    /// Payload validation failed.
    #[error(transparent)]
    Domain(#[from] SubscriptionDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] SubscriptionRepositoryError),
}

/// Result type for subscription service operations.
pub type SubscriptionServiceResult<T> = Result<T, SubscriptionServiceError>;

/// Subscribe, unsubscribe and lookup orchestration service.
#[derive(Clone)]
pub struct SubscriptionService<R, C>
where
    R: SubscriptionRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> SubscriptionService<R, C>
where
    R: SubscriptionRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new subscription service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Registers a browser subscription, overwriting any registration that
    /// already exists for the same endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionServiceError::Domain`] when the endpoint or key
    /// material is invalid, or [`SubscriptionServiceError::Repository`] when
    /// the store rejects the write.
    pub async fn subscribe(
        &self,
        request: SubscribeRequest,
    ) -> SubscriptionServiceResult<SubscriberRegistration> {
        let SubscribeRequest {
            owner_id,
            tenant_id,
            endpoint,
            p256dh,
            auth,
            user_agent,
        } = request;

        let params = RegistrationParams {
            owner_id,
            tenant_id,
            endpoint: PushEndpoint::new(endpoint)?,
            client_public_key: ClientPublicKey::from_base64url(&p256dh)?,
            client_auth_secret: AuthSecret::from_base64url(&auth)?,
            user_agent,
        };
        let candidate = SubscriberRegistration::new(params, &*self.clock);
        let stored = self.repository.upsert(&candidate).await?;

        info!(
            subscription_id = %stored.id(),
            owner_id = %stored.owner_id(),
            endpoint_origin = %stored.endpoint().origin(),
            replaced = stored.id() != candidate.id(),
            "push subscription registered"
        );
        Ok(stored)
    }

    /// Removes the registration for an endpoint.
    ///
    /// Returns `false` when nothing was registered for the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionServiceError::Domain`] when the endpoint is
    /// malformed, or [`SubscriptionServiceError::Repository`] when the store
    /// is unavailable.
    pub async fn unsubscribe(&self, endpoint: &str) -> SubscriptionServiceResult<bool> {
        let push_endpoint = PushEndpoint::new(endpoint)?;
        let removed = self.repository.remove(&push_endpoint).await?;
        debug!(
            endpoint_origin = %push_endpoint.origin(),
            removed,
            "push subscription removal requested"
        );
        Ok(removed)
    }

    /// Returns every registration owned by a user.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionServiceError::Repository`] when persistence
    /// lookup fails.
    pub async fn list_by_owner(
        &self,
        owner_id: UserId,
    ) -> SubscriptionServiceResult<Vec<SubscriberRegistration>> {
        Ok(self.repository.list_by_owner(owner_id).await?)
    }

    /// Returns every registration belonging to a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionServiceError::Repository`] when persistence
    /// lookup fails.
    pub async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> SubscriptionServiceResult<Vec<SubscriberRegistration>> {
        Ok(self.repository.list_by_tenant(tenant_id).await?)
    }

    /// Returns every registration.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionServiceError::Repository`] when persistence
    /// lookup fails.
    pub async fn list_all(&self) -> SubscriptionServiceResult<Vec<SubscriberRegistration>> {
        Ok(self.repository.list_all().await?)
    }
}
