//! Repository port for subscriber registration persistence and lookup.

use crate::subscription::domain::{PushEndpoint, SubscriberRegistration, TenantId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for subscription repository operations.
pub type SubscriptionRepositoryResult<T> = Result<T, SubscriptionRepositoryError>;

/// Subscriber registry persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a registration, or overwrites the one stored for the same
    /// endpoint, as a single atomic operation.
    ///
    /// Returns the stored registration. When the endpoint already existed
    /// the stored identifier and creation timestamp are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionRepositoryError::Persistence`] when the store is
    /// unavailable.
    async fn upsert(
        &self,
        registration: &SubscriberRegistration,
    ) -> SubscriptionRepositoryResult<SubscriberRegistration>;

    /// Removes the registration for an endpoint.
    ///
    /// Returns `false` when no registration existed; absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionRepositoryError::Persistence`] when the store is
    /// unavailable.
    async fn remove(&self, endpoint: &PushEndpoint) -> SubscriptionRepositoryResult<bool>;

    /// Removes the registration for an endpoint only if it was last written
    /// at `updated_at`.
    ///
    /// A browser that re-subscribed after the registration was read keeps
    /// its new row. Returns `false` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionRepositoryError::Persistence`] when the store is
    /// unavailable.
    async fn remove_if_unchanged(
        &self,
        endpoint: &PushEndpoint,
        updated_at: DateTime<Utc>,
    ) -> SubscriptionRepositoryResult<bool>;

    /// Returns every registration owned by a user.
    async fn list_by_owner(
        &self,
        owner_id: UserId,
    ) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>>;

    /// Returns every registration belonging to a tenant.
    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>>;

    /// Returns every registration.
    async fn list_all(&self) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>>;
}

/// Errors returned by subscription repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SubscriptionRepositoryError {
    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted subscription data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SubscriptionRepositoryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` when retrying the same operation later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
