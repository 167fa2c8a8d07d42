//! In-memory subscriber registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::subscription::{
    domain::{PushEndpoint, SubscriberRegistration, SubscriptionId, TenantId, UserId},
    ports::{SubscriptionRepository, SubscriptionRepositoryError, SubscriptionRepositoryResult},
};

/// Thread-safe in-memory subscription repository.
///
/// Upserts take the write lock for the whole read-modify-write, which makes
/// them atomic per endpoint.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    state: Arc<RwLock<InMemorySubscriptionState>>,
}

#[derive(Debug, Default)]
struct InMemorySubscriptionState {
    registrations: HashMap<SubscriptionId, SubscriberRegistration>,
    endpoint_index: HashMap<PushEndpoint, SubscriptionId>,
}

impl InMemorySubscriptionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn select(
        &self,
        predicate: impl Fn(&SubscriberRegistration) -> bool,
    ) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>> {
        let state = self.state.read().map_err(|err| {
            SubscriptionRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut matching: Vec<SubscriberRegistration> = state
            .registrations
            .values()
            .filter(|registration| predicate(registration))
            .cloned()
            .collect();
        matching.sort_by_key(SubscriberRegistration::created_at);
        Ok(matching)
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn upsert(
        &self,
        registration: &SubscriberRegistration,
    ) -> SubscriptionRepositoryResult<SubscriberRegistration> {
        let mut state = self.state.write().map_err(|err| {
            SubscriptionRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let existing_id = state.endpoint_index.get(registration.endpoint()).copied();
        if let Some(id) = existing_id
            && let Some(stored) = state.registrations.get_mut(&id)
        {
            stored.overwrite_with(registration);
            return Ok(stored.clone());
        }

        state
            .endpoint_index
            .insert(registration.endpoint().clone(), registration.id());
        state
            .registrations
            .insert(registration.id(), registration.clone());
        Ok(registration.clone())
    }

    async fn remove(&self, endpoint: &PushEndpoint) -> SubscriptionRepositoryResult<bool> {
        let mut state = self.state.write().map_err(|err| {
            SubscriptionRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let Some(id) = state.endpoint_index.remove(endpoint) else {
            return Ok(false);
        };
        Ok(state.registrations.remove(&id).is_some())
    }

    async fn remove_if_unchanged(
        &self,
        endpoint: &PushEndpoint,
        updated_at: DateTime<Utc>,
    ) -> SubscriptionRepositoryResult<bool> {
        let mut state = self.state.write().map_err(|err| {
            SubscriptionRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let Some(id) = state.endpoint_index.get(endpoint).copied() else {
            return Ok(false);
        };
        let unchanged = state
            .registrations
            .get(&id)
            .is_some_and(|stored| stored.updated_at() == updated_at);
        if !unchanged {
            return Ok(false);
        }
        state.endpoint_index.remove(endpoint);
        Ok(state.registrations.remove(&id).is_some())
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
    ) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>> {
        self.select(|registration| registration.owner_id() == owner_id)
    }

    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>> {
        self.select(|registration| registration.tenant_id() == Some(tenant_id))
    }

    async fn list_all(&self) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>> {
        self.select(|_| true)
    }
}
