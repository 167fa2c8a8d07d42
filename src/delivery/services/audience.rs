//! Audience resolution: who receives a dispatch.

use crate::delivery::{
    domain::{AudienceError, AudienceQuery, AudienceTarget},
    ports::{CallerDirectory, CallerDirectoryError},
};
use crate::subscription::{
    domain::{SubscriberRegistration, UserId},
    ports::{SubscriptionRepository, SubscriptionRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while resolving an audience.
#[derive(Debug, Error)]
pub enum AudienceResolutionError {
    /// The caller may not address the target.
    #[error(transparent)]
    Audience(#[from] AudienceError),
    /// The identity service failed.
    #[error(transparent)]
    Directory(#[from] CallerDirectoryError),
    /// The registry failed.
    #[error(transparent)]
    Repository(#[from] SubscriptionRepositoryError),
}

/// Resolves dispatch targets to registrations the caller may reach.
#[derive(Clone)]
pub struct AudienceResolver<R, D>
where
    R: SubscriptionRepository,
    D: CallerDirectory,
{
    repository: Arc<R>,
    directory: Arc<D>,
}

impl<R, D> AudienceResolver<R, D>
where
    R: SubscriptionRepository,
    D: CallerDirectory,
{
    /// Creates a resolver.
    #[must_use]
    pub const fn new(repository: Arc<R>, directory: Arc<D>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    /// Returns the registrations `caller` may notify for `target`.
    ///
    /// An absent target means everyone the caller may reach. An empty result
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AudienceResolutionError::Audience`] when the caller lacks
    /// authority, or the directory or registry error when a lookup fails.
    pub async fn resolve(
        &self,
        target: Option<AudienceTarget>,
        caller: UserId,
    ) -> Result<Vec<SubscriberRegistration>, AudienceResolutionError> {
        let authority = self.directory.authority(caller).await?;
        let query = AudienceQuery::authorize(target, &authority)?;
        let registrations = match query {
            AudienceQuery::Owner(owner_id) => self.repository.list_by_owner(owner_id).await?,
            AudienceQuery::Tenant(tenant_id) => self.repository.list_by_tenant(tenant_id).await?,
            AudienceQuery::All => self.repository.list_all().await?,
        };
        debug!(
            caller = %caller,
            ?query,
            recipients = registrations.len(),
            "audience resolved"
        );
        Ok(registrations)
    }
}
