//! Identity port resolving what a caller is allowed to address.

use crate::delivery::domain::CallerAuthority;
use crate::subscription::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for caller directory lookups.
pub type CallerDirectoryResult<T> = Result<T, CallerDirectoryError>;

/// Lookup of caller roles and tenant membership.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallerDirectory: Send + Sync {
    /// Returns the authority of a caller.
    ///
    /// Callers the directory does not know have
    /// [`CallerAuthority::Unscoped`].
    ///
    /// # Errors
    ///
    /// Returns [`CallerDirectoryError::Lookup`] when the identity service
    /// cannot be reached.
    async fn authority(&self, caller: UserId) -> CallerDirectoryResult<CallerAuthority>;
}

/// Errors returned by caller directory implementations.
#[derive(Debug, Clone, Error)]
pub enum CallerDirectoryError {
    /// The identity service failed.
    #[error("caller lookup failed: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl CallerDirectoryError {
    /// Wraps an identity service error.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
