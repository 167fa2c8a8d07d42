//! In-memory caller directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::delivery::{
    domain::CallerAuthority,
    ports::{CallerDirectory, CallerDirectoryError, CallerDirectoryResult},
};
use crate::subscription::domain::UserId;

/// Thread-safe in-memory caller directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCallerDirectory {
    authorities: Arc<RwLock<HashMap<UserId, CallerAuthority>>>,
}

impl InMemoryCallerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the authority of a caller, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`CallerDirectoryError::Lookup`] when the lock is poisoned.
    pub fn grant(&self, caller: UserId, authority: CallerAuthority) -> CallerDirectoryResult<()> {
        let mut authorities = self.authorities.write().map_err(|err| {
            CallerDirectoryError::lookup(std::io::Error::other(err.to_string()))
        })?;
        authorities.insert(caller, authority);
        Ok(())
    }
}

#[async_trait]
impl CallerDirectory for InMemoryCallerDirectory {
    async fn authority(&self, caller: UserId) -> CallerDirectoryResult<CallerAuthority> {
        let authorities = self.authorities.read().map_err(|err| {
            CallerDirectoryError::lookup(std::io::Error::other(err.to_string()))
        })?;
        Ok(authorities
            .get(&caller)
            .copied()
            .unwrap_or(CallerAuthority::Unscoped))
    }
}
