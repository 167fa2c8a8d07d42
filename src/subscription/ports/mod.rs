//! Port contracts for subscriber registration persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by the registry
//! service and by the delivery orchestration that prunes dead endpoints.

pub mod repository;

pub use repository::{
    SubscriptionRepository, SubscriptionRepositoryError, SubscriptionRepositoryResult,
};

#[cfg(test)]
pub use repository::MockSubscriptionRepository;
