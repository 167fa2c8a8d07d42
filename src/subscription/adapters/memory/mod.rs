//! In-memory adapter implementations for testing and local runs.

mod repository;

pub use repository::InMemorySubscriptionRepository;
