//! `PostgreSQL` adapters for subscriber registration persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresSubscriptionRepository, SubscriptionPgPool};
