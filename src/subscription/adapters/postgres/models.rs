//! Diesel row models for subscriber registration persistence.

use super::schema::push_subscriptions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for subscription records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = push_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionRow {
    /// Internal registration identifier.
    pub id: uuid::Uuid,
    /// Owning user identifier.
    pub owner_id: uuid::Uuid,
    /// Owning tenant identifier.
    pub tenant_id: Option<uuid::Uuid>,
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Base64url client public key.
    pub p256dh: String,
    /// Base64url client auth secret.
    pub auth_secret: String,
    /// Diagnostic user agent.
    pub user_agent: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last overwrite timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for subscription records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = push_subscriptions)]
pub struct NewSubscriptionRow {
    /// Internal registration identifier.
    pub id: uuid::Uuid,
    /// Owning user identifier.
    pub owner_id: uuid::Uuid,
    /// Owning tenant identifier.
    pub tenant_id: Option<uuid::Uuid>,
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Base64url client public key.
    pub p256dh: String,
    /// Base64url client auth secret.
    pub auth_secret: String,
    /// Diagnostic user agent.
    pub user_agent: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last overwrite timestamp.
    pub updated_at: DateTime<Utc>,
}
