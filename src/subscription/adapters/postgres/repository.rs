//! `PostgreSQL` repository implementation for subscriber registrations.

use super::{
    models::{NewSubscriptionRow, SubscriptionRow},
    schema::push_subscriptions,
};
use crate::subscription::{
    domain::{
        AuthSecret, ClientPublicKey, PersistedSubscriptionData, PushEndpoint,
        SubscriberRegistration, SubscriptionId, TenantId, UserId,
    },
    ports::{SubscriptionRepository, SubscriptionRepositoryError, SubscriptionRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::upsert::excluded;

/// `PostgreSQL` connection pool type used by subscription adapters.
pub type SubscriptionPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed subscription repository.
#[derive(Debug, Clone)]
pub struct PostgresSubscriptionRepository {
    pool: SubscriptionPgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SubscriptionPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SubscriptionRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SubscriptionRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(SubscriptionRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(SubscriptionRepositoryError::persistence)?
    }

    async fn load_where<P>(&self, predicate: P) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>>
    where
        P: FnOnce(&mut PgConnection) -> QueryResult<Vec<SubscriptionRow>> + Send + 'static,
    {
        self.run_blocking(move |connection| {
            let rows = predicate(connection).map_err(SubscriptionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_registration).collect()
        })
        .await
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert(
        &self,
        registration: &SubscriberRegistration,
    ) -> SubscriptionRepositoryResult<SubscriberRegistration> {
        let new_row = to_new_row(registration);

        self.run_blocking(move |connection| {
            let row = diesel::insert_into(push_subscriptions::table)
                .values(&new_row)
                .on_conflict(push_subscriptions::endpoint)
                .do_update()
                .set((
                    push_subscriptions::owner_id.eq(excluded(push_subscriptions::owner_id)),
                    push_subscriptions::tenant_id.eq(excluded(push_subscriptions::tenant_id)),
                    push_subscriptions::p256dh.eq(excluded(push_subscriptions::p256dh)),
                    push_subscriptions::auth_secret.eq(excluded(push_subscriptions::auth_secret)),
                    push_subscriptions::user_agent.eq(excluded(push_subscriptions::user_agent)),
                    push_subscriptions::updated_at.eq(excluded(push_subscriptions::updated_at)),
                ))
                .returning(SubscriptionRow::as_returning())
                .get_result::<SubscriptionRow>(connection)
                .map_err(SubscriptionRepositoryError::persistence)?;
            row_to_registration(row)
        })
        .await
    }

    async fn remove(&self, endpoint: &PushEndpoint) -> SubscriptionRepositoryResult<bool> {
        let endpoint_str = endpoint.as_str().to_owned();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                push_subscriptions::table.filter(push_subscriptions::endpoint.eq(&endpoint_str)),
            )
            .execute(connection)
            .map_err(SubscriptionRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn remove_if_unchanged(
        &self,
        endpoint: &PushEndpoint,
        updated_at: DateTime<Utc>,
    ) -> SubscriptionRepositoryResult<bool> {
        let endpoint_str = endpoint.as_str().to_owned();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                push_subscriptions::table
                    .filter(push_subscriptions::endpoint.eq(&endpoint_str))
                    .filter(push_subscriptions::updated_at.eq(updated_at)),
            )
            .execute(connection)
            .map_err(SubscriptionRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
    ) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>> {
        let owner = owner_id.into_inner();
        self.load_where(move |connection| {
            push_subscriptions::table
                .filter(push_subscriptions::owner_id.eq(owner))
                .order(push_subscriptions::created_at.asc())
                .select(SubscriptionRow::as_select())
                .load::<SubscriptionRow>(connection)
        })
        .await
    }

    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>> {
        let tenant = tenant_id.into_inner();
        self.load_where(move |connection| {
            push_subscriptions::table
                .filter(push_subscriptions::tenant_id.eq(tenant))
                .order(push_subscriptions::created_at.asc())
                .select(SubscriptionRow::as_select())
                .load::<SubscriptionRow>(connection)
        })
        .await
    }

    async fn list_all(&self) -> SubscriptionRepositoryResult<Vec<SubscriberRegistration>> {
        self.load_where(move |connection| {
            push_subscriptions::table
                .order(push_subscriptions::created_at.asc())
                .select(SubscriptionRow::as_select())
                .load::<SubscriptionRow>(connection)
        })
        .await
    }
}

fn to_new_row(registration: &SubscriberRegistration) -> NewSubscriptionRow {
    NewSubscriptionRow {
        id: registration.id().into_inner(),
        owner_id: registration.owner_id().into_inner(),
        tenant_id: registration.tenant_id().map(TenantId::into_inner),
        endpoint: registration.endpoint().as_str().to_owned(),
        p256dh: registration.client_public_key().to_base64url(),
        auth_secret: registration.client_auth_secret().to_base64url(),
        user_agent: registration.user_agent().map(str::to_owned),
        created_at: registration.created_at(),
        updated_at: registration.updated_at(),
    }
}

fn row_to_registration(row: SubscriptionRow) -> SubscriptionRepositoryResult<SubscriberRegistration> {
    let SubscriptionRow {
        id,
        owner_id,
        tenant_id,
        endpoint,
        p256dh,
        auth_secret,
        user_agent,
        created_at,
        updated_at,
    } = row;

    let parsed_endpoint =
        PushEndpoint::new(endpoint).map_err(SubscriptionRepositoryError::invalid_persisted_data)?;
    let parsed_key = ClientPublicKey::from_base64url(&p256dh)
        .map_err(SubscriptionRepositoryError::invalid_persisted_data)?;
    let parsed_secret = AuthSecret::from_base64url(&auth_secret)
        .map_err(SubscriptionRepositoryError::invalid_persisted_data)?;

    let data = PersistedSubscriptionData {
        id: SubscriptionId::from_uuid(id),
        owner_id: UserId::from_uuid(owner_id),
        tenant_id: tenant_id.map(TenantId::from_uuid),
        endpoint: parsed_endpoint,
        client_public_key: parsed_key,
        client_auth_secret: parsed_secret,
        user_agent,
        created_at,
        updated_at,
    };
    Ok(SubscriberRegistration::from_persisted(data))
}
