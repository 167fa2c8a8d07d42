//! Shared helpers for `PostgreSQL` integration tests.
//!
//! Tests run against the embedded cluster that `pg-embed-setup-unpriv`
//! shares across the test binary. Each test gets its own database cloned
//! from a migrated template.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use feebell::subscription::{
    adapters::postgres::PostgresSubscriptionRepository, services::SubscriptionService,
};
use mockable::DefaultClock;
pub use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::fixture;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Boxed error type for test setup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the subscription schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_push_subscriptions/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "feebell_test_template";

/// Connections per test pool; more than one so upserts can race.
const POOL_SIZE: u32 = 4;

/// Registry service over the `PostgreSQL` repository.
pub type PgSubscriptionService = SubscriptionService<PostgresSubscriptionRepository, DefaultClock>;

/// Creates a tokio runtime for async operations in tests.
///
/// # Panics
///
/// Panics if the runtime cannot be built.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if the template cannot be created or migrated.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("schema migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)
}

/// Drops the test database when the test finishes, even on panic.
pub struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(self.db_name.as_str()));
    }
}

/// A registry service wired to a database cloned from the template.
///
/// Fields drop in order, so the pool closes before the database is dropped.
pub struct PgContext {
    pub service: PgSubscriptionService,
    pub repository: Arc<PostgresSubscriptionRepository>,
    pub runtime: Runtime,
    _guard: CleanupGuard,
}

/// Builds a context on the shared embedded cluster.
///
/// # Panics
///
/// Panics if the template, database or pool cannot be prepared.
#[fixture]
pub fn pg_context(shared_test_cluster: &'static TestCluster) -> PgContext {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("feebell_{}", Uuid::new_v4().simple());
    shared_test_cluster
        .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
        .expect("database from template");
    let guard = CleanupGuard {
        cluster: shared_test_cluster,
        db_name: db_name.clone(),
    };

    let url = shared_test_cluster.connection().database_url(&db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .expect("connection pool");
    let repository = Arc::new(PostgresSubscriptionRepository::new(pool));
    let service = SubscriptionService::new(Arc::clone(&repository), Arc::new(DefaultClock));
    PgContext {
        service,
        repository,
        runtime: test_runtime(),
        _guard: guard,
    }
}
