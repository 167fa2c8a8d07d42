//! Shared fixtures for in-memory integration tests.

use std::sync::Arc;

use feebell::delivery::{
    adapters::memory::{InMemoryCallerDirectory, ScriptedPushTransport},
    crypto::{VapidKeyPair, VapidSigner},
    services::NotificationService,
};
use feebell::subscription::{
    adapters::memory::InMemorySubscriptionRepository, services::SubscriptionService,
};
use mockable::DefaultClock;
use rstest::fixture;

/// Registry service over the in-memory repository.
pub type TestSubscriptionService =
    SubscriptionService<InMemorySubscriptionRepository, DefaultClock>;

/// Dispatch service over the in-memory adapters.
pub type TestNotificationService = NotificationService<
    InMemorySubscriptionRepository,
    InMemoryCallerDirectory,
    ScriptedPushTransport,
    DefaultClock,
>;

/// Registry and dispatch services sharing one repository.
pub struct Stack {
    pub subscriptions: TestSubscriptionService,
    pub notifications: TestNotificationService,
    pub directory: Arc<InMemoryCallerDirectory>,
    pub transport: Arc<ScriptedPushTransport>,
}

impl Stack {
    /// Wires the services around a signer.
    pub fn with_signer(signer: VapidSigner) -> Self {
        let repository = Arc::new(InMemorySubscriptionRepository::new());
        let directory = Arc::new(InMemoryCallerDirectory::new());
        let transport = Arc::new(ScriptedPushTransport::new());
        let clock = Arc::new(DefaultClock);
        Self {
            subscriptions: SubscriptionService::new(Arc::clone(&repository), Arc::clone(&clock)),
            notifications: NotificationService::new(
                repository,
                Arc::clone(&directory),
                Arc::clone(&transport),
                Arc::new(signer),
                clock,
            ),
            directory,
            transport,
        }
    }
}

/// Provides a stack with a freshly generated signing key.
#[fixture]
pub fn stack() -> Stack {
    let signer =
        VapidSigner::with_default_lifetime(VapidKeyPair::generate(), "mailto:ops@example.com")
            .expect("valid VAPID signer");
    Stack::with_signer(signer)
}
