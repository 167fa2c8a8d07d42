//! Dispatch orchestration: resolve, sign, encrypt, fan out, prune.

use super::{AudienceResolutionError, AudienceResolver, DeliveryDispatcher};
use crate::delivery::{
    config::{ConfigurationError, DeliveryConfig},
    crypto::{
        CryptoError, CryptoResult, MAX_PLAINTEXT_LENGTH, VapidHeaders, VapidSigner, encrypt,
    },
    domain::{
        AudienceError, DeliveryFailure, DeliveryOutcome, DeliveryStatus, DispatchRequest,
        DispatchSummary, PayloadError, Urgency,
    },
    ports::{CallerDirectory, PushTransport},
};
use crate::subscription::{
    domain::{SubscriberRegistration, SubscriptionId, UserId},
    ports::SubscriptionRepository,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that abort a dispatch before any message is sent.
///
/// Per-recipient failures are never reported here; they are counted in the
/// [`DispatchSummary`].
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The payload is invalid.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// The audience could not be resolved or was not permitted.
    #[error(transparent)]
    Audience(#[from] AudienceResolutionError),
    /// The payload could not be serialised.
    #[error("failed to serialise notification payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NotificationError {
    /// Returns `true` when the caller addressed an audience outside its
    /// authority.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Audience(AudienceResolutionError::Audience(
                AudienceError::Unauthorized { .. }
            ))
        )
    }
}

/// Result type for notification dispatch.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Sends notifications to every registration in an authorized audience.
///
/// One task is spawned per recipient and at most
/// [`DeliveryConfig::max_in_flight`] run at once. After the batch, endpoints
/// the push service reported as gone are removed from the registry.
pub struct NotificationService<R, D, T, C>
where
    R: SubscriptionRepository,
    D: CallerDirectory,
    T: PushTransport + 'static,
    C: Clock + Send + Sync,
{
    resolver: AudienceResolver<R, D>,
    repository: Arc<R>,
    transport: Arc<T>,
    dispatcher: Arc<DeliveryDispatcher<T>>,
    signer: Arc<VapidSigner>,
    clock: Arc<C>,
    config: DeliveryConfig,
}

impl<R, D, T, C> NotificationService<R, D, T, C>
where
    R: SubscriptionRepository,
    D: CallerDirectory,
    T: PushTransport + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default [`DeliveryConfig`].
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        transport: Arc<T>,
        signer: Arc<VapidSigner>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            resolver: AudienceResolver::new(Arc::clone(&repository), directory),
            repository,
            dispatcher: Arc::new(DeliveryDispatcher::new(Arc::clone(&transport))),
            transport,
            signer,
            clock,
            config: DeliveryConfig::default(),
        }
    }

    /// Replaces the delivery settings.
    ///
    /// `request_timeout` bounds every push call made by this service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSetting`] when `config` fails
    /// validation.
    pub fn with_config(mut self, config: DeliveryConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        self.dispatcher = Arc::new(
            DeliveryDispatcher::new(Arc::clone(&self.transport))
                .with_request_timeout(config.request_timeout),
        );
        self.config = config;
        Ok(self)
    }

    /// Returns the key browsers pass as `applicationServerKey` when
    /// subscribing.
    #[must_use]
    pub fn application_server_key(&self) -> &str {
        self.signer.public_key_base64url()
    }

    /// Returns the active delivery settings.
    #[must_use]
    pub const fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Sends a notification on behalf of `caller`.
    ///
    /// Returns the zero summary without contacting any push service when the
    /// audience is empty. Individual delivery failures are counted, never
    /// returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Payload`] for an invalid or oversized
    /// payload and [`NotificationError::Audience`] when the caller is not
    /// authorized or a lookup fails. No message is sent in either case.
    pub async fn send(
        &self,
        caller: UserId,
        request: &DispatchRequest,
    ) -> NotificationResult<DispatchSummary> {
        let payload = request.payload();
        payload.validate()?;
        let plaintext = payload.to_json_bytes()?;
        if plaintext.len() > MAX_PLAINTEXT_LENGTH {
            return Err(PayloadError::TooLarge {
                size: plaintext.len(),
                max: MAX_PLAINTEXT_LENGTH,
            }
            .into());
        }

        let registrations = self.resolver.resolve(request.target(), caller).await?;
        if registrations.is_empty() {
            info!(caller = %caller, "no registrations in audience, nothing sent");
            return Ok(DispatchSummary::empty());
        }

        let total = registrations.len();
        let ttl = self.config.effective_ttl(request.ttl());
        let urgency = request.urgency().unwrap_or(self.config.default_urgency);
        let credentials = self.sign_per_origin(&registrations);
        let versions: HashMap<SubscriptionId, DateTime<Utc>> = registrations
            .iter()
            .map(|registration| (registration.id(), registration.updated_at()))
            .collect();
        let outcomes = self
            .fan_out(registrations, plaintext, &credentials, ttl, urgency)
            .await;
        let pruned = self.prune(&outcomes, &versions).await;

        let summary = DispatchSummary::from_outcomes(total, &outcomes).with_pruned(pruned);
        info!(
            caller = %caller,
            sent = summary.sent,
            failed = summary.failed,
            total = summary.total,
            pruned = summary.pruned,
            "notification dispatched"
        );
        Ok(summary)
    }

    fn sign_per_origin(
        &self,
        registrations: &[SubscriberRegistration],
    ) -> HashMap<String, CryptoResult<VapidHeaders>> {
        let mut credentials = HashMap::new();
        for registration in registrations {
            credentials
                .entry(registration.endpoint().origin())
                .or_insert_with_key(|origin| self.signer.sign(origin, &*self.clock));
        }
        debug!(origins = credentials.len(), "VAPID credentials signed");
        credentials
    }

    async fn fan_out(
        &self,
        registrations: Vec<SubscriberRegistration>,
        plaintext: Vec<u8>,
        credentials: &HashMap<String, CryptoResult<VapidHeaders>>,
        ttl: Duration,
        urgency: Urgency,
    ) -> Vec<DeliveryOutcome> {
        let shared_plaintext: Arc<[u8]> = Arc::from(plaintext);
        let permits = Arc::new(Semaphore::new(self.config.max_in_flight));
        let mut tasks = JoinSet::new();
        for registration in registrations {
            let vapid = credentials
                .get(&registration.endpoint().origin())
                .cloned()
                .unwrap_or_else(|| {
                    Err(CryptoError::Signing("no credentials for origin".to_owned()))
                });
            let job = DeliveryJob {
                dispatcher: Arc::clone(&self.dispatcher),
                permits: Arc::clone(&permits),
                plaintext: Arc::clone(&shared_plaintext),
                registration,
                vapid,
                ttl,
                urgency,
            };
            tasks.spawn(job.run());
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!(error = %err, "delivery task failed, counted as transient"),
            }
        }
        outcomes
    }

    /// Removes registrations the push service reported as gone, unless the
    /// browser re-subscribed while the batch was in flight.
    async fn prune(
        &self,
        outcomes: &[DeliveryOutcome],
        versions: &HashMap<SubscriptionId, DateTime<Utc>>,
    ) -> usize {
        let mut pruned = 0;
        let dead = outcomes
            .iter()
            .filter(|outcome| outcome.is_permanent_failure())
            .filter_map(|outcome| {
                versions
                    .get(&outcome.subscription_id())
                    .map(|updated_at| (outcome, *updated_at))
            });
        for (outcome, updated_at) in dead {
            match self
                .repository
                .remove_if_unchanged(outcome.endpoint(), updated_at)
                .await
            {
                Ok(true) => {
                    pruned += 1;
                    info!(
                        subscription_id = %outcome.subscription_id(),
                        endpoint_origin = %outcome.endpoint().origin(),
                        "removed dead push subscription"
                    );
                }
                Ok(false) => debug!(
                    subscription_id = %outcome.subscription_id(),
                    "dead push subscription already removed or re-registered"
                ),
                Err(err) => warn!(
                    subscription_id = %outcome.subscription_id(),
                    error = %err,
                    "failed to remove dead push subscription"
                ),
            }
        }
        pruned
    }
}

/// Everything one spawned delivery task owns.
struct DeliveryJob<T>
where
    T: PushTransport,
{
    dispatcher: Arc<DeliveryDispatcher<T>>,
    permits: Arc<Semaphore>,
    plaintext: Arc<[u8]>,
    registration: SubscriberRegistration,
    vapid: CryptoResult<VapidHeaders>,
    ttl: Duration,
    urgency: Urgency,
}

impl<T> DeliveryJob<T>
where
    T: PushTransport,
{
    async fn run(self) -> DeliveryOutcome {
        let Self {
            dispatcher,
            permits,
            plaintext,
            registration,
            vapid,
            ttl,
            urgency,
        } = self;

        let Ok(_permit) = permits.acquire_owned().await else {
            return transient_failure(&registration, "delivery pool closed".to_owned());
        };
        let headers = match vapid {
            Ok(headers) => headers,
            Err(err) => return transient_failure(&registration, err.to_string()),
        };
        let body = match encrypt(
            &plaintext,
            registration.client_public_key(),
            registration.client_auth_secret(),
        ) {
            Ok(body) => body,
            Err(err) => return transient_failure(&registration, err.to_string()),
        };

        dispatcher
            .dispatch(&registration, body, &headers, ttl, urgency)
            .await
    }
}

fn transient_failure(registration: &SubscriberRegistration, reason: String) -> DeliveryOutcome {
    warn!(
        subscription_id = %registration.id(),
        endpoint_origin = %registration.endpoint().origin(),
        reason = %reason,
        "push message not sent"
    );
    DeliveryOutcome::new(
        registration.id(),
        registration.endpoint().clone(),
        DeliveryStatus::Failed(DeliveryFailure::transient(reason)),
    )
}
