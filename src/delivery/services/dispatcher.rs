//! Single-recipient delivery and response classification.

use crate::delivery::{
    config::DEFAULT_REQUEST_TIMEOUT,
    crypto::VapidHeaders,
    domain::{DeliveryFailure, DeliveryOutcome, DeliveryStatus, Urgency},
    ports::{PushRequest, PushTransport, PushTransportError},
};
use crate::subscription::domain::SubscriberRegistration;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Maps a push service status to a delivery status.
///
/// 2xx is delivered. 404 and 410 mean the subscription is gone. Every other
/// status is transient: the endpoint may still be valid.
#[must_use]
pub fn classify_status(status: u16) -> DeliveryStatus {
    match status {
        200..=299 => DeliveryStatus::Delivered,
        404 | 410 => DeliveryStatus::Failed(DeliveryFailure::permanent(format!(
            "push service returned {status}"
        ))),
        _ => DeliveryStatus::Failed(DeliveryFailure::transient(format!(
            "push service returned {status}"
        ))),
    }
}

/// Delivers encrypted messages and classifies the result. Never retries.
///
/// A call that outlives the request timeout is abandoned and reported as a
/// transient failure.
pub struct DeliveryDispatcher<T>
where
    T: PushTransport,
{
    transport: Arc<T>,
    request_timeout: Duration,
}

impl<T> DeliveryDispatcher<T>
where
    T: PushTransport,
{
    /// Creates a dispatcher over a transport with the default timeout.
    #[must_use]
    pub const fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the deadline for each push service call.
    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Returns the deadline for each push service call.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Sends one encrypted body to a registration's endpoint.
    ///
    /// Failures are reported in the outcome, never as an error, so one
    /// recipient cannot abort a batch.
    pub async fn dispatch(
        &self,
        registration: &SubscriberRegistration,
        body: Vec<u8>,
        vapid: &VapidHeaders,
        ttl: Duration,
        urgency: Urgency,
    ) -> DeliveryOutcome {
        let request = PushRequest {
            endpoint: registration.endpoint().clone(),
            body,
            vapid: vapid.clone(),
            ttl,
            urgency,
        };

        let delivery = self.transport.deliver(&request);
        let status = match tokio::time::timeout(self.request_timeout, delivery).await {
            Ok(Ok(response)) => classify_status(response.status),
            Ok(Err(err)) => DeliveryStatus::Failed(DeliveryFailure::transient(err.to_string())),
            Err(_) => DeliveryStatus::Failed(DeliveryFailure::transient(
                PushTransportError::Timeout.to_string(),
            )),
        };

        match &status {
            DeliveryStatus::Delivered => debug!(
                subscription_id = %registration.id(),
                endpoint_origin = %registration.endpoint().origin(),
                "push message delivered"
            ),
            DeliveryStatus::Failed(failure) => warn!(
                subscription_id = %registration.id(),
                endpoint_origin = %registration.endpoint().origin(),
                kind = ?failure.kind(),
                reason = failure.reason(),
                "push message not delivered"
            ),
        }

        DeliveryOutcome::new(registration.id(), registration.endpoint().clone(), status)
    }
}
