//! Transport port delivering one encrypted message to a push service.

use crate::delivery::crypto::VapidHeaders;
use crate::delivery::domain::Urgency;
use crate::subscription::domain::PushEndpoint;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// One push message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// Push service resource to POST to.
    pub endpoint: PushEndpoint,
    /// `aes128gcm` encrypted body.
    pub body: Vec<u8>,
    /// VAPID credentials for the endpoint's origin.
    pub vapid: VapidHeaders,
    /// How long the push service may hold the message.
    pub ttl: Duration,
    /// Delivery urgency hint.
    pub urgency: Urgency,
}

/// Push service reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushResponse {
    /// HTTP status code.
    pub status: u16,
}

impl PushResponse {
    /// Creates a response with a status code.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self { status }
    }

    /// Returns `true` for a 2xx status.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Errors raised before a push service produced a status.
#[derive(Debug, Clone, Error)]
pub enum PushTransportError {
    /// The request did not complete within the configured timeout.
    #[error("push request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure.
    #[error("push request failed: {0}")]
    Network(Arc<dyn std::error::Error + Send + Sync>),
}

impl PushTransportError {
    /// Wraps a network error.
    pub fn network(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network(Arc::new(err))
    }
}

/// Sends push messages to push services.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// POSTs one message and returns the push service's status.
    ///
    /// Any HTTP status, including 4xx and 5xx, is a response rather than an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`PushTransportError`] when no status was received.
    async fn deliver(&self, request: &PushRequest) -> Result<PushResponse, PushTransportError>;
}
