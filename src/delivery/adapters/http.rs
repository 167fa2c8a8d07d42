//! HTTP push transport backed by `reqwest`.

use crate::delivery::config::{ConfigurationError, DeliveryConfig};
use crate::delivery::ports::{PushRequest, PushResponse, PushTransport, PushTransportError};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use tracing::debug;

/// `Crypto-Key` header carrying the VAPID public key.
const CRYPTO_KEY: &str = "Crypto-Key";

/// `TTL` header (RFC 8030 §5.2).
const TTL: &str = "TTL";

/// `Urgency` header (RFC 8030 §5.3).
const URGENCY: &str = "Urgency";

/// Push transport POSTing encrypted messages over HTTPS.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpPushTransport {
    client: reqwest::Client,
}

impl HttpPushTransport {
    /// Creates a transport whose requests time out per `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSetting`] when the HTTP client
    /// cannot be built.
    pub fn new(config: &DeliveryConfig) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ConfigurationError::InvalidSetting {
                name: "http_client",
                reason: err.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Creates a transport from an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn deliver(&self, request: &PushRequest) -> Result<PushResponse, PushTransportError> {
        let response = self
            .client
            .post(request.endpoint.as_str())
            .header(AUTHORIZATION, request.vapid.authorization())
            .header(CRYPTO_KEY, request.vapid.crypto_key())
            .header(CONTENT_ENCODING, "aes128gcm")
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(TTL, request.ttl.as_secs().to_string())
            .header(URGENCY, request.urgency.as_str())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    PushTransportError::Timeout
                } else {
                    PushTransportError::network(err)
                }
            })?;

        let status = response.status().as_u16();
        debug!(
            endpoint_origin = %request.endpoint.origin(),
            status,
            "push service responded"
        );
        Ok(PushResponse::new(status))
    }
}
