//! Validated push service endpoint.

use super::SubscriptionDomainError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum endpoint length, matching the `VARCHAR(2048)` column.
const MAX_ENDPOINT_LENGTH: usize = 2048;

/// Absolute URL of the push service resource for one browser instance.
///
/// The endpoint is the natural key of a registration. It is treated as a
/// bearer capability, so only [`PushEndpoint::origin`] should appear in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PushEndpoint(String);

impl PushEndpoint {
    /// Creates a validated endpoint.
    ///
    /// The input is trimmed and must parse as an absolute `https` (or, for
    /// local push service emulators, `http`) URL with a host.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionDomainError::EmptyEndpoint`],
    /// [`SubscriptionDomainError::EndpointTooLong`],
    /// [`SubscriptionDomainError::MalformedEndpoint`] or
    /// [`SubscriptionDomainError::UnsupportedScheme`].
    pub fn new(value: impl Into<String>) -> Result<Self, SubscriptionDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(SubscriptionDomainError::EmptyEndpoint);
        }
        if trimmed.len() > MAX_ENDPOINT_LENGTH {
            return Err(SubscriptionDomainError::EndpointTooLong {
                max: MAX_ENDPOINT_LENGTH,
            });
        }

        let url = Url::parse(trimmed)
            .map_err(|_| SubscriptionDomainError::MalformedEndpoint(raw.clone()))?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(SubscriptionDomainError::UnsupportedScheme(
                url.scheme().to_owned(),
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(SubscriptionDomainError::MalformedEndpoint(raw));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the endpoint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `scheme://host[:port]` origin of the push service.
    ///
    /// This is the audience a VAPID assertion must name.
    #[must_use]
    pub fn origin(&self) -> String {
        Url::parse(&self.0).map_or_else(
            |_| self.0.clone(),
            |url| url.origin().ascii_serialization(),
        )
    }
}

impl AsRef<str> for PushEndpoint {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PushEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PushEndpoint {
    type Error = SubscriptionDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PushEndpoint> for String {
    fn from(value: PushEndpoint) -> Self {
        value.0
    }
}
