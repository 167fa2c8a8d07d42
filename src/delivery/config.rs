//! Delivery and VAPID configuration.
//!
//! Settings are plain structs with defaults. VAPID credentials are read from
//! the environment at startup; a missing or invalid credential is fatal and
//! surfaces as [`ConfigurationError`] before any notification is sent.

use super::crypto::{VapidKeyPair, VapidSigner};
use super::domain::Urgency;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the base64url VAPID public key.
pub const VAPID_PUBLIC_KEY_VAR: &str = "VAPID_PUBLIC_KEY";

/// Environment variable holding the base64url VAPID private key scalar.
pub const VAPID_PRIVATE_KEY_VAR: &str = "VAPID_PRIVATE_KEY";

/// Environment variable holding the VAPID contact URI.
pub const VAPID_SUBJECT_VAR: &str = "VAPID_SUBJECT";

/// Optional environment variable overriding the VAPID token lifetime.
pub const VAPID_TOKEN_LIFETIME_VAR: &str = "VAPID_TOKEN_LIFETIME_SECS";

/// Default VAPID token lifetime (12 hours).
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

/// Longest VAPID token lifetime push services accept (24 hours).
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default per-request deadline for push service calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required setting is absent.
    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    /// A setting is present but unusable.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The VAPID key pair cannot be loaded.
    #[error("invalid VAPID key: {0}")]
    InvalidVapidKey(String),

    /// The VAPID contact is neither a `mailto:` nor an `https:` URI.
    #[error("VAPID subject '{0}' must be a mailto: or https: URI")]
    InvalidSubject(String),

    /// The VAPID token lifetime is zero or longer than 24 hours.
    #[error("VAPID token lifetime of {seconds}s must be between 1s and 86400s")]
    InvalidTokenLifetime {
        /// Requested lifetime in seconds.
        seconds: u64,
    },
}

/// Tunables for notification fan-out.
///
/// # Examples
///
/// ```
/// use feebell::delivery::config::DeliveryConfig;
///
/// let config = DeliveryConfig::default().with_max_in_flight(8);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_in_flight, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Time-to-live sent when the request does not override it.
    pub default_ttl: Duration,
    /// Upper bound applied to any requested time-to-live.
    pub max_ttl: Duration,
    /// Urgency used by callers that do not choose one.
    pub default_urgency: Urgency,
    /// Maximum concurrent push requests per dispatch.
    pub max_in_flight: usize,
    /// Deadline for each push service call.
    ///
    /// The dispatcher enforces it for every transport; `HttpPushTransport`
    /// also applies it to its HTTP client.
    pub request_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(86_400), // 1 day
            max_ttl: Duration::from_secs(2_419_200), // 28 days
            default_urgency: Urgency::Normal,
            max_in_flight: 32,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DeliveryConfig {
    /// Sets the concurrency bound.
    #[must_use]
    pub const fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Sets the per-request HTTP timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Sets the default time-to-live.
    #[must_use]
    pub const fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSetting`] when `max_in_flight` or
    /// `request_timeout` is zero, or when `default_ttl` exceeds `max_ttl`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_in_flight == 0 {
            return Err(ConfigurationError::InvalidSetting {
                name: "max_in_flight",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigurationError::InvalidSetting {
                name: "request_timeout",
                reason: "must be positive".to_owned(),
            });
        }
        if self.default_ttl > self.max_ttl {
            return Err(ConfigurationError::InvalidSetting {
                name: "default_ttl",
                reason: format!("exceeds max_ttl of {}s", self.max_ttl.as_secs()),
            });
        }
        Ok(())
    }

    /// Resolves the time-to-live for a request, capped at `max_ttl`.
    #[must_use]
    pub fn effective_ttl(&self, requested: Option<Duration>) -> Duration {
        requested.unwrap_or(self.default_ttl).min(self.max_ttl)
    }
}

/// VAPID credentials and claims settings.
#[derive(Clone, PartialEq, Eq)]
pub struct VapidConfig {
    /// Base64url uncompressed P-256 public key.
    pub public_key: String,
    /// Base64url raw 32-byte private scalar.
    pub private_key: String,
    /// Contact URI placed in the `sub` claim.
    pub subject: String,
    /// Token validity window.
    pub token_lifetime: Duration,
}

impl fmt::Debug for VapidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("subject", &self.subject)
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

impl VapidConfig {
    /// Loads VAPID settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingSetting`] when a required
    /// variable is unset or blank, or
    /// [`ConfigurationError::InvalidSetting`] when the lifetime is not an
    /// integer.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads VAPID settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`VapidConfig::from_env`].
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigurationError::MissingSetting(name))
        };

        let public_key = required(VAPID_PUBLIC_KEY_VAR)?;
        let private_key = required(VAPID_PRIVATE_KEY_VAR)?;
        let subject = required(VAPID_SUBJECT_VAR)?;
        let token_lifetime = lookup(VAPID_TOKEN_LIFETIME_VAR)
            .map(|raw| parse_lifetime(&raw))
            .transpose()?
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(Self {
            public_key,
            private_key,
            subject,
            token_lifetime,
        })
    }

    /// Builds the signer these settings describe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidVapidKey`] when the keys do not
    /// form a P-256 pair, [`ConfigurationError::InvalidSubject`] or
    /// [`ConfigurationError::InvalidTokenLifetime`].
    pub fn into_signer(self) -> Result<VapidSigner, ConfigurationError> {
        let keys = VapidKeyPair::from_base64url(&self.public_key, &self.private_key)?;
        VapidSigner::new(keys, self.subject, self.token_lifetime)
    }
}

fn parse_lifetime(raw: &str) -> Result<Duration, ConfigurationError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|err| ConfigurationError::InvalidSetting {
            name: VAPID_TOKEN_LIFETIME_VAR,
            reason: err.to_string(),
        })
}
