//! VAPID application server identification (RFC 8292).
//!
//! The signer holds one P-256 key pair for the lifetime of the process and
//! mints short-lived ES256 JWTs, one per push service origin.

use super::{CryptoError, CryptoResult};
use crate::delivery::config::{ConfigurationError, DEFAULT_TOKEN_LIFETIME, MAX_TOKEN_LIFETIME};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey, signature::Signer};
use p256::elliptic_curve::rand_core::OsRng;
use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Length of the raw P-256 private scalar.
const PRIVATE_KEY_LENGTH: usize = 32;

/// P-256 key pair identifying this application server to push services.
///
/// The private key is the raw 32-byte scalar and the public key is the
/// 65-byte uncompressed SEC1 point, both exchanged as unpadded base64url.
/// The public key is what browsers receive as `applicationServerKey`.
#[derive(Clone)]
pub struct VapidKeyPair {
    signing_key: SigningKey,
    public_key: String,
}

impl VapidKeyPair {
    /// Generates a fresh key pair.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Loads a key pair from its base64url encodings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidVapidKey`] when either value is
    /// not base64url, the private key is not a valid P-256 scalar, or the
    /// public key does not belong to the private key.
    pub fn from_base64url(public_key: &str, private_key: &str) -> Result<Self, ConfigurationError> {
        let private_bytes = decode(private_key, "private key")?;
        if private_bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(ConfigurationError::InvalidVapidKey(format!(
                "private key must be a {PRIVATE_KEY_LENGTH}-byte P-256 scalar, got {} bytes",
                private_bytes.len()
            )));
        }
        let signing_key = SigningKey::from_slice(&private_bytes).map_err(|_| {
            ConfigurationError::InvalidVapidKey("private key is not a valid P-256 scalar".to_owned())
        })?;

        let public_bytes = decode(public_key, "public key")?;
        let derived = signing_key.verifying_key().to_encoded_point(false);
        if derived.as_bytes() != public_bytes.as_slice() {
            return Err(ConfigurationError::InvalidVapidKey(
                "public key does not match private key".to_owned(),
            ));
        }

        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let point = signing_key.verifying_key().to_encoded_point(false);
        let public_key = BASE64URL.encode(point.as_bytes());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Returns the uncompressed public key as unpadded base64url.
    #[must_use]
    pub fn public_key_base64url(&self) -> &str {
        &self.public_key
    }

    /// Returns the raw private scalar as unpadded base64url, for
    /// provisioning the key into configuration.
    #[must_use]
    pub fn private_key_base64url(&self) -> String {
        BASE64URL.encode(self.signing_key.to_bytes())
    }

    /// Returns the key that verifies this pair's signatures.
    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for VapidKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidKeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Headers authenticating one push request to one push service origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VapidHeaders {
    audience: String,
    token: String,
    authorization: String,
    crypto_key: String,
    expires_at: DateTime<Utc>,
}

impl VapidHeaders {
    /// Returns the origin the token was issued for.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Returns the compact JWT.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the `Authorization` header value (`vapid t=.., k=..`).
    #[must_use]
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Returns the `Crypto-Key` header value (`p256ecdsa=..`).
    #[must_use]
    pub fn crypto_key(&self) -> &str {
        &self.crypto_key
    }

    /// Returns the `exp` claim.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Serialize)]
struct JwtHeader {
    typ: &'static str,
    alg: &'static str,
}

const ES256_HEADER: JwtHeader = JwtHeader {
    typ: "JWT",
    alg: "ES256",
};

#[derive(Serialize)]
struct JwtClaims<'a> {
    aud: &'a str,
    exp: i64,
    sub: &'a str,
}

/// Mints VAPID credentials for push requests.
///
/// Construct once at startup and share behind an `Arc`; signing takes
/// `&self` and needs no locking.
#[derive(Debug, Clone)]
pub struct VapidSigner {
    keys: VapidKeyPair,
    subject: String,
    lifetime: TimeDelta,
}

impl VapidSigner {
    /// Creates a signer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSubject`] unless `subject` is a
    /// `mailto:` address or an `https:` URL, and
    /// [`ConfigurationError::InvalidTokenLifetime`] unless `lifetime` is
    /// positive and at most 24 hours.
    pub fn new(
        keys: VapidKeyPair,
        subject: impl Into<String>,
        lifetime: Duration,
    ) -> Result<Self, ConfigurationError> {
        let contact = validate_subject(subject.into())?;
        if lifetime.is_zero() || lifetime > MAX_TOKEN_LIFETIME {
            return Err(ConfigurationError::InvalidTokenLifetime {
                seconds: lifetime.as_secs(),
            });
        }
        let validity = TimeDelta::from_std(lifetime).map_err(|_| {
            ConfigurationError::InvalidTokenLifetime {
                seconds: lifetime.as_secs(),
            }
        })?;
        Ok(Self {
            keys,
            subject: contact,
            lifetime: validity,
        })
    }

    /// Creates a signer issuing 12-hour tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSubject`] for an unusable
    /// contact.
    pub fn with_default_lifetime(
        keys: VapidKeyPair,
        subject: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(keys, subject, DEFAULT_TOKEN_LIFETIME)
    }

    /// Returns the application server public key.
    #[must_use]
    pub fn public_key_base64url(&self) -> &str {
        self.keys.public_key_base64url()
    }

    /// Returns the key that verifies issued tokens.
    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.keys.verifying_key()
    }

    /// Returns the contact URI placed in the `sub` claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Signs a token for a push service origin.
    ///
    /// `audience` must be the `scheme://host[:port]` origin of the endpoint
    /// the token will be presented to.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] or [`CryptoError::Signing`]
    /// when the token cannot be produced.
    pub fn sign(&self, audience: &str, clock: &impl Clock) -> CryptoResult<VapidHeaders> {
        let expires_at = clock
            .utc()
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| CryptoError::Signing("token expiry is out of range".to_owned()))?;
        let claims = JwtClaims {
            aud: audience,
            exp: expires_at.timestamp(),
            sub: &self.subject,
        };

        let header_segment = encode_segment(&ES256_HEADER)?;
        let claims_segment = encode_segment(&claims)?;
        let signing_input = format!("{header_segment}.{claims_segment}");
        let signature: Signature = self
            .keys
            .signing_key
            .try_sign(signing_input.as_bytes())
            .map_err(|err| CryptoError::Signing(err.to_string()))?;
        let token = format!("{signing_input}.{}", BASE64URL.encode(signature.to_bytes()));

        let public_key = self.keys.public_key_base64url();
        Ok(VapidHeaders {
            audience: audience.to_owned(),
            authorization: format!("vapid t={token}, k={public_key}"),
            crypto_key: format!("p256ecdsa={public_key}"),
            token,
            expires_at,
        })
    }
}

fn encode_segment(value: &impl Serialize) -> CryptoResult<String> {
    serde_json::to_vec(value)
        .map(|json| BASE64URL.encode(json))
        .map_err(|err| CryptoError::Serialization(err.to_string()))
}

fn decode(value: &str, what: &str) -> Result<Vec<u8>, ConfigurationError> {
    BASE64URL
        .decode(value.trim().trim_end_matches('='))
        .map_err(|_| ConfigurationError::InvalidVapidKey(format!("{what} is not valid base64url")))
}

fn validate_subject(subject: String) -> Result<String, ConfigurationError> {
    let trimmed = subject.trim();
    let valid = trimmed.strip_prefix("mailto:").map_or_else(
        || {
            Url::parse(trimmed)
                .is_ok_and(|url| url.scheme() == "https" && url.host_str().is_some())
        },
        |address| address.contains('@'),
    );
    if valid {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigurationError::InvalidSubject(subject))
    }
}
