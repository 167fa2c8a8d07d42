//! Client key material supplied by the subscribing browser.

use super::SubscriptionDomainError;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an uncompressed SEC1 P-256 point.
const PUBLIC_KEY_LENGTH: usize = 65;

/// Length of the subscription auth secret.
const AUTH_SECRET_LENGTH: usize = 16;

/// Uncompressed P-256 public key (`p256dh`) of the subscribing browser.
///
/// Validated to be a point on the curve, so every stored key can take part
/// in ECDH key agreement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientPublicKey([u8; PUBLIC_KEY_LENGTH]);

impl ClientPublicKey {
    /// Decodes a base64url `p256dh` value.
    ///
    /// Padded and unpadded encodings are both accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionDomainError::InvalidEncoding`] when the value is
    /// not base64url, or [`SubscriptionDomainError::InvalidPublicKey`] when it
    /// does not decode to an uncompressed point on P-256.
    pub fn from_base64url(value: &str) -> Result<Self, SubscriptionDomainError> {
        let bytes = decode_base64url(value, "client public key")?;
        Self::from_bytes(&bytes)
    }

    /// Validates raw SEC1 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionDomainError::InvalidPublicKey`] when the bytes
    /// are not an uncompressed point on P-256.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SubscriptionDomainError> {
        let point = <[u8; PUBLIC_KEY_LENGTH]>::try_from(bytes)
            .map_err(|_| SubscriptionDomainError::InvalidPublicKey)?;
        if point.first() != Some(&0x04) {
            return Err(SubscriptionDomainError::InvalidPublicKey);
        }
        p256::PublicKey::from_sec1_bytes(&point)
            .map_err(|_| SubscriptionDomainError::InvalidPublicKey)?;
        Ok(Self(point))
    }

    /// Returns the 65 raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Returns the key as unpadded base64url.
    #[must_use]
    pub fn to_base64url(&self) -> String {
        BASE64URL.encode(self.0)
    }
}

impl fmt::Debug for ClientPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientPublicKey")
            .field(&self.to_base64url())
            .finish()
    }
}

impl TryFrom<String> for ClientPublicKey {
    type Error = SubscriptionDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64url(&value)
    }
}

impl From<ClientPublicKey> for String {
    fn from(value: ClientPublicKey) -> Self {
        value.to_base64url()
    }
}

/// 16-byte authentication secret (`auth`) of the subscribing browser.
///
/// The secret binds message encryption to one subscription. It is redacted
/// from `Debug` output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthSecret([u8; AUTH_SECRET_LENGTH]);

impl AuthSecret {
    /// Decodes a base64url `auth` value.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionDomainError::InvalidEncoding`] when the value is
    /// not base64url, or
    /// [`SubscriptionDomainError::InvalidAuthSecretLength`] when it does not
    /// decode to exactly 16 bytes.
    pub fn from_base64url(value: &str) -> Result<Self, SubscriptionDomainError> {
        let bytes = decode_base64url(value, "client auth secret")?;
        Self::from_bytes(&bytes)
    }

    /// Validates raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionDomainError::InvalidAuthSecretLength`] when the
    /// slice is not exactly 16 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SubscriptionDomainError> {
        <[u8; AUTH_SECRET_LENGTH]>::try_from(bytes)
            .map(Self)
            .map_err(|_| SubscriptionDomainError::InvalidAuthSecretLength(bytes.len()))
    }

    /// Returns the 16 raw secret bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; AUTH_SECRET_LENGTH] {
        &self.0
    }

    /// Returns the secret as unpadded base64url.
    #[must_use]
    pub fn to_base64url(&self) -> String {
        BASE64URL.encode(self.0)
    }
}

impl fmt::Debug for AuthSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthSecret(..)")
    }
}

impl TryFrom<String> for AuthSecret {
    type Error = SubscriptionDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64url(&value)
    }
}

impl From<AuthSecret> for String {
    fn from(value: AuthSecret) -> Self {
        value.to_base64url()
    }
}

fn decode_base64url(value: &str, field: &'static str) -> Result<Vec<u8>, SubscriptionDomainError> {
    BASE64URL
        .decode(value.trim().trim_end_matches('='))
        .map_err(|_| SubscriptionDomainError::InvalidEncoding { field })
}
