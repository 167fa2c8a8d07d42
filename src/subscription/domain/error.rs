//! Error types for subscription domain validation.

use thiserror::Error;

/// Errors returned while constructing subscription domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionDomainError {
    /// The endpoint is empty after trimming.
    #[error("push endpoint must not be empty")]
    EmptyEndpoint,

    /// The endpoint is not an absolute URL.
    #[error("push endpoint '{0}' is not an absolute URL")]
    MalformedEndpoint(String),

    /// The endpoint uses a scheme other than `http` or `https`.
    #[error("push endpoint scheme '{0}' is not supported, expected https")]
    UnsupportedScheme(String),

    /// The endpoint exceeds the storage limit.
    #[error("push endpoint exceeds {max} characters")]
    EndpointTooLong {
        /// Maximum accepted length.
        max: usize,
    },

    /// Key material is not valid unpadded base64url.
    #[error("{field} is not valid base64url")]
    InvalidEncoding {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The client public key is not an uncompressed P-256 point.
    #[error("client public key must be a 65-byte uncompressed P-256 point")]
    InvalidPublicKey,

    /// The client auth secret has the wrong length.
    #[error("client auth secret must be 16 bytes, got {0}")]
    InvalidAuthSecretLength(usize),
}
