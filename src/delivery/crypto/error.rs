//! Error types for push message cryptography.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised while signing or encrypting a push message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material is not a usable P-256 key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Plaintext does not fit a single 4096-byte record.
    #[error("plaintext is {size} bytes, limit is {max}")]
    PayloadTooLarge {
        /// Plaintext size in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        max: usize,
    },

    /// HKDF expansion failed.
    #[error("content key derivation failed")]
    KeyDerivation,

    /// AES-GCM sealing failed.
    #[error("content encryption failed")]
    Encryption,

    /// AES-GCM opening failed; the body was tampered with or keys differ.
    #[error("content decryption failed")]
    Decryption,

    /// The encrypted body does not follow the `aes128gcm` layout.
    #[error("malformed aes128gcm body: {0}")]
    MalformedBody(&'static str),

    /// ECDSA signing failed.
    #[error("VAPID signing failed: {0}")]
    Signing(String),

    /// JWT segment serialisation failed.
    #[error("VAPID claims serialisation failed: {0}")]
    Serialization(String),
}
