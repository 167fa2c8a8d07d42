//! Web Push cryptography.
//!
//! - [`vapid`]: application server identification (RFC 8292)
//! - [`content_coding`]: `aes128gcm` message encryption (RFC 8291, RFC 8188)

pub mod content_coding;
mod error;
pub mod vapid;

pub use content_coding::{MAX_PLAINTEXT_LENGTH, decrypt, encrypt};
pub use error::{CryptoError, CryptoResult};
pub use vapid::{VapidHeaders, VapidKeyPair, VapidSigner};
