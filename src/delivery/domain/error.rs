//! Error types for delivery domain validation and audience authorization.

use super::AudienceTarget;
use thiserror::Error;

/// Errors raised while validating a notification payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The notification title is empty after trimming.
    #[error("notification title must not be empty")]
    EmptyTitle,

    /// The serialised payload does not fit a single encrypted record.
    #[error("notification payload is {size} bytes, limit is {max}")]
    TooLarge {
        /// Serialised payload size in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        max: usize,
    },
}

/// Errors raised when a caller addresses an audience outside its authority.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudienceError {
    /// The caller is not permitted to address the requested audience.
    #[error("caller is not authorized to notify {target}")]
    Unauthorized {
        /// The audience the caller asked for.
        target: AudienceTarget,
    },
}

/// Error returned while parsing an urgency level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown urgency: {0}")]
pub struct ParseUrgencyError(pub String);
