//! Domain model for notification dispatch.
//!
//! Dispatch requests, audience authorization and per-recipient outcomes.
//! The types here are pure values; registry access, signing and transport
//! live behind ports and services.

mod audience;
mod error;
mod outcome;
mod request;

pub use audience::{AudienceQuery, CallerAuthority};
pub use error::{AudienceError, ParseUrgencyError, PayloadError};
pub use outcome::{
    DeliveryFailure, DeliveryOutcome, DeliveryStatus, DispatchSummary, FailureKind,
};
pub use request::{AudienceTarget, DispatchRequest, NotificationPayload, Urgency};
