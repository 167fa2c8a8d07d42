//! Per-recipient delivery outcomes and batch summaries.

use crate::subscription::domain::{PushEndpoint, SubscriptionId};
use serde::{Deserialize, Serialize};

/// Whether a failed delivery is worth attempting again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The endpoint no longer exists; the registration should be removed.
    Permanent,
    /// The attempt failed but the endpoint may still be valid.
    Transient,
}

/// Classified reason a single delivery did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    kind: FailureKind,
    reason: String,
}

impl DeliveryFailure {
    /// Creates a permanent failure.
    #[must_use]
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            reason: reason.into(),
        }
    }

    /// Creates a transient failure.
    #[must_use]
    pub fn transient(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            reason: reason.into(),
        }
    }

    /// Returns the failure kind.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns a human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "failure", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The push service accepted the message.
    Delivered,
    /// The attempt failed.
    Failed(DeliveryFailure),
}

/// Outcome of delivering to one registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    subscription_id: SubscriptionId,
    endpoint: PushEndpoint,
    status: DeliveryStatus,
}

impl DeliveryOutcome {
    /// Creates an outcome.
    #[must_use]
    pub const fn new(
        subscription_id: SubscriptionId,
        endpoint: PushEndpoint,
        status: DeliveryStatus,
    ) -> Self {
        Self {
            subscription_id,
            endpoint,
            status,
        }
    }

    /// Returns the registration the attempt targeted.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Returns the endpoint the attempt targeted.
    #[must_use]
    pub const fn endpoint(&self) -> &PushEndpoint {
        &self.endpoint
    }

    /// Returns the attempt status.
    #[must_use]
    pub const fn status(&self) -> &DeliveryStatus {
        &self.status
    }

    /// Returns `true` when the push service accepted the message.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self.status, DeliveryStatus::Delivered)
    }

    /// Returns `true` when the endpoint is known to be gone.
    #[must_use]
    pub fn is_permanent_failure(&self) -> bool {
        matches!(
            &self.status,
            DeliveryStatus::Failed(failure) if failure.kind() == FailureKind::Permanent
        )
    }
}

/// Counts returned to the dispatch caller.
///
/// Serialised as `{sent, failed, total}`; `pruned` is reported to logs and
/// Rust callers only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Deliveries accepted by the push service.
    pub sent: usize,
    /// Deliveries that failed for any reason.
    pub failed: usize,
    /// Registrations the request resolved to.
    pub total: usize,
    /// Registrations removed after permanent failures.
    #[serde(skip)]
    pub pruned: usize,
}

impl DispatchSummary {
    /// Summary of a dispatch to an empty audience.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            sent: 0,
            failed: 0,
            total: 0,
            pruned: 0,
        }
    }

    /// Builds a summary for `total` recipients from the outcomes that were
    /// collected.
    ///
    /// Recipients without an outcome, such as a task that panicked, count as
    /// failed.
    #[must_use]
    pub fn from_outcomes(total: usize, outcomes: &[DeliveryOutcome]) -> Self {
        let sent = outcomes
            .iter()
            .filter(|outcome| outcome.is_delivered())
            .count();
        Self {
            sent,
            failed: total.saturating_sub(sent),
            total,
            pruned: 0,
        }
    }

    /// Records how many registrations were pruned.
    #[must_use]
    pub const fn with_pruned(mut self, pruned: usize) -> Self {
        self.pruned = pruned;
        self
    }
}
