//! Dispatch request value types.

use super::{ParseUrgencyError, PayloadError};
use crate::subscription::domain::{TenantId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Human-visible notification content delivered to the browser.
///
/// Serialised as JSON and encrypted per recipient. Optional fields are
/// omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    title: String,
    body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

impl NotificationPayload {
    /// Creates a payload with a title and body.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::EmptyTitle`] when the title is blank.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Result<Self, PayloadError> {
        let payload = Self {
            title: title.into().trim().to_owned(),
            body: body.into(),
            url: None,
            icon: None,
            tag: None,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Sets the URL opened when the notification is clicked.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the notification icon URL.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the tag used by the browser to collapse related notifications.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Checks the payload invariants.
    ///
    /// Deserialised payloads bypass [`NotificationPayload::new`], so the
    /// dispatch path calls this again.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::EmptyTitle`] when the title is blank.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.title.trim().is_empty() {
            return Err(PayloadError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the click-through URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns the icon URL.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Returns the collapse tag.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Serialises the payload to the JSON bytes that get encrypted.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when serialisation fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Audience selector of a dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AudienceTarget {
    /// Every registration owned by one user.
    Owner(UserId),
    /// Every registration belonging to one tenant.
    Tenant(TenantId),
    /// Every registration the caller may reach.
    Everyone,
}

impl fmt::Display for AudienceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner(owner_id) => write!(f, "owner {owner_id}"),
            Self::Tenant(tenant_id) => write!(f, "tenant {tenant_id}"),
            Self::Everyone => f.write_str("everyone"),
        }
    }
}

/// Delivery urgency hint forwarded to the push service (RFC 8030 §5.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// Deliver only when the device is on power and wi-fi.
    VeryLow,
    /// Deliver when the device is on power or wi-fi.
    Low,
    /// Deliver under normal conditions.
    #[default]
    Normal,
    /// Deliver immediately, even on low battery.
    High,
}

impl Urgency {
    /// Returns the `Urgency` header value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Urgency {
    type Error = ParseUrgencyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "very-low" => Ok(Self::VeryLow),
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(ParseUrgencyError(value.to_owned())),
        }
    }
}

/// A request to notify an audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    payload: NotificationPayload,
    target: Option<AudienceTarget>,
    urgency: Option<Urgency>,
    ttl: Option<Duration>,
}

impl DispatchRequest {
    /// Creates a request addressed to everyone the caller may reach.
    #[must_use]
    pub const fn new(payload: NotificationPayload) -> Self {
        Self {
            payload,
            target: None,
            urgency: None,
            ttl: None,
        }
    }

    /// Addresses the request to a specific audience.
    #[must_use]
    pub const fn with_target(mut self, target: AudienceTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the delivery urgency.
    #[must_use]
    pub const fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Overrides how long the push service may hold the message.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &NotificationPayload {
        &self.payload
    }

    /// Returns the requested audience; `None` means everyone.
    #[must_use]
    pub const fn target(&self) -> Option<AudienceTarget> {
        self.target
    }

    /// Returns the requested urgency; `None` defers to the configured default.
    #[must_use]
    pub const fn urgency(&self) -> Option<Urgency> {
        self.urgency
    }

    /// Returns the requested time-to-live, if overridden.
    #[must_use]
    pub const fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}
