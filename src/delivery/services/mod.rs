//! Application services for notification delivery.

mod audience;
mod dispatcher;
mod notification;

pub use audience::{AudienceResolutionError, AudienceResolver};
pub use dispatcher::{DeliveryDispatcher, classify_status};
pub use notification::{NotificationError, NotificationResult, NotificationService};
