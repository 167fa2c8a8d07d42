//! Domain model for push subscriber registrations.
//!
//! The subscription domain validates endpoints and client key material at
//! the boundary so that every stored registration can be encrypted to and
//! delivered to. All infrastructure concerns are kept outside the domain
//! boundary.

mod endpoint;
mod error;
mod ids;
mod keys;
mod registration;

pub use endpoint::PushEndpoint;
pub use error::SubscriptionDomainError;
pub use ids::{SubscriptionId, TenantId, UserId};
pub use keys::{AuthSecret, ClientPublicKey};
pub use registration::{PersistedSubscriptionData, RegistrationParams, SubscriberRegistration};
