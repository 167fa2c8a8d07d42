//! Port contracts for notification delivery.
//!
//! The identity port answers what a caller may address; the transport port
//! hands one encrypted message to a push service.

pub mod identity;
pub mod transport;

pub use identity::{CallerDirectory, CallerDirectoryError, CallerDirectoryResult};
pub use transport::{PushRequest, PushResponse, PushTransport, PushTransportError};

#[cfg(test)]
pub use identity::MockCallerDirectory;
#[cfg(test)]
pub use transport::MockPushTransport;
