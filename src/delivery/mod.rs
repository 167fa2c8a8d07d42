//! Notification delivery to browser push services.
//!
//! Resolves an authorized audience from the subscriber registry, encrypts
//! the payload separately for every recipient, authenticates each request
//! with a VAPID token for the recipient's push service, and fans the
//! messages out concurrently. Endpoints the push service reports as gone are
//! pruned from the registry once the batch completes.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Cryptography in [`crypto`]
//! - Orchestration services in [`services`]
//! - Settings in [`config`]

pub mod adapters;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
