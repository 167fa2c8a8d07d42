//! Subscriber registry for browser push endpoints.
//!
//! Persists one registration per push endpoint, binding the endpoint to the
//! browser's key material and owning identity. Re-subscribing the same
//! browser overwrites the stored keys rather than accumulating duplicates,
//! and registrations are deleted only on unsubscribe or when a delivery
//! attempt proves the endpoint dead. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
