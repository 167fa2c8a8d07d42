//! Feebell: browser push notification delivery.
//!
//! This crate registers browser push subscriptions and delivers encrypted
//! notifications to them through the vendors' Web Push services, pruning
//! subscriptions the services report as gone.
//!
//! # Architecture
//!
//! Feebell follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP, etc.)
//!
//! # Modules
//!
//! - [`subscription`]: Subscriber registry keyed by push endpoint
//! - [`delivery`]: Audience resolution, VAPID signing, payload encryption
//!   and concurrent dispatch

pub mod delivery;
pub mod subscription;
