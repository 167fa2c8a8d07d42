//! Adapter implementations for the subscription repository port.

pub mod memory;
pub mod postgres;
