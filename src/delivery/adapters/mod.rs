//! Adapter implementations for delivery ports.

pub mod http;
pub mod memory;
