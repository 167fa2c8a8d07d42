//! Unit tests for notification delivery.
//!
//! Organised by layer: configuration, cryptography, domain rules, and the
//! dispatch services with in-memory and mocked ports.
