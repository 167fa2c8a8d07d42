//! Unit tests for the subscriber registry.
