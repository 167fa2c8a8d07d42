//! In-memory adapter implementations for testing and local runs.

mod directory;
mod transport;

pub use directory::InMemoryCallerDirectory;
pub use transport::{ScriptedPushTransport, ScriptedReply};
