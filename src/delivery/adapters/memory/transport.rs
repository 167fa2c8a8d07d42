//! Scripted push transport that records every request.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::delivery::ports::{PushRequest, PushResponse, PushTransport, PushTransportError};
use crate::subscription::domain::PushEndpoint;

/// Reply a [`ScriptedPushTransport`] gives for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Respond with an HTTP status.
    Status(u16),
    /// Fail as if the connection dropped.
    NetworkError,
    /// Fail as if the request timed out.
    Timeout,
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: HashMap<PushEndpoint, ScriptedReply>,
    requests: Vec<PushRequest>,
}

/// In-memory push transport with per-endpoint scripted replies.
///
/// Endpoints without a script receive `201 Created`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPushTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedPushTransport {
    /// Creates a transport that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the reply for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PushTransportError::Network`] when the lock is poisoned.
    pub fn reply_for(
        &self,
        endpoint: &PushEndpoint,
        reply: ScriptedReply,
    ) -> Result<(), PushTransportError> {
        let mut state = self.lock()?;
        state.replies.insert(endpoint.clone(), reply);
        Ok(())
    }

    /// Returns every request received so far, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`PushTransportError::Network`] when the lock is poisoned.
    pub fn requests(&self) -> Result<Vec<PushRequest>, PushTransportError> {
        Ok(self.lock()?.requests.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ScriptState>, PushTransportError> {
        self.state
            .lock()
            .map_err(|err| PushTransportError::network(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl PushTransport for ScriptedPushTransport {
    async fn deliver(&self, request: &PushRequest) -> Result<PushResponse, PushTransportError> {
        let mut state = self.lock()?;
        state.requests.push(request.clone());
        match state
            .replies
            .get(&request.endpoint)
            .copied()
            .unwrap_or(ScriptedReply::Status(201))
        {
            ScriptedReply::Status(status) => Ok(PushResponse::new(status)),
            ScriptedReply::NetworkError => Err(PushTransportError::network(
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            )),
            ScriptedReply::Timeout => Err(PushTransportError::Timeout),
        }
    }
}
