//! Session lifecycle
//!
//! A controller owns exactly one session over its lifetime. The session is
//! created lazily on first use and, once torn down, never comes back.

use crate::store::MessageStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Opaque session identifier passed to the reply backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One active conversation and its transcript
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub store: MessageStore,
    /// Cancelled on teardown; late results check it before touching the store
    liveness: CancellationToken,
}

impl Session {
    fn new() -> Self {
        Self {
            id: SessionId::new(),
            store: MessageStore::new(),
            liveness: CancellationToken::new(),
        }
    }

    /// A token that outstanding work can watch for teardown
    pub fn liveness(&self) -> CancellationToken {
        self.liveness.clone()
    }

    pub fn is_live(&self) -> bool {
        !self.liveness.is_cancelled()
    }
}

#[derive(Debug, Default)]
enum Lifecycle {
    #[default]
    NotStarted,
    Active(Session),
    TornDown,
}

/// Owns the lifecycle of the controller's single session
#[derive(Debug, Default)]
pub struct SessionManager {
    lifecycle: Lifecycle,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active session, creating it on first use. `None` once torn down.
    pub fn ensure(&mut self) -> Option<&mut Session> {
        if matches!(self.lifecycle, Lifecycle::NotStarted) {
            let session = Session::new();
            tracing::info!(session_id = %session.id, "Session created");
            self.lifecycle = Lifecycle::Active(session);
        }
        self.active_mut()
    }

    pub fn active(&self) -> Option<&Session> {
        match &self.lifecycle {
            Lifecycle::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        match &mut self.lifecycle {
            Lifecycle::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::TornDown)
    }

    /// Cancel the session's liveness token and discard its state.
    ///
    /// Returns the discarded session the first time; later calls are no-ops.
    pub fn teardown(&mut self) -> Option<Session> {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::TornDown) {
            Lifecycle::Active(session) => {
                session.liveness.cancel();
                tracing::info!(
                    session_id = %session.id,
                    messages = session.store.len(),
                    "Session torn down"
                );
                Some(session)
            }
            Lifecycle::NotStarted | Lifecycle::TornDown => None,
        }
    }
}
