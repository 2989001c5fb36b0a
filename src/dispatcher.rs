//! Reply dispatcher
//!
//! Implements the Elm Architecture pattern: a pure transition function
//! decides the next state and effects, and `ReplyDispatcher` applies those
//! effects to the session's message store. At most one reply request is
//! outstanding at a time.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::DispatchState;
pub use transition::{transition, TransitionError, TransitionResult};

use crate::backend::ReplyGenerator;
use crate::message::MessageId;
use crate::session::SessionId;
use crate::store::{MessageStore, StoreChange, StoreError};
use std::time::Duration;
use thiserror::Error;

/// Shown in place of a reply whenever the backend fails
pub const FALLBACK_REPLY: &str =
    "Oops! I couldn't come up with a reply just now. Please try again.";

/// Default bound on one backend call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    pub fn is_request_in_flight(&self) -> bool {
        matches!(
            self,
            DispatchError::Transition(TransitionError::RequestInFlight)
        )
    }

    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            DispatchError::Transition(TransitionError::StaleResolution { .. })
        )
    }
}

/// One backend call to be issued by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub session_id: SessionId,
    pub placeholder: MessageId,
    pub text: String,
}

/// What applying one event did
#[derive(Debug, Default)]
pub struct Applied {
    /// Store mutations, in the order they happened
    pub changes: Vec<StoreChange>,
    /// Set when the transition asked for a backend call
    pub request: Option<ReplyRequest>,
}

/// Drives the dispatch state machine against a message store
#[derive(Debug, Default)]
pub struct ReplyDispatcher {
    state: DispatchState,
}

impl ReplyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state.is_sending()
    }

    /// Echo validated text into the store and reserve the reply slot.
    ///
    /// Both appends happen before this returns; the returned request must be
    /// issued by the caller exactly once.
    pub fn submit(
        &mut self,
        session_id: &SessionId,
        store: &mut MessageStore,
        text: impl Into<String>,
    ) -> Result<Applied, DispatchError> {
        self.apply(session_id, store, Event::submit(text))
    }

    /// Apply a backend resolution (`ReplyReceived` or `ReplyFailed`)
    pub fn resolve(
        &mut self,
        session_id: &SessionId,
        store: &mut MessageStore,
        event: Event,
    ) -> Result<Applied, DispatchError> {
        self.apply(session_id, store, event)
    }

    /// Abandon the outstanding request, if any. Its result will be stale.
    pub fn cancel(&mut self) -> Option<MessageId> {
        let outstanding = self.state.outstanding();
        match transition(&self.state, Event::Cancel) {
            Ok(result) => {
                self.state = result.new_state;
                for effect in result.effects {
                    if let Effect::AbortRequest { placeholder } = effect {
                        tracing::info!(%placeholder, "Reply request abandoned");
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "Cancel rejected"),
        }
        outstanding
    }

    fn apply(
        &mut self,
        session_id: &SessionId,
        store: &mut MessageStore,
        event: Event,
    ) -> Result<Applied, DispatchError> {
        let result = transition(&self.state, event)?;

        // Contract violations must leave both the store and the state untouched
        for effect in &result.effects {
            match effect {
                Effect::Append(message) => store.check_append(message)?,
                Effect::Resolve {
                    placeholder,
                    status,
                    ..
                } => store.check_update(*placeholder, *status)?,
                Effect::RequestReply { .. } | Effect::AbortRequest { .. } => {}
            }
        }

        let mut applied = Applied::default();
        for effect in result.effects {
            match effect {
                Effect::Append(message) => {
                    let id = store.append(message)?;
                    if let Some(stored) = store.get(id) {
                        applied.changes.push(StoreChange::Appended(stored.clone()));
                    }
                }
                Effect::RequestReply { placeholder, text } => {
                    applied.request = Some(ReplyRequest {
                        session_id: session_id.clone(),
                        placeholder,
                        text,
                    });
                }
                Effect::Resolve {
                    placeholder,
                    status,
                    text,
                } => {
                    let updated = store.update_status(placeholder, status, Some(text))?;
                    tracing::debug!(
                        session_id = %session_id,
                        message_id = %placeholder,
                        status = ?status,
                        "Placeholder resolved"
                    );
                    applied.changes.push(StoreChange::Updated(updated));
                }
                Effect::AbortRequest { placeholder } => {
                    tracing::info!(
                        session_id = %session_id,
                        %placeholder,
                        "Reply request abandoned"
                    );
                }
            }
        }

        self.state = result.new_state;
        Ok(applied)
    }
}

/// Issue one backend call, bounded by `timeout`, and fold its outcome into an event.
///
/// Errors and timeouts both become `ReplyFailed`; the cause is logged here
/// and only travels on as an opaque reason string.
pub async fn request_reply<G>(generator: &G, request: &ReplyRequest, timeout: Duration) -> Event
where
    G: ReplyGenerator + ?Sized,
{
    let placeholder = request.placeholder;
    let call = generator.generate_reply(&request.session_id, &request.text);

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(reply)) => Event::ReplyReceived {
            placeholder,
            text: reply.reply_text,
        },
        Ok(Err(e)) => {
            tracing::warn!(
                session_id = %request.session_id,
                %placeholder,
                kind = e.kind.as_str(),
                error = %e,
                "Reply request failed"
            );
            Event::ReplyFailed {
                placeholder,
                reason: e.to_string(),
            }
        }
        Err(_) => {
            tracing::warn!(
                session_id = %request.session_id,
                %placeholder,
                timeout_ms = %timeout.as_millis(),
                "Reply request timed out"
            );
            Event::ReplyFailed {
                placeholder,
                reason: format!("timed out after {}ms", timeout.as_millis()),
            }
        }
    }
}
