//! Conversation controller
//!
//! The only surface the rendering layer talks to. It owns the session, runs
//! submissions through validation and the dispatcher, issues the backend
//! call on a background task, and publishes every change as a `ChatEvent`.


use crate::backend::ReplyGenerator;
use crate::config::ChatConfig;
use crate::dispatcher::{self, DispatchError, Event, ReplyDispatcher, ReplyRequest};
use crate::message::Message;
use crate::session::{SessionId, SessionManager};
use crate::store::{Snapshot, StoreChange};
use crate::typing::TypingIndicator;
use crate::validator::{InputValidator, ValidationError};
use futures::Stream;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Pushed to subscribers on every store mutation and indicator flip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageAppended { message: Message },
    MessageUpdated { message: Message },
    ComposingChanged { composing: bool },
    InputRejected { reason: ValidationError },
}

impl From<StoreChange> for ChatEvent {
    fn from(change: StoreChange) -> Self {
        match change {
            StoreChange::Appended(message) => ChatEvent::MessageAppended { message },
            StoreChange::Updated(message) => ChatEvent::MessageUpdated { message },
        }
    }
}

/// Why a submission was not enqueued. Backend failures never show up here;
/// they become FAILED messages in the transcript.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("A reply is still being generated")]
    RequestInFlight,
    #[error("Conversation has been disposed")]
    Disposed,
    /// A broken store or dispatcher contract; indicates a bug
    #[error("Dispatcher contract violated: {0}")]
    Contract(DispatchError),
}

impl From<DispatchError> for SubmitError {
    fn from(e: DispatchError) -> Self {
        if e.is_request_in_flight() {
            SubmitError::RequestInFlight
        } else {
            SubmitError::Contract(e)
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    sessions: SessionManager,
    dispatcher: ReplyDispatcher,
}

/// Facade over one conversation session
pub struct ConversationController<G> {
    shared: Arc<Mutex<Shared>>,
    generator: Arc<G>,
    validator: InputValidator,
    request_timeout: Duration,
    typing: TypingIndicator,
    events: broadcast::Sender<ChatEvent>,
}

impl<G> ConversationController<G>
where
    G: ReplyGenerator + 'static,
{
    pub fn new(config: &ChatConfig, generator: G) -> Self {
        Self::with_validator(config, generator, config.validator())
    }

    /// Use a custom validator, e.g. one with a non-denylist content filter
    pub fn with_validator(config: &ChatConfig, generator: G, validator: InputValidator) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            generator: Arc::new(generator),
            validator,
            request_timeout: config.request_timeout,
            typing: TypingIndicator::new(config.min_visible, events.clone()),
            events,
        }
    }

    /// Validate and send one user message.
    ///
    /// Callers may ignore the result. On success the user message and a
    /// PENDING placeholder are already in the transcript when this returns.
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, raw: &str) -> Result<(), SubmitError> {
        let text = self.validator.validate(raw).map_err(|reason| {
            tracing::debug!(%reason, "Input rejected");
            let _ = self.events.send(ChatEvent::InputRejected { reason });
            reason
        })?;

        let (request, liveness) = {
            let mut shared = self.lock();
            let Shared {
                sessions,
                dispatcher,
            } = &mut *shared;
            let Some(session) = sessions.ensure() else {
                return Err(SubmitError::Disposed);
            };

            let applied = dispatcher
                .submit(&session.id, &mut session.store, text)
                .map_err(|e| {
                    if e.is_request_in_flight() {
                        tracing::debug!(
                            session_id = %session.id,
                            "Submit ignored, reply in flight"
                        );
                    } else {
                        tracing::error!(
                            session_id = %session.id,
                            error = %e,
                            "Submit broke dispatcher contract"
                        );
                    }
                    SubmitError::from(e)
                })?;

            publish(&self.events, applied.changes);
            self.typing.on_dispatch_state(dispatcher.is_sending());

            let Some(request) = applied.request else {
                tracing::error!(session_id = %session.id, "Submit produced no reply request");
                return Ok(());
            };
            (request, session.liveness())
        };

        self.spawn_reply(request, liveness);
        Ok(())
    }

    fn spawn_reply(&self, request: ReplyRequest, liveness: CancellationToken) {
        let shared = Arc::clone(&self.shared);
        let generator = Arc::clone(&self.generator);
        let typing = self.typing.clone();
        let events = self.events.clone();
        let timeout = self.request_timeout;

        tokio::spawn(async move {
            let event = tokio::select! {
                () = liveness.cancelled() => {
                    tracing::debug!(
                        session_id = %request.session_id,
                        placeholder = %request.placeholder,
                        "Session disposed, dropping reply request"
                    );
                    return;
                }
                event = dispatcher::request_reply(generator.as_ref(), &request, timeout) => event,
            };
            settle(&shared, &typing, &events, &liveness, event);
        });
    }

    /// A stream of `ChatEvent`s; lagged items are skipped
    pub fn updates(&self) -> impl Stream<Item = ChatEvent> + Send + 'static {
        BroadcastStream::new(self.events.subscribe()).filter_map(Result::ok)
    }
}

impl<G> ConversationController<G> {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The transcript as of now; empty before the first submission and after disposal
    pub fn snapshot(&self) -> Snapshot {
        self.lock()
            .sessions
            .active()
            .map(|session| session.store.snapshot())
            .unwrap_or_default()
    }

    pub fn is_composing(&self) -> bool {
        self.typing.is_composing()
    }

    /// True between dispatch and resolution of the outstanding reply request
    pub fn has_in_flight_request(&self) -> bool {
        self.lock().dispatcher.is_sending()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.lock()
            .sessions
            .active()
            .map(|session| session.id.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Cancel any in-flight reply, stop the indicator timer and discard the
    /// session. Safe to call any number of times.
    pub fn dispose(&self) {
        let mut shared = self.lock();
        let abandoned = shared.dispatcher.cancel();
        if let Some(session) = shared.sessions.teardown() {
            tracing::info!(
                session_id = %session.id,
                abandoned = ?abandoned,
                "Conversation disposed"
            );
        }
        drop(shared);
        self.typing.stop();
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().sessions.is_torn_down()
    }
}

impl<G> Drop for ConversationController<G> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn publish(events: &broadcast::Sender<ChatEvent>, changes: Vec<StoreChange>) {
    for change in changes {
        // No subscribers is fine; snapshots remain the source of truth
        let _ = events.send(change.into());
    }
}

/// Apply a backend resolution, unless the session went away meanwhile
fn settle(
    shared: &Mutex<Shared>,
    typing: &TypingIndicator,
    events: &broadcast::Sender<ChatEvent>,
    liveness: &CancellationToken,
    event: Event,
) {
    let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
    if liveness.is_cancelled() {
        tracing::debug!("Discarding reply for disposed session");
        return;
    }

    let Shared {
        sessions,
        dispatcher,
    } = &mut *shared;
    let Some(session) = sessions.active_mut() else {
        return;
    };

    match dispatcher.resolve(&session.id, &mut session.store, event) {
        Ok(applied) => publish(events, applied.changes),
        Err(e) if e.is_stale() => {
            tracing::debug!(session_id = %session.id, error = %e, "Ignoring stale reply");
        }
        Err(e) => {
            tracing::error!(session_id = %session.id, error = %e, "Failed to apply reply");
        }
    }
    typing.on_dispatch_state(dispatcher.is_sending());
}
