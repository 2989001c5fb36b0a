//! "Assistant is composing" indicator
//!
//! Follows dispatcher state, but once shown it stays visible for at least
//! `min_visible` so a fast reply does not cause a flicker.

use crate::controller::ChatEvent;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default minimum time the indicator stays visible
pub const DEFAULT_MIN_VISIBLE: Duration = Duration::from_millis(800);

#[derive(Debug, Default)]
struct IndicatorState {
    sending: bool,
    shown_at: Option<Instant>,
    /// Bumped on every dispatcher change; a hide timer only fires for its own
    generation: u64,
}

impl IndicatorState {
    fn composing_at(&self, now: Instant, min_visible: Duration) -> bool {
        self.sending
            || self
                .shown_at
                .is_some_and(|shown| now.saturating_duration_since(shown) < min_visible)
    }
}

/// Clonable handle; clones share the same indicator
#[derive(Debug, Clone)]
pub struct TypingIndicator {
    state: Arc<Mutex<IndicatorState>>,
    min_visible: Duration,
    notify: broadcast::Sender<ChatEvent>,
    stopped: CancellationToken,
}

impl TypingIndicator {
    /// Flips are published as `ChatEvent::ComposingChanged` on `notify`
    pub fn new(min_visible: Duration, notify: broadcast::Sender<ChatEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(IndicatorState::default())),
            min_visible,
            notify,
            stopped: CancellationToken::new(),
        }
    }

    fn publish(&self, composing: bool) {
        tracing::trace!(composing, "Typing indicator changed");
        let _ = self.notify.send(ChatEvent::ComposingChanged { composing });
    }

    pub fn is_composing(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.composing_at(Instant::now(), self.min_visible)
    }

    /// Observe a dispatcher state change.
    ///
    /// Must be called from within a Tokio runtime: hiding may be deferred to
    /// a timer task.
    pub fn on_dispatch_state(&self, sending: bool) {
        if self.stopped.is_cancelled() {
            return;
        }

        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let was_composing = state.composing_at(now, self.min_visible);
        state.generation += 1;
        state.sending = sending;

        if sending {
            if !was_composing {
                state.shown_at = Some(now);
                self.publish(true);
            }
            return;
        }

        let Some(shown_at) = state.shown_at else {
            return;
        };
        let hide_at = shown_at + self.min_visible;
        if now >= hide_at {
            state.shown_at = None;
            if was_composing {
                self.publish(false);
            }
            return;
        }

        let generation = state.generation;
        drop(state);
        self.schedule_hide(hide_at, generation);
    }

    fn schedule_hide(&self, hide_at: Instant, generation: u64) {
        let indicator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = indicator.stopped.cancelled() => {}
                () = tokio::time::sleep_until(hide_at) => {
                    let mut state = indicator.state.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.generation == generation && !state.sending {
                        state.shown_at = None;
                        indicator.publish(false);
                    }
                }
            }
        });
    }

    /// Cancel any pending hide timer and force the indicator off. Idempotent.
    ///
    /// Subscribers that saw the indicator turn on are told it turned off.
    pub fn stop(&self) {
        if self.stopped.is_cancelled() {
            return;
        }
        self.stopped.cancel();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let was_composing = state.composing_at(Instant::now(), self.min_visible);
        state.generation += 1;
        state.sending = false;
        state.shown_at = None;
        if was_composing {
            self.publish(false);
        }
    }
}
