//! Pure state transition function
//!
//! Given the same state and event this always yields the same new state and
//! effects. No I/O happens here; the executor applies the effects.

use super::{DispatchState, Effect, Event};
use crate::message::MessageId;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DispatchState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DispatchState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A reply request is already in flight")]
    RequestInFlight,
    #[error("No outstanding request for placeholder {placeholder}")]
    StaleResolution { placeholder: MessageId },
}

/// Pure transition function
pub fn transition(
    state: &DispatchState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Idle + Submit -> Sending: echo the user message, reserve the reply slot
        (DispatchState::Idle, Event::Submit { user, placeholder }) => {
            let text = user.text.clone();
            let placeholder_id = placeholder.id;
            Ok(TransitionResult::new(DispatchState::Sending {
                placeholder: placeholder_id,
            })
            .with_effect(Effect::Append(user))
            .with_effect(Effect::Append(placeholder))
            .with_effect(Effect::RequestReply {
                placeholder: placeholder_id,
                text,
            }))
        }

        // One outstanding request per session
        (DispatchState::Sending { .. }, Event::Submit { .. }) => {
            Err(TransitionError::RequestInFlight)
        }

        // Sending + ReplyReceived -> Idle
        (DispatchState::Sending { placeholder }, Event::ReplyReceived { placeholder: id, text })
            if *placeholder == id =>
        {
            Ok(TransitionResult::new(DispatchState::Idle).with_effect(Effect::deliver(id, text)))
        }

        // Sending + ReplyFailed -> Idle, terminal FAILED with the fallback text
        (DispatchState::Sending { placeholder }, Event::ReplyFailed { placeholder: id, .. })
            if *placeholder == id =>
        {
            Ok(TransitionResult::new(DispatchState::Idle).with_effect(Effect::fail(id)))
        }

        // Resolutions for anything but the outstanding request are dropped
        (_, Event::ReplyReceived { placeholder, .. } | Event::ReplyFailed { placeholder, .. }) => {
            Err(TransitionError::StaleResolution { placeholder })
        }

        (DispatchState::Sending { placeholder }, Event::Cancel) => {
            Ok(TransitionResult::new(DispatchState::Idle).with_effect(Effect::AbortRequest {
                placeholder: *placeholder,
            }))
        }

        (DispatchState::Idle, Event::Cancel) => Ok(TransitionResult::new(DispatchState::Idle)),
    }
}
