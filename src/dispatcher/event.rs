//! Events that drive the dispatcher

use crate::message::{Message, MessageId};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit {
        /// The validated user message, already DELIVERED
        user: Message,
        /// Empty PENDING assistant message reserving the reply's position
        placeholder: Message,
    },

    // Backend events
    ReplyReceived {
        placeholder: MessageId,
        text: String,
    },
    ReplyFailed {
        placeholder: MessageId,
        /// Logged only; never shown to the user
        reason: String,
    },

    // Teardown
    Cancel,
}

impl Event {
    /// A submission of already-validated text, with fresh message ids
    pub fn submit(text: impl Into<String>) -> Self {
        Event::Submit {
            user: Message::user(text),
            placeholder: Message::placeholder(),
        }
    }
}
