//! Effects produced by state transitions

use crate::message::{Message, MessageId, MessageStatus};

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the end of the transcript
    Append(Message),

    /// Call the reply backend once for this placeholder
    RequestReply { placeholder: MessageId, text: String },

    /// Move the placeholder to a terminal status with its final text
    Resolve {
        placeholder: MessageId,
        status: MessageStatus,
        text: String,
    },

    /// Stop caring about the outstanding request; its result will be dropped
    AbortRequest { placeholder: MessageId },
}

impl Effect {
    pub fn deliver(placeholder: MessageId, text: String) -> Self {
        Effect::Resolve {
            placeholder,
            status: MessageStatus::Delivered,
            text,
        }
    }

    pub fn fail(placeholder: MessageId) -> Self {
        Effect::Resolve {
            placeholder,
            status: MessageStatus::Failed,
            text: super::FALLBACK_REPLY.to_string(),
        }
    }
}
