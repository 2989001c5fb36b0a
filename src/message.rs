//! Transcript message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque message identifier, minted when the message is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// Delivery status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Assistant placeholder awaiting a reply
    Pending,
    Delivered,
    Failed,
}

impl MessageStatus {
    /// DELIVERED and FAILED admit no further transition
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Delivered | MessageStatus::Failed)
    }

    /// Whether `next` is reachable from `self`
    pub fn can_become(self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (
                MessageStatus::Pending,
                MessageStatus::Delivered | MessageStatus::Failed
            )
        )
    }
}

/// One entry in a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A user message; delivered as soon as it is appended locally
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            sender: Sender::User,
            status: MessageStatus::Delivered,
            created_at: Utc::now(),
        }
    }

    /// An empty assistant message reserving the reply's transcript position
    pub fn placeholder() -> Self {
        Self {
            id: MessageId::new(),
            text: String::new(),
            sender: Sender::Assistant,
            status: MessageStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Only assistant messages may be PENDING
    pub fn has_legal_state(&self) -> bool {
        !(self.sender == Sender::User && self.status == MessageStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(MessageStatus::Pending.can_become(MessageStatus::Delivered));
        assert!(MessageStatus::Pending.can_become(MessageStatus::Failed));
        assert!(!MessageStatus::Pending.can_become(MessageStatus::Pending));
        assert!(!MessageStatus::Delivered.can_become(MessageStatus::Failed));
        assert!(!MessageStatus::Failed.can_become(MessageStatus::Delivered));
        assert!(MessageStatus::Failed.is_terminal());
        assert!(!MessageStatus::Pending.is_terminal());
    }

    #[test]
    fn test_constructors_mint_distinct_ids() {
        let a = Message::user("hi");
        let b = Message::placeholder();
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, MessageStatus::Delivered);
        assert_eq!(b.sender, Sender::Assistant);
        assert!(b.text.is_empty());
    }

    #[test]
    fn test_user_pending_is_illegal() {
        let mut msg = Message::user("hi");
        assert!(msg.has_legal_state());
        msg.status = MessageStatus::Pending;
        assert!(!msg.has_legal_state());
    }

    #[test]
    fn test_serializes_snake_case() {
        let msg = Message::placeholder();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["sender"], "assistant");
        assert_eq!(value["status"], "pending");
    }
}
