//! Append-only message log for one conversation session
//!
//! Display order is append order. `created_at` is only clamped to stay
//! non-decreasing and is never used for sorting.

use crate::message::{Message, MessageId, MessageStatus, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Contract violations. These indicate a caller bug, not a runtime condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid message state: {sender:?} message cannot be {status:?}")]
    InvalidMessageState {
        sender: Sender,
        status: MessageStatus,
    },
    #[error("Message id already in use: {0}")]
    DuplicateMessage(MessageId),
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),
    #[error("Illegal status transition for {id}: {from:?} -> {to:?}")]
    IllegalTransition {
        id: MessageId,
        from: MessageStatus,
        to: MessageStatus,
    },
}

/// A mutation applied to the store, reported for subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Appended(Message),
    Updated(Message),
}

/// Immutable, restartable view of the transcript at one point in time.
///
/// Holds shared handles to the messages, so it never sees later writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    messages: Arc<[Arc<Message>]>,
}

impl Snapshot {
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.messages.iter())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index).map(Arc::as_ref)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Message;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the messages of a `Snapshot`, in append order
#[derive(Debug, Clone)]
pub struct Iter<'a>(std::slice::Iter<'a, Arc<Message>>);

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Message;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Arc::as_ref)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Ordered, append-only log.
///
/// Writes are O(1) whether or not snapshots are held: an append pushes one
/// handle, and a status update copies at most the one message a snapshot
/// still shares.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Arc<Message>>,
    index: HashMap<MessageId, usize>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `message` would be accepted by `append`
    pub fn check_append(&self, message: &Message) -> Result<(), StoreError> {
        if !message.has_legal_state() {
            return Err(StoreError::InvalidMessageState {
                sender: message.sender,
                status: message.status,
            });
        }
        if self.index.contains_key(&message.id) {
            return Err(StoreError::DuplicateMessage(message.id));
        }
        Ok(())
    }

    /// Append to the end of the transcript and return the message's id
    pub fn append(&mut self, mut message: Message) -> Result<MessageId, StoreError> {
        self.check_append(&message)?;

        if let Some(last) = self.messages.last() {
            if message.created_at < last.created_at {
                message.created_at = last.created_at;
            }
        }

        let id = message.id;
        self.index.insert(id, self.messages.len());
        self.messages.push(Arc::new(message));
        Ok(id)
    }

    /// Check that `update_status(id, status, ..)` would be accepted
    pub fn check_update(&self, id: MessageId, status: MessageStatus) -> Result<(), StoreError> {
        self.updatable(id, status).map(|_| ())
    }

    fn updatable(&self, id: MessageId, status: MessageStatus) -> Result<usize, StoreError> {
        let position = *self
            .index
            .get(&id)
            .ok_or(StoreError::MessageNotFound(id))?;

        let current = self.messages[position].status;
        if !current.can_become(status) {
            return Err(StoreError::IllegalTransition {
                id,
                from: current,
                to: status,
            });
        }
        Ok(position)
    }

    /// Move a message to a terminal status, optionally replacing its text.
    ///
    /// Only PENDING -> DELIVERED and PENDING -> FAILED are legal.
    pub fn update_status(
        &mut self,
        id: MessageId,
        status: MessageStatus,
        text: Option<String>,
    ) -> Result<Message, StoreError> {
        let position = self.updatable(id, status)?;

        let message = Arc::make_mut(&mut self.messages[position]);
        message.status = status;
        if let Some(text) = text {
            message.text = text;
        }
        Ok(message.clone())
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.index
            .get(&id)
            .map(|&position| self.messages[position].as_ref())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Copies message handles, never message contents
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            messages: self.messages.iter().cloned().collect(),
        }
    }

    /// Number of assistant placeholders still awaiting a reply
    pub fn pending_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.status == MessageStatus::Pending)
            .count()
    }
}
