//! Dispatcher state

use crate::message::MessageId;

/// Reply dispatcher state.
///
/// There is no stored RESOLVED state: a resolution folds straight back to
/// `Idle` inside the transition that handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// Ready for the next submission
    #[default]
    Idle,

    /// One reply request outstanding; its placeholder id doubles as request id
    Sending { placeholder: MessageId },
}

impl DispatchState {
    pub fn is_sending(&self) -> bool {
        matches!(self, DispatchState::Sending { .. })
    }

    /// Placeholder of the outstanding request, if any
    pub fn outstanding(&self) -> Option<MessageId> {
        match self {
            DispatchState::Sending { placeholder } => Some(*placeholder),
            DispatchState::Idle => None,
        }
    }
}
