//! Kivvy chat - conversational messaging core
//!
//! Turns free-text user input into an ordered transcript of a two-party
//! conversation, dispatches one reply request at a time to a reply backend,
//! and tracks the typing/sending/delivered/failed lifecycle.

// Library API surface; these only fire on exported items
#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod message;
pub mod session;
pub mod store;
pub mod typing;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    CannedReplyGenerator, HttpReplyGenerator, LoggingGenerator, Reply, ReplyError,
    ReplyErrorKind, ReplyGenerator,
};
pub use config::ChatConfig;
pub use controller::{ChatEvent, ConversationController, SubmitError};
pub use message::{Message, MessageId, MessageStatus, Sender};
pub use session::SessionId;
pub use store::Snapshot;
pub use validator::{ContentFilter, Denylist, InputValidator, ValidationError};
