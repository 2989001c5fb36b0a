//! Reply-generation backends
//!
//! The conversation core reaches the reply engine through a single
//! request/response call. Everything behind it is out of scope here.

mod error;
mod http;

pub use error::{ReplyError, ReplyErrorKind};
pub use http::HttpReplyGenerator;

use crate::session::SessionId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A generated reply
#[allow(clippy::struct_field_names)] // mirrors the backend's `replyText` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub reply_text: String,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            reply_text: text.into(),
        }
    }
}

/// Turns one user message into reply text
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(&self, session_id: &SessionId, text: &str)
        -> Result<Reply, ReplyError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ReplyGenerator + ?Sized> ReplyGenerator for Arc<T> {
    async fn generate_reply(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<Reply, ReplyError> {
        (**self).generate_reply(session_id, text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for reply generators
pub struct LoggingGenerator {
    inner: Arc<dyn ReplyGenerator>,
    name: String,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn ReplyGenerator>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl ReplyGenerator for LoggingGenerator {
    async fn generate_reply(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<Reply, ReplyError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate_reply(session_id, text).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    backend = %self.name,
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    reply_chars = reply.reply_text.chars().count(),
                    "Reply generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    backend = %self.name,
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Reply generation failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Offline backend: always answers with the same line after a fixed delay
#[derive(Debug, Clone)]
pub struct CannedReplyGenerator {
    reply: String,
    delay: Duration,
}

/// What the demo bot says when no backend is configured
pub const DEFAULT_CANNED_REPLY: &str = "Yay! That's so cool 😃✨";

impl CannedReplyGenerator {
    pub fn new(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            reply: reply.into(),
            delay,
        }
    }
}

impl Default for CannedReplyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CANNED_REPLY, Duration::from_millis(800))
    }
}

#[async_trait]
impl ReplyGenerator for CannedReplyGenerator {
    async fn generate_reply(
        &self,
        _session_id: &SessionId,
        _text: &str,
    ) -> Result<Reply, ReplyError> {
        tokio::time::sleep(self.delay).await;
        Ok(Reply::new(self.reply.clone()))
    }

    fn name(&self) -> &str {
        "canned"
    }
}
