//! Mock reply generators for testing
//!
//! These mocks enable dispatcher and controller tests without real I/O.

use crate::backend::{Reply, ReplyError, ReplyGenerator};
use crate::session::SessionId;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

type Outcome = Result<Reply, ReplyError>;

// ============================================================================
// Mock Reply Generator
// ============================================================================

/// Returns queued results in order and records every call
#[derive(Default)]
pub struct MockReplyGenerator {
    outcomes: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<(SessionId, String)>>,
}

impl MockReplyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Ok(Reply::new(text)));
    }

    pub fn queue_error(&self, error: ReplyError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<(SessionId, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn next_outcome(&self, session_id: &SessionId, text: &str) -> Outcome {
        self.calls
            .lock()
            .unwrap()
            .push((session_id.clone(), text.to_string()));
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ReplyError::network("No mock reply queued")))
    }
}

#[async_trait]
impl ReplyGenerator for MockReplyGenerator {
    async fn generate_reply(&self, session_id: &SessionId, text: &str) -> Outcome {
        self.next_outcome(session_id, text)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Delayed Mock Reply Generator (for timeout testing)
// ============================================================================

/// Mock generator that sleeps before answering
pub struct DelayedReplyGenerator {
    inner: MockReplyGenerator,
    delay: Duration,
}

impl DelayedReplyGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockReplyGenerator::new(),
            delay,
        }
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.inner.queue_reply(text);
    }
}

#[async_trait]
impl ReplyGenerator for DelayedReplyGenerator {
    async fn generate_reply(&self, session_id: &SessionId, text: &str) -> Outcome {
        let outcome = self.inner.next_outcome(session_id, text);
        tokio::time::sleep(self.delay).await;
        outcome
    }

    fn name(&self) -> &str {
        "delayed-mock"
    }
}

// ============================================================================
// Gated Mock Reply Generator (for race testing)
// ============================================================================

/// Each call waits until the test resolves the gate handed out by `gate()`
#[derive(Default)]
pub struct GatedReplyGenerator {
    gates: Mutex<VecDeque<oneshot::Receiver<Outcome>>>,
    calls: Mutex<Vec<(SessionId, String)>>,
    /// Notified when a call starts waiting on its gate
    pub request_started: Arc<Notify>,
}

impl GatedReplyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the outcome of the next call
    pub fn gate(&self) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn recorded_calls(&self) -> Vec<(SessionId, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyGenerator for GatedReplyGenerator {
    async fn generate_reply(&self, session_id: &SessionId, text: &str) -> Outcome {
        self.calls
            .lock()
            .unwrap()
            .push((session_id.clone(), text.to_string()));
        let gate = self.gates.lock().unwrap().pop_front();
        self.request_started.notify_one();

        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ReplyError::network("Gate dropped"))),
            None => Err(ReplyError::network("No gate reserved")),
        }
    }

    fn name(&self) -> &str {
        "gated-mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ReplyErrorKind;

    #[tokio::test]
    async fn test_mock_replays_queue_in_order() {
        let mock = MockReplyGenerator::new();
        mock.queue_reply("first");
        mock.queue_error(ReplyError::server("second"));
        let session = SessionId::new();

        assert_eq!(
            mock.generate_reply(&session, "a").await.unwrap().reply_text,
            "first"
        );
        assert_eq!(
            mock.generate_reply(&session, "b").await.unwrap_err().kind,
            ReplyErrorKind::Server
        );
        assert_eq!(
            mock.generate_reply(&session, "c").await.unwrap_err().kind,
            ReplyErrorKind::Network
        );
        assert_eq!(mock.recorded_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_gated_waits_for_release() {
        let gated = Arc::new(GatedReplyGenerator::new());
        let gate = gated.gate();

        let task = {
            let gated = Arc::clone(&gated);
            tokio::spawn(async move { gated.generate_reply(&SessionId::new(), "hi").await })
        };
        gated.request_started.notified().await;
        assert!(!task.is_finished());

        gate.send(Ok(Reply::new("released"))).unwrap();
        assert_eq!(task.await.unwrap().unwrap().reply_text, "released");
    }
}
