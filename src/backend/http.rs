//! JSON-over-HTTP reply backend

use super::{Reply, ReplyError, ReplyGenerator};
use crate::session::SessionId;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    session_id: &'a str,
    text: &'a str,
}

/// Posts `{sessionId, text}` to `{base_url}/chat` and reads `{replyText}` back
#[derive(Debug, Clone)]
pub struct HttpReplyGenerator {
    client: Client,
    endpoint: String,
}

impl HttpReplyGenerator {
    pub fn new(base_url: &str) -> Result<Self, ReplyError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ReplyError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_error(status: StatusCode, body: &str) -> ReplyError {
        match status.as_u16() {
            400..=499 => ReplyError::rejected(format!("Request rejected ({status}): {body}")),
            500..=599 => ReplyError::server(format!("Server error ({status}): {body}")),
            _ => ReplyError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    async fn generate_reply(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<Reply, ReplyError> {
        let request = ChatRequest {
            session_id: session_id.as_str(),
            text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReplyError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    ReplyError::network(format!("Connection failed: {e}"))
                } else {
                    ReplyError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReplyError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ReplyError::invalid_response(format!("Failed to parse response: {e} - body: {body}"))
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
