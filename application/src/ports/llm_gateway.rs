//! LLM Gateway port
//!
//! Defines the interface for communicating with the chat-completions
//! gateway. Implementations (adapters) live in the infrastructure layer.

use std::time::Duration;

use async_trait::async_trait;
use council_domain::{GatewayEvent, Message, ParticipantId, ToolCall, ToolSchema};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::DEFAULT_PARTICIPANT_TIMEOUT;

/// Errors that can occur during gateway operations
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Wall-clock deadline exceeded; the display form is the wire-visible
    /// reason string
    #[error("timeout after {0}s")]
    Timeout(u64),
}

/// One outbound chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: ParticipantId,
    /// Never empty
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
    pub timeout: Duration,
}

impl ChatRequest {
    pub fn new(model: ParticipantId, messages: Vec<Message>) -> Self {
        Self {
            model,
            messages,
            tools: Vec::new(),
            timeout: DEFAULT_PARTICIPANT_TIMEOUT,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A complete (non-streaming) assistant reply
///
/// An empty `content` is a valid reply; the failure contract maps empty
/// responses to `done{content: ""}`, never to an error.
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Handle for receiving streaming events from a gateway request
///
/// Wraps an `mpsc::Receiver<GatewayEvent>`. The producer guarantees exactly
/// one terminal event (`Done` or `Error`) per stream.
pub struct StreamHandle {
    receiver: mpsc::Receiver<GatewayEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<GatewayEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next stream event; `None` once the producer is gone
    pub async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.receiver.recv().await
    }

    /// Drain the stream, returning the final content
    ///
    /// Token chunks accumulate; a `Done` with non-empty content replaces the
    /// accumulation. If the channel closes without a terminal event the
    /// accumulated text is returned as-is.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut accumulated = String::new();
        while let Some(event) = self.next_event().await {
            match event {
                GatewayEvent::Token { content } => accumulated.push_str(&content),
                GatewayEvent::Done { content, .. } => {
                    if !content.is_empty() {
                        return Ok(content);
                    }
                    return Ok(accumulated);
                }
                GatewayEvent::Error { message } => {
                    return Err(GatewayError::RequestFailed(message));
                }
                _ => {}
            }
        }
        Ok(accumulated)
    }
}

/// Gateway for LLM communication
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// One request, one complete reply
    async fn query(&self, request: ChatRequest) -> Result<ChatReply, GatewayError>;

    /// One request, a lazy stream of events
    async fn open_stream(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_reason_string() {
        assert_eq!(GatewayError::Timeout(120).to_string(), "timeout after 120s");
    }

    #[tokio::test]
    async fn test_collect_text_prefers_done_content() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(GatewayEvent::Token {
            content: "par".into(),
        })
        .await
        .unwrap();
        tx.send(GatewayEvent::done("full text")).await.unwrap();
        drop(tx);

        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "full text");
    }

    #[tokio::test]
    async fn test_collect_text_accumulates_on_empty_done() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(GatewayEvent::Token { content: "a".into() })
            .await
            .unwrap();
        tx.send(GatewayEvent::Token { content: "b".into() })
            .await
            .unwrap();
        tx.send(GatewayEvent::done("")).await.unwrap();
        drop(tx);

        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "ab");
    }

    #[tokio::test]
    async fn test_collect_text_surfaces_stream_error() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(GatewayEvent::error("boom")).await.unwrap();
        drop(tx);

        assert!(StreamHandle::new(rx).collect_text().await.is_err());
    }
}
