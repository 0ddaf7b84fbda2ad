//! OpenRouter gateway client

use std::time::Duration;

use async_trait::async_trait;
use council_application::{ChatReply, ChatRequest, GatewayError, LlmGateway, StreamHandle};
use council_domain::GatewayEvent;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::protocol::{message_to_wire, ChatCompletionResponse};
use super::sse::SseDecoder;

/// LLM gateway implementation for OpenRouter-compatible chat-completions
/// endpoints
pub struct OpenRouterGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl OpenRouterGateway {
    /// Create a gateway against the given completions URL
    ///
    /// The underlying client applies a connect timeout only; per-request
    /// deadlines come from each [`ChatRequest`].
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
        })
    }

    /// Create a gateway over an existing shared client
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
        }
    }

    fn request_body(&self, request: &ChatRequest, stream: bool) -> serde_json::Value {
        let messages: Vec<serde_json::Value> =
            request.messages.iter().map(message_to_wire).collect();
        let mut body = json!({
            "model": request.model.as_str(),
            "messages": messages,
            "stream": stream,
        });
        if !request.tools.is_empty() {
            body["tools"] = request.tools.iter().map(|tool| tool.to_wire()).collect();
        }
        body
    }

    async fn post(&self, body: serde_json::Value) -> Result<reqwest::Response, GatewayError> {
        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "gateway returned {status}: {text}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmGateway for OpenRouterGateway {
    async fn query(&self, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        let deadline = request.timeout;
        let body = self.request_body(&request, false);
        debug!(model = %request.model, messages = request.messages.len(), "gateway query");

        let exchange = async {
            let response = self.post(body).await?;
            let parsed: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

            let choice = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| GatewayError::RequestFailed("response had no choices".into()))?;

            Ok(ChatReply {
                content: choice.message.content.unwrap_or_default(),
                tool_calls: choice
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| call.into_tool_call())
                    .collect(),
            })
        };

        tokio::time::timeout(deadline, exchange)
            .await
            .map_err(|_| GatewayError::Timeout(deadline.as_secs()))?
    }

    async fn open_stream(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
        let body = self.request_body(&request, true);
        debug!(model = %request.model, "gateway stream");

        let response = self.post(body).await?;
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(error) => {
                        warn!(%error, "stream transport error");
                        let _ = tx.send(GatewayEvent::error(error.to_string())).await;
                        return;
                    }
                };
                let Ok(text) = std::str::from_utf8(&chunk) else {
                    warn!("non-utf8 stream chunk skipped");
                    continue;
                };
                for event in decoder.push(text) {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                if decoder.is_finished() {
                    return;
                }
            }

            // Upstream closed without [DONE]; still guarantee one terminal
            if let Some(terminal) = decoder.finish() {
                let _ = tx.send(terminal).await;
            }
        });

        Ok(StreamHandle::new(rx))
    }
}
