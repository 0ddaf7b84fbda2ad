//! Shared test doubles: a scripted gateway and a recording tool executor.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use council_application::{
    ChatReply, ChatRequest, EventSender, EventStream, GatewayError, LlmGateway, RunSettings,
    StreamHandle, ToolExecutorPort,
};
use council_domain::{CouncilEvent, GatewayEvent, ParticipantId, ToolCall, ToolSchema};
use tokio::sync::mpsc;

/// One scripted gateway behavior, consumed in FIFO order per model
#[allow(dead_code)]
pub enum Script {
    /// Complete reply (non-streaming; streamed as a single `Done`)
    Reply(String),
    /// Reply carrying tool calls
    ReplyWithTools(String, Vec<ToolCall>),
    /// Reply after a delay, to force a completion order
    DelayedReply(Duration, String),
    /// Streamed events, sent verbatim
    Stream(Vec<GatewayEvent>),
    /// Fail the request up front
    Fail(String),
    /// Never resolve, to trigger timeouts
    Hang,
}

/// Gateway double that plays back per-model scripts
#[derive(Default)]
pub struct StubGateway {
    scripts: Mutex<HashMap<String, Vec<Script>>>,
}

#[allow(dead_code)]
impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, model: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push(script);
        self
    }

    fn take(&self, model: &ParticipantId) -> Script {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(model.as_str())
            .and_then(|queue| {
                if queue.is_empty() {
                    None
                } else {
                    Some(queue.remove(0))
                }
            })
            .unwrap_or_else(|| panic!("no script left for model {model}"))
    }
}

#[async_trait]
impl LlmGateway for StubGateway {
    async fn query(&self, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        match self.take(&request.model) {
            Script::Reply(content) => Ok(ChatReply {
                content,
                tool_calls: Vec::new(),
            }),
            Script::ReplyWithTools(content, tool_calls) => Ok(ChatReply {
                content,
                tool_calls,
            }),
            Script::DelayedReply(delay, content) => {
                tokio::time::sleep(delay).await;
                Ok(ChatReply {
                    content,
                    tool_calls: Vec::new(),
                })
            }
            Script::Fail(message) => Err(GatewayError::RequestFailed(message)),
            Script::Hang => std::future::pending().await,
            Script::Stream(events) => {
                // Collapse a stream script to its terminal content
                let mut content = String::new();
                for event in events {
                    match event {
                        GatewayEvent::Token { content: chunk } => content.push_str(&chunk),
                        GatewayEvent::Done { content: full, .. } if !full.is_empty() => {
                            content = full
                        }
                        _ => {}
                    }
                }
                Ok(ChatReply {
                    content,
                    tool_calls: Vec::new(),
                })
            }
        }
    }

    async fn open_stream(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
        let script = self.take(&request.model);
        let (tx, rx) = mpsc::channel(64);
        match script {
            Script::Stream(events) => {
                tokio::spawn(async move {
                    for event in events {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                });
            }
            Script::Reply(content) => {
                tokio::spawn(async move {
                    let _ = tx.send(GatewayEvent::done(content)).await;
                });
            }
            Script::DelayedReply(delay, content) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(GatewayEvent::done(content)).await;
                });
            }
            Script::Fail(message) => return Err(GatewayError::RequestFailed(message)),
            Script::Hang => std::future::pending().await,
            Script::ReplyWithTools(..) => {
                panic!("ReplyWithTools is a non-streaming script")
            }
        }
        Ok(StreamHandle::new(rx))
    }
}

/// Tool executor double that records every call
#[derive(Default)]
pub struct StubTools {
    pub calls: Mutex<Vec<(String, serde_json::Value)>>,
}

#[allow(dead_code)]
impl StubTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutorPort for StubTools {
    fn schemas(&self) -> Vec<ToolSchema> {
        vec![ToolSchema::new(
            "search_web",
            "Search the web for current information.",
            serde_json::json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"],
            }),
        )]
    }

    async fn execute(&self, name: &str, arguments: &serde_json::Value) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        format!(
            "[1] Stub result\nhttps://example.com\n{}",
            arguments["query"].as_str().unwrap_or("")
        )
    }
}

/// Fixed date so prompts are reproducible
#[allow(dead_code)]
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 2).expect("valid date")
}

/// Settings over the given panel with test-friendly timeouts
#[allow(dead_code)]
pub fn settings(participants: &[&str], chairman: &str) -> RunSettings {
    RunSettings::new(
        participants.iter().map(|m| (*m).into()).collect(),
        chairman.into(),
    )
    .with_timeout(Duration::from_secs(5))
    .with_today(fixed_today())
}

/// A connected sender/stream pair plus a collector task draining the stream
#[allow(dead_code)]
pub fn event_channel() -> (EventSender, tokio::task::JoinHandle<Vec<CouncilEvent>>) {
    let (tx, stream) = EventStream::channel();
    let collector = tokio::spawn(stream.collect());
    (tx, collector)
}

/// Types of events, for order assertions
#[allow(dead_code)]
pub fn event_tags(events: &[CouncilEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            CouncilEvent::RoundStart { .. } => "round_start",
            CouncilEvent::RoundComplete { .. } => "round_complete",
            CouncilEvent::ModelStart { .. } => "model_start",
            CouncilEvent::ModelComplete { .. } => "model_complete",
            CouncilEvent::ModelError { .. } => "model_error",
            CouncilEvent::Token { .. } => "token",
            CouncilEvent::ToolCall { .. } => "tool_call",
            CouncilEvent::ToolResult { .. } => "tool_result",
            CouncilEvent::Thought { .. } => "thought",
            CouncilEvent::Action { .. } => "action",
            CouncilEvent::Observation { .. } => "observation",
            CouncilEvent::Reflection { .. } => "reflection",
            CouncilEvent::Synthesis { .. } => "synthesis",
            CouncilEvent::DebateComplete { .. } => "debate_complete",
            CouncilEvent::Error { .. } => "error",
        })
        .collect()
}
