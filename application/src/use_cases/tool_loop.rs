//! Native tool-calling loops
//!
//! Two forms of the same loop over the gateway port: non-streaming
//! (`query_with_tools`) and streaming with fragment reassembly
//! (`stream_with_tools`). Both follow the same contract:
//!
//! 1. Send the message list with the tool schemas attached.
//! 2. If the assistant reply contains tool calls, append the assistant
//!    message verbatim, execute each call in submission order, append each
//!    result as a `tool` message bound to its `tool_call_id`, and iterate.
//! 3. Terminate when the reply contains no tool calls, or once
//!    `max_tool_calls` execution rounds have run — the model always responds
//!    at least once, and a cap of zero returns the first reply verbatim.

use std::time::Duration;

use council_domain::{
    CouncilEvent, GatewayEvent, Message, ParticipantId, ToolCall, ToolCallAssembly,
    ToolCallRecord,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::{ConsumerGone, EventSender};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use crate::ports::tool_executor::ToolExecutorPort;

/// Result text returned to the model when its arguments cannot be decoded
pub const INVALID_ARGUMENTS: &str = "Error: invalid tool arguments";

/// Outcome of one complete participant turn
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    pub content: String,
    pub tool_calls_made: Vec<ToolCallRecord>,
}

/// Failure of one participant turn
///
/// Gateway failures stay scoped to the participant; a gone consumer aborts
/// the whole run.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Cancelled(#[from] ConsumerGone),
}

/// Non-streaming native tool loop
pub async fn query_with_tools(
    gateway: &dyn LlmGateway,
    tools: &dyn ToolExecutorPort,
    model: &ParticipantId,
    mut messages: Vec<Message>,
    max_tool_calls: u32,
    timeout: Duration,
    events: &EventSender,
) -> Result<TurnOutcome, TurnError> {
    let schemas = tools.schemas();
    let mut tool_calls_made = Vec::new();
    let mut executed_rounds = 0u32;

    loop {
        let request = ChatRequest::new(model.clone(), messages.clone())
            .with_tools(schemas.clone())
            .with_timeout(timeout);
        let reply = gateway.query(request).await?;

        if reply.tool_calls.is_empty() || executed_rounds >= max_tool_calls {
            if !reply.tool_calls.is_empty() {
                debug!(%model, "tool call cap reached, returning reply verbatim");
            }
            return Ok(TurnOutcome {
                content: reply.content,
                tool_calls_made,
            });
        }

        messages.push(Message::assistant_with_tool_calls(
            reply.content.clone(),
            reply.tool_calls.clone(),
        ));
        run_tool_calls(
            tools,
            model,
            &reply.tool_calls,
            &mut messages,
            &mut tool_calls_made,
            events,
        )
        .await?;
        executed_rounds += 1;
    }
}

/// Streaming native tool loop
///
/// Forwards token chunks as they arrive, reassembles tool-call fragments by
/// their delta index, and reopens the stream after each execution round.
/// When the cap is hit mid-stream the accumulated content still comes back
/// as a normal outcome.
pub async fn stream_with_tools(
    gateway: &dyn LlmGateway,
    tools: &dyn ToolExecutorPort,
    model: &ParticipantId,
    mut messages: Vec<Message>,
    max_tool_calls: u32,
    timeout: Duration,
    events: &EventSender,
) -> Result<TurnOutcome, TurnError> {
    let schemas = tools.schemas();
    let mut tool_calls_made = Vec::new();
    let mut executed_rounds = 0u32;

    loop {
        let request = ChatRequest::new(model.clone(), messages.clone())
            .with_tools(schemas.clone())
            .with_timeout(timeout);
        let mut handle = gateway.open_stream(request).await?;

        let mut assembly = ToolCallAssembly::new();
        let mut accumulated = String::new();
        let mut final_content: Option<String> = None;

        while let Some(event) = handle.next_event().await {
            match event {
                GatewayEvent::Token { content } => {
                    events.emit(CouncilEvent::Token {
                        model: Some(model.clone()),
                        content: content.clone(),
                    })?;
                    accumulated.push_str(&content);
                }
                GatewayEvent::ToolCallFragment {
                    index,
                    id,
                    name,
                    arguments,
                } => {
                    assembly.absorb(index, id.as_deref(), name.as_deref(), &arguments);
                }
                GatewayEvent::Done { content, .. } => {
                    final_content = Some(if content.is_empty() {
                        accumulated.clone()
                    } else {
                        content
                    });
                    break;
                }
                GatewayEvent::Error { message } => {
                    return Err(GatewayError::RequestFailed(message).into());
                }
                // Raw transport streams carry no tool results
                GatewayEvent::ToolResult { .. } => {}
            }
        }

        let content = final_content.unwrap_or(accumulated);
        let calls = assembly.finish();

        if calls.is_empty() || executed_rounds >= max_tool_calls {
            if !calls.is_empty() {
                debug!(%model, "tool call cap reached mid-stream");
            }
            return Ok(TurnOutcome {
                content,
                tool_calls_made,
            });
        }

        messages.push(Message::assistant_with_tool_calls(content, calls.clone()));
        run_tool_calls(
            tools,
            model,
            &calls,
            &mut messages,
            &mut tool_calls_made,
            events,
        )
        .await?;
        executed_rounds += 1;
    }
}

/// Plain streaming turn without tools, forwarding tokens to the consumer
pub async fn stream_plain(
    gateway: &dyn LlmGateway,
    model: &ParticipantId,
    messages: &[Message],
    timeout: Duration,
    events: &EventSender,
) -> Result<String, TurnError> {
    let request = ChatRequest::new(model.clone(), messages.to_vec()).with_timeout(timeout);
    let mut handle = gateway.open_stream(request).await?;

    let mut accumulated = String::new();
    while let Some(event) = handle.next_event().await {
        match event {
            GatewayEvent::Token { content } => {
                events.emit(CouncilEvent::Token {
                    model: Some(model.clone()),
                    content: content.clone(),
                })?;
                accumulated.push_str(&content);
            }
            GatewayEvent::Done { content, .. } => {
                if !content.is_empty() {
                    return Ok(content);
                }
                return Ok(accumulated);
            }
            GatewayEvent::Error { message } => {
                return Err(GatewayError::RequestFailed(message).into());
            }
            _ => {}
        }
    }
    Ok(accumulated)
}

/// Execute one batch of tool calls in submission order
///
/// Every requested call produces exactly one result message, including
/// calls whose arguments fail to decode.
async fn run_tool_calls(
    tools: &dyn ToolExecutorPort,
    model: &ParticipantId,
    calls: &[ToolCall],
    messages: &mut Vec<Message>,
    tool_calls_made: &mut Vec<ToolCallRecord>,
    events: &EventSender,
) -> Result<(), ConsumerGone> {
    for call in calls {
        let (args, result) = match call.parsed_arguments() {
            Ok(args) => {
                events.emit(CouncilEvent::ToolCall {
                    model: Some(model.clone()),
                    name: call.name.clone(),
                    args: args.clone(),
                })?;
                let result = tools.execute(&call.name, &args).await;
                (args, result)
            }
            Err(error) => {
                warn!(%model, tool = %call.name, %error, "undecodable tool arguments");
                events.emit(CouncilEvent::ToolCall {
                    model: Some(model.clone()),
                    name: call.name.clone(),
                    args: serde_json::Value::Null,
                })?;
                (serde_json::Value::Null, INVALID_ARGUMENTS.to_string())
            }
        };

        events.emit(CouncilEvent::ToolResult {
            model: Some(model.clone()),
            name: call.name.clone(),
            result: result.clone(),
        })?;
        tool_calls_made.push(ToolCallRecord::new(&call.name, args, &result));
        messages.push(Message::tool_result(&call.id, &call.name, result));
    }
    Ok(())
}
