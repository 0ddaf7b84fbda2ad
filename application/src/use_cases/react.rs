//! ReAct agent loop
//!
//! Per-participant Thought/Action/Observation loop over a streaming
//! gateway session. Unlike native tool calling, the model's reasoning is
//! surfaced to the consumer as `thought`, `action`, and `observation`
//! events.

use std::time::Duration;

use council_domain::parse::{content_after_terminal, parse_react, ReactAction};
use council_domain::{CouncilEvent, Message, ParticipantId, ToolCallRecord};
use tracing::debug;

use crate::events::EventSender;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::tool_executor::ToolExecutorPort;

use super::tool_loop::{stream_plain, TurnError, TurnOutcome};

/// Reasoning-step cap declared in the ReAct wrapper prompt
pub const MAX_REACT_ITERATIONS: u32 = 3;

/// Run one participant through the ReAct loop
///
/// `prompt` must already be wrapped in the ReAct protocol. The loop streams
/// a step, parses it, executes `search_web` actions, and terminates on
/// `respond()` — or on plain content with no recognized action. Exceeding
/// the iteration cap without a terminal action forces one final answer-now
/// request.
pub async fn react_loop(
    gateway: &dyn LlmGateway,
    tools: &dyn ToolExecutorPort,
    model: &ParticipantId,
    prompt: String,
    timeout: Duration,
    events: &EventSender,
) -> Result<TurnOutcome, TurnError> {
    let mut messages = vec![Message::user(prompt)];
    let mut tool_calls_made: Vec<ToolCallRecord> = Vec::new();

    for iteration in 0..MAX_REACT_ITERATIONS {
        let content = stream_plain(gateway, model, &messages, timeout, events).await?;
        let step = parse_react(&content);

        if let Some(thought) = &step.thought {
            events.emit(CouncilEvent::Thought {
                model: model.clone(),
                text: thought.clone(),
            })?;
        }

        match step.action {
            Some(action) if action.is_terminal() => {
                events.emit(CouncilEvent::Action {
                    model: model.clone(),
                    name: "respond".to_string(),
                    arg: None,
                })?;
                let answer = content_after_terminal(&content, &action)
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| content.clone());
                return Ok(TurnOutcome {
                    content: answer,
                    tool_calls_made,
                });
            }
            Some(ReactAction::SearchWeb(query)) => {
                debug!(%model, iteration, %query, "react search step");
                events.emit(CouncilEvent::Action {
                    model: model.clone(),
                    name: "search_web".to_string(),
                    arg: Some(query.clone()),
                })?;

                let args = serde_json::json!({ "query": query });
                events.emit(CouncilEvent::ToolCall {
                    model: Some(model.clone()),
                    name: "search_web".to_string(),
                    args: args.clone(),
                })?;
                let observation = tools.execute("search_web", &args).await;
                events.emit(CouncilEvent::ToolResult {
                    model: Some(model.clone()),
                    name: "search_web".to_string(),
                    result: observation.clone(),
                })?;
                events.emit(CouncilEvent::Observation {
                    model: model.clone(),
                    text: observation.clone(),
                })?;
                tool_calls_made.push(ToolCallRecord::new("search_web", args, &observation));

                messages.push(Message::assistant(content));
                messages.push(Message::user(format!(
                    "Observation: {observation}\n\nContinue your reasoning:"
                )));
            }
            // Plain content with no recognized action is a final answer
            Some(_) | None => {
                return Ok(TurnOutcome {
                    content,
                    tool_calls_made,
                });
            }
        }
    }

    // Cap exceeded without a terminal action: force one final respond pass
    debug!(%model, "react iteration cap reached, forcing final answer");
    messages.push(Message::user(
        "Please provide your final answer now (no Thought/Action format, just the answer):",
    ));
    let content = stream_plain(gateway, model, &messages, timeout, events).await?;
    Ok(TurnOutcome {
        content,
        tool_calls_made,
    })
}
