//! Sequential-streaming round executor
//!
//! Processes participants one at a time in submission order, forwarding
//! token, tool-call, and tool-result events as they happen. Tokens from
//! different participants never interleave: participant K+1 produces no
//! events until K has its terminal `model_complete` or `model_error`.

use std::sync::Arc;

use async_trait::async_trait;
use council_domain::{CouncilEvent, Message, ParticipantId, PromptTemplate, RoundKind, RoundRecord};
use tracing::{info, warn};

use crate::config::RunSettings;
use crate::error::RunError;
use crate::events::EventSender;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::tool_executor::ToolExecutorPort;

use super::react::react_loop;
use super::round::{build_round_config, ExecuteRound, RoundConfig, RoundContext};
use super::tool_loop::{stream_plain, stream_with_tools, TurnError, TurnOutcome};

/// Executes rounds one participant at a time with per-token streaming
pub struct SequentialRoundExecutor {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
    settings: RunSettings,
}

impl SequentialRoundExecutor {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolExecutorPort>,
        settings: RunSettings,
    ) -> Self {
        Self {
            gateway,
            tools,
            settings,
        }
    }

    async fn run_turn(
        &self,
        config: &RoundConfig,
        model: &ParticipantId,
        events: &EventSender,
    ) -> Result<TurnOutcome, TurnError> {
        let prompt = config.prompt_for(model);
        let timeout = self.settings.participant_timeout;

        if config.uses_react {
            let wrapped = PromptTemplate::react_wrap(&prompt, self.settings.today);
            react_loop(
                self.gateway.as_ref(),
                self.tools.as_ref(),
                model,
                wrapped,
                timeout,
                events,
            )
            .await
        } else if config.uses_tools {
            stream_with_tools(
                self.gateway.as_ref(),
                self.tools.as_ref(),
                model,
                vec![Message::user(prompt)],
                self.settings.max_tool_calls.streaming,
                timeout,
                events,
            )
            .await
        } else {
            let content = stream_plain(
                self.gateway.as_ref(),
                model,
                &[Message::user(prompt)],
                timeout,
                events,
            )
            .await?;
            Ok(TurnOutcome {
                content,
                tool_calls_made: Vec::new(),
            })
        }
    }
}

#[async_trait]
impl ExecuteRound for SequentialRoundExecutor {
    async fn execute_round(
        &self,
        round_number: u32,
        kind: RoundKind,
        user_query: &str,
        ctx: &RoundContext,
        events: &EventSender,
    ) -> Result<RoundRecord, RunError> {
        let config = build_round_config(
            kind,
            user_query,
            ctx,
            self.settings.use_react,
            self.settings.today,
        );
        info!(round_number, round = %kind, "executing round (sequential-streaming)");

        let timeout = self.settings.participant_timeout;
        let mut responses = Vec::new();

        for model in &self.settings.participants {
            events.emit(CouncilEvent::ModelStart {
                model: model.clone(),
            })?;

            let turn = tokio::time::timeout(timeout, self.run_turn(&config, model, events)).await;
            match turn {
                Ok(Ok(outcome)) if outcome.content.is_empty() => {
                    events.emit(CouncilEvent::ModelError {
                        model: model.clone(),
                        reason: "Model returned an empty response".to_string(),
                    })?;
                }
                Ok(Ok(outcome)) => {
                    let response =
                        config.build_response(model, outcome.content, outcome.tool_calls_made);
                    events.emit(CouncilEvent::ModelComplete {
                        model: model.clone(),
                        response: response.clone(),
                    })?;
                    responses.push(response);
                }
                Ok(Err(TurnError::Cancelled(_))) => return Err(RunError::Cancelled),
                Ok(Err(TurnError::Gateway(error))) => {
                    warn!(%model, %error, "participant failed");
                    events.emit(CouncilEvent::ModelError {
                        model: model.clone(),
                        reason: error.to_string(),
                    })?;
                }
                Err(_elapsed) => {
                    events.emit(CouncilEvent::ModelError {
                        model: model.clone(),
                        reason: format!("timeout after {}s", timeout.as_secs()),
                    })?;
                }
            }
        }

        let record = RoundRecord::new(round_number, kind, responses);
        events.emit(CouncilEvent::RoundComplete {
            round_number,
            round_type: kind,
            responses: record.responses.clone(),
        })?;
        Ok(record)
    }
}
