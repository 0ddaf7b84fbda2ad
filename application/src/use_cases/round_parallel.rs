//! Batch-parallel round executor
//!
//! Launches every participant concurrently and yields results in completion
//! order. Per-participant timeouts are applied independently; one failure
//! never cancels the siblings.

use std::sync::Arc;

use async_trait::async_trait;
use council_domain::{CouncilEvent, Message, ParticipantId, PromptTemplate, RoundKind, RoundRecord};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::RunSettings;
use crate::error::RunError;
use crate::events::EventSender;
use crate::ports::llm_gateway::{ChatRequest, LlmGateway};
use crate::ports::tool_executor::ToolExecutorPort;

use super::react::react_loop;
use super::round::{build_round_config, ExecuteRound, RoundConfig, RoundContext};
use super::tool_loop::{query_with_tools, TurnError, TurnOutcome};

/// Executes rounds with all participants in flight at once
pub struct BatchRoundExecutor {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
    settings: RunSettings,
}

impl BatchRoundExecutor {
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
}

enum TurnResult {
    Completed(TurnOutcome),
    Failed(String),
    Cancelled,
}

/// One participant's turn under the round config
async fn run_turn(
    gateway: &dyn LlmGateway,
    tools: &dyn ToolExecutorPort,
    config: &RoundConfig,
    model: &ParticipantId,
    settings: &RunSettings,
    events: &EventSender,
) -> Result<TurnOutcome, TurnError> {
    let prompt = config.prompt_for(model);

    if config.uses_react {
        let wrapped = PromptTemplate::react_wrap(&prompt, settings.today);
        react_loop(
            gateway,
            tools,
            model,
            wrapped,
            settings.participant_timeout,
            events,
        )
        .await
    } else if config.uses_tools {
        query_with_tools(
            gateway,
            tools,
            model,
            vec![Message::user(prompt)],
            settings.max_tool_calls.non_streaming,
            settings.participant_timeout,
            events,
        )
        .await
    } else {
        let request = ChatRequest::new(model.clone(), vec![Message::user(prompt)])
            .with_timeout(settings.participant_timeout);
        let reply = gateway.query(request).await?;
        Ok(TurnOutcome {
            content: reply.content,
            tool_calls_made: Vec::new(),
        })
    }
}

#[async_trait]
impl ExecuteRound for BatchRoundExecutor {
    async fn execute_round(
        &self,
        round_number: u32,
        kind: RoundKind,
        user_query: &str,
        ctx: &RoundContext,
        events: &EventSender,
    ) -> Result<RoundRecord, RunError> {
        let config = Arc::new(build_round_config(
            kind,
            user_query,
            ctx,
            self.settings.use_react,
            self.settings.today,
        ));
        info!(round_number, round = %kind, "executing round (batch-parallel)");

        for model in &self.settings.participants {
            events.emit(CouncilEvent::ModelStart {
                model: model.clone(),
            })?;
        }

        let mut join_set = JoinSet::new();
        for model in self.settings.participants.clone() {
            let gateway = Arc::clone(&self.gateway);
            let tools = Arc::clone(&self.tools);
            let config = Arc::clone(&config);
            let settings = self.settings.clone();
            let events = events.clone();

            join_set.spawn(async move {
                let timeout = settings.participant_timeout;
                let turn = tokio::time::timeout(
                    timeout,
                    run_turn(
                        gateway.as_ref(),
                        tools.as_ref(),
                        &config,
                        &model,
                        &settings,
                        &events,
                    ),
                )
                .await;

                let result = match turn {
                    Ok(Ok(outcome)) if outcome.content.is_empty() => {
                        TurnResult::Failed("Model returned an empty response".to_string())
                    }
                    Ok(Ok(outcome)) => TurnResult::Completed(outcome),
                    Ok(Err(TurnError::Cancelled(_))) => TurnResult::Cancelled,
                    Ok(Err(TurnError::Gateway(error))) => TurnResult::Failed(error.to_string()),
                    Err(_elapsed) => {
                        TurnResult::Failed(format!("timeout after {}s", timeout.as_secs()))
                    }
                };
                (model, result)
            });
        }

        // A turn resolves to exactly one result, so each participant gets
        // exactly one of model_complete / model_error — a stream error can
        // never be followed by a spurious complete.
        let mut responses = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            let Ok((model, result)) = joined else {
                warn!("participant task failed to join");
                continue;
            };
            match result {
                TurnResult::Completed(outcome) => {
                    let response =
                        config.build_response(&model, outcome.content, outcome.tool_calls_made);
                    events.emit(CouncilEvent::ModelComplete {
                        model,
                        response: response.clone(),
                    })?;
                    responses.push(response);
                }
                TurnResult::Failed(reason) => {
                    warn!(%model, %reason, "participant failed");
                    events.emit(CouncilEvent::ModelError { model, reason })?;
                }
                TurnResult::Cancelled => return Err(RunError::Cancelled),
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
