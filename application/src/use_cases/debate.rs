//! Debate orchestration
//!
//! [`run_debate`] defines the round sequence exactly once — initial, then
//! `cycles` critique-defense pairs — and delegates execution to whatever
//! [`ExecuteRound`] strategy it is handed. [`RunDebateUseCase`] composes the
//! orchestrator with the reflection synthesizer into a full debate run.

use std::sync::Arc;

use council_domain::{
    CouncilEvent, DebateOutcome, DomainError, ModelResponse, PromptTemplate, Question,
    RoundKind, RoundRecord,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ExecutionStrategy, RunSettings};
use crate::error::RunError;
use crate::events::{EventSender, EventStream};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::tool_executor::ToolExecutorPort;

use super::reflection::{ReflectionSynthesizer, SynthesisError};
use super::round::{ExecuteRound, RoundContext};
use super::round_parallel::BatchRoundExecutor;
use super::round_streaming::SequentialRoundExecutor;

/// Run the debate round sequence against an execution strategy
///
/// Emits `round_start` before and relies on the executor for everything in
/// between (including the `round_complete`). Quorum is checked after initial
/// and defense rounds; losing it emits `error{quorum lost}` and aborts the
/// run before any synthesis. The terminal event is `debate_complete`.
pub async fn run_debate(
    user_query: &str,
    executor: &dyn ExecuteRound,
    cycles: u32,
    events: &EventSender,
) -> Result<Vec<RoundRecord>, RunError> {
    if cycles < 1 {
        return Err(DomainError::InvalidCycles(cycles).into());
    }

    // Initial, then N critique-defense pairs — a debate always ends on a
    // defense, never a dangling critique.
    let mut sequence = vec![(1u32, RoundKind::Initial)];
    let mut round_number = 2;
    for _ in 0..cycles {
        sequence.push((round_number, RoundKind::Critique));
        sequence.push((round_number + 1, RoundKind::Defense));
        round_number += 2;
    }

    let mut rounds: Vec<RoundRecord> = Vec::new();
    let mut initial_responses: Vec<ModelResponse> = Vec::new();
    let mut critique_responses: Vec<ModelResponse> = Vec::new();
    let mut current_responses: Vec<ModelResponse> = Vec::new();

    for (round_number, kind) in sequence {
        events.emit(CouncilEvent::RoundStart {
            round_number,
            round_type: kind,
        })?;

        // Context comes from the most recent preceding round of the
        // appropriate kind; a participant absent from one round stays
        // eligible for the next.
        let base = || {
            if current_responses.is_empty() {
                initial_responses.clone()
            } else {
                current_responses.clone()
            }
        };
        let ctx = match kind {
            RoundKind::Initial => RoundContext::empty(),
            RoundKind::Critique => RoundContext::for_critique(base()),
            RoundKind::Defense => {
                RoundContext::for_defense(base(), critique_responses.clone())
            }
        };

        let record = executor
            .execute_round(round_number, kind, user_query, &ctx, events)
            .await?;
        let responses = record.responses.clone();
        rounds.push(record);

        match kind {
            RoundKind::Initial => {
                initial_responses = responses;
                if initial_responses.len() < 2 {
                    warn!("quorum lost after initial round");
                    events.emit(CouncilEvent::Error {
                        message: "quorum lost".to_string(),
                    })?;
                    return Err(RunError::QuorumLost);
                }
            }
            RoundKind::Critique => critique_responses = responses,
            RoundKind::Defense => {
                current_responses = responses;
                if current_responses.len() < 2 {
                    warn!(round_number, "quorum lost after defense round");
                    events.emit(CouncilEvent::Error {
                        message: "quorum lost".to_string(),
                    })?;
                    return Err(RunError::QuorumLost);
                }
            }
        }
    }

    events.emit(CouncilEvent::DebateComplete {
        rounds: rounds.clone(),
    })?;
    Ok(rounds)
}

/// Input for a full debate run
#[derive(Debug, Clone)]
pub struct DebateInput {
    pub question: Question,
    pub settings: RunSettings,
    pub strategy: ExecutionStrategy,
    pub cancel: CancellationToken,
}

impl DebateInput {
    pub fn new(question: Question, settings: RunSettings) -> Self {
        Self {
            question,
            settings,
            strategy: ExecutionStrategy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Use case for running a complete debate (rounds + synthesis)
#[derive(Clone)]
pub struct RunDebateUseCase {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
}

impl RunDebateUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, tools: Arc<dyn ToolExecutorPort>) -> Self {
        Self { gateway, tools }
    }

    fn executor(&self, input: &DebateInput) -> Box<dyn ExecuteRound> {
        match input.strategy {
            ExecutionStrategy::BatchParallel => Box::new(BatchRoundExecutor::new(
                Arc::clone(&self.gateway),
                Arc::clone(&self.tools),
                input.settings.clone(),
            )),
            ExecutionStrategy::SequentialStreaming => Box::new(SequentialRoundExecutor::new(
                Arc::clone(&self.gateway),
                Arc::clone(&self.tools),
                input.settings.clone(),
            )),
        }
    }

    /// Execute the debate, emitting events through `events`
    pub async fn execute(
        &self,
        input: DebateInput,
        events: &EventSender,
    ) -> Result<DebateOutcome, RunError> {
        input.settings.validate()?;
        info!(
            participants = input.settings.participants.len(),
            cycles = input.settings.cycles,
            "starting debate"
        );

        let executor = self.executor(&input);
        let question = input.question.content();

        // Cancellation drops the in-flight round future, which aborts its
        // spawned participant tasks and their requests; nothing (in
        // particular no round_complete) is emitted afterwards.
        let rounds = tokio::select! {
            biased;
            _ = input.cancel.cancelled() => return Err(RunError::Cancelled),
            result = run_debate(question, executor.as_ref(), input.settings.cycles, events) => result?,
        };

        let synthesizer = ReflectionSynthesizer::new(Arc::clone(&self.gateway));
        let context = PromptTemplate::debate_context(question, &rounds);
        let synthesis = tokio::select! {
            biased;
            _ = input.cancel.cancelled() => return Err(RunError::Cancelled),
            result = synthesizer.synthesize(
                &input.settings.chairman,
                &context,
                input.settings.participant_timeout,
                input.settings.today,
                events,
            ) => result,
        };

        match synthesis {
            Ok(response) => Ok(DebateOutcome {
                rounds,
                synthesis: Some(response),
            }),
            Err(SynthesisError::Cancelled(_)) => Err(RunError::Cancelled),
            Err(error) => {
                // The transcript is still returned; the run just has no
                // synthesis event.
                warn!(%error, "synthesis failed");
                events.emit(CouncilEvent::Error {
                    message: error.to_string(),
                })?;
                Ok(DebateOutcome {
                    rounds,
                    synthesis: None,
                })
            }
        }
    }

    /// Spawn the debate as a task, returning the event stream and the
    /// outcome handle
    pub fn spawn(
        &self,
        input: DebateInput,
    ) -> (
        EventStream,
        tokio::task::JoinHandle<Result<DebateOutcome, RunError>>,
    ) {
        let (events, stream) = EventStream::channel();
        let this = self.clone();
        let handle = tokio::spawn(async move { this.execute(input, &events).await });
        (stream, handle)
    }
}
