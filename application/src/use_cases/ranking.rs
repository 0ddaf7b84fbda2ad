//! Ranking pipeline
//!
//! The alternative to the debate protocol: one initial round, anonymized
//! peer ranking, mean-position aggregation, then reflection synthesis.
//! Models rank the whole anonymized panel (their own response included —
//! they do not know the mapping); a participant that fails the ranking
//! stage simply contributes no evaluation.

use std::sync::Arc;

use council_domain::parse::parse_ranking;
use council_domain::{
    aggregate_rankings, assign_labels, CouncilEvent, Label, Message, ModelResponse,
    ParticipantId, PromptTemplate, Question, RankingOutcome, RankingRecord, RoundKind,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ExecutionStrategy, RunSettings};
use crate::error::RunError;
use crate::events::{EventSender, EventStream};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use crate::ports::tool_executor::ToolExecutorPort;

use super::reflection::{ReflectionSynthesizer, SynthesisError};
use super::round::{ExecuteRound, RoundContext};
use super::round_parallel::BatchRoundExecutor;
use super::round_streaming::SequentialRoundExecutor;

/// Input for a ranking run
#[derive(Debug, Clone)]
pub struct RankingInput {
    pub question: Question,
    pub settings: RunSettings,
    pub strategy: ExecutionStrategy,
    pub cancel: CancellationToken,
}

impl RankingInput {
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

/// Use case for the full ranking pipeline
#[derive(Clone)]
pub struct RunRankingUseCase {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
}

impl RunRankingUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, tools: Arc<dyn ToolExecutorPort>) -> Self {
        Self { gateway, tools }
    }

    fn executor(&self, input: &RankingInput) -> Box<dyn ExecuteRound> {
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

    /// Execute the pipeline, emitting events through `events`
    pub async fn execute(
        &self,
        input: RankingInput,
        events: &EventSender,
    ) -> Result<RankingOutcome, RunError> {
        input.settings.validate()?;
        info!(
            participants = input.settings.participants.len(),
            "starting ranking run"
        );

        let question = input.question.content();
        let executor = self.executor(&input);

        // Stage 1: one initial round
        events.emit(CouncilEvent::RoundStart {
            round_number: 1,
            round_type: RoundKind::Initial,
        })?;
        let empty_context = RoundContext::empty();
        let record = tokio::select! {
            biased;
            _ = input.cancel.cancelled() => return Err(RunError::Cancelled),
            result = executor.execute_round(1, RoundKind::Initial, question, &empty_context, events) => result?,
        };
        let stage1 = record.responses;

        if stage1.len() < 2 {
            warn!("quorum lost after stage 1");
            events.emit(CouncilEvent::Error {
                message: "quorum lost".to_string(),
            })?;
            return Err(RunError::QuorumLost);
        }

        // Stage 2: anonymize and collect peer rankings
        let label_to_model = assign_labels(&stage1);
        let stage2 = tokio::select! {
            biased;
            _ = input.cancel.cancelled() => return Err(RunError::Cancelled),
            result = self.collect_rankings(question, &stage1, &input.settings, events) => result?,
        };

        let aggregate = aggregate_rankings(&stage2, &label_to_model);

        // Stage 3: reflection synthesis over both stages
        let stage2_pairs: Vec<(ParticipantId, String)> = stage2
            .iter()
            .map(|r| (r.model.clone(), r.evaluation.clone()))
            .collect();
        let context = PromptTemplate::ranking_context(question, &stage1, &stage2_pairs);
        let synthesizer = ReflectionSynthesizer::new(Arc::clone(&self.gateway));
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

        let synthesis = match synthesis {
            Ok(response) => Some(response),
            Err(SynthesisError::Cancelled(_)) => return Err(RunError::Cancelled),
            Err(error) => {
                warn!(%error, "synthesis failed");
                events.emit(CouncilEvent::Error {
                    message: error.to_string(),
                })?;
                None
            }
        };

        Ok(RankingOutcome {
            stage1,
            stage2,
            synthesis,
            label_to_model,
            aggregate,
        })
    }

    /// Ask every participant for a peer ranking, concurrently
    async fn collect_rankings(
        &self,
        question: &str,
        stage1: &[ModelResponse],
        settings: &RunSettings,
        events: &EventSender,
    ) -> Result<Vec<RankingRecord>, RunError> {
        let labels = Label::alphabet(stage1.len());
        let labeled: Vec<(Label, &str)> = labels
            .iter()
            .copied()
            .zip(stage1.iter().map(|r| r.content.as_str()))
            .collect();
        let prompt = PromptTemplate::peer_rank(question, &labeled);

        let mut join_set = JoinSet::new();
        for model in settings.participants.clone() {
            events.emit(CouncilEvent::ModelStart {
                model: model.clone(),
            })?;

            let gateway = Arc::clone(&self.gateway);
            let request = ChatRequest::new(model.clone(), vec![Message::user(prompt.clone())])
                .with_timeout(settings.participant_timeout);
            let timeout = settings.participant_timeout;

            join_set.spawn(async move {
                let reply = tokio::time::timeout(timeout, gateway.query(request)).await;
                let result: Result<String, String> = match reply {
                    Ok(Ok(reply)) => Ok(reply.content),
                    Ok(Err(error)) => Err(error.to_string()),
                    Err(_elapsed) => {
                        Err(GatewayError::Timeout(timeout.as_secs()).to_string())
                    }
                };
                (model, result)
            });
        }

        let mut stage2 = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            let Ok((model, result)) = joined else {
                warn!("ranking task failed to join");
                continue;
            };
            match result {
                Ok(evaluation) => {
                    let parsed_order = parse_ranking(&evaluation);
                    let response = ModelResponse::new(model.clone(), evaluation.clone());
                    events.emit(CouncilEvent::ModelComplete {
                        model: model.clone(),
                        response,
                    })?;
                    stage2.push(RankingRecord::new(model, evaluation, parsed_order));
                }
                Err(reason) => {
                    warn!(%model, %reason, "ranking evaluation failed");
                    events.emit(CouncilEvent::ModelError { model, reason })?;
                }
            }
        }
        Ok(stage2)
    }

    /// Spawn the pipeline as a task, returning the event stream and the
    /// outcome handle
    pub fn spawn(
        &self,
        input: RankingInput,
    ) -> (
        EventStream,
        tokio::task::JoinHandle<Result<RankingOutcome, RunError>>,
    ) {
        let (events, stream) = EventStream::channel();
        let this = self.clone();
        let handle = tokio::spawn(async move { this.execute(input, &events).await });
        (stream, handle)
    }
}
