//! Application layer for the LLM council
//!
//! This crate contains the deliberation engine proper: port definitions for
//! the gateway and tool executor, the event plumbing, the native and ReAct
//! tool loops, the two round-execution strategies, the debate orchestrator,
//! the ranking pipeline, and the reflection synthesizer.
//! It depends only on the domain layer.

pub mod config;
pub mod error;
pub mod events;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ExecutionStrategy, RunSettings, ToolCallCaps};
pub use error::RunError;
pub use events::{ConsumerGone, EventSender, EventStream};
pub use ports::{
    llm_gateway::{ChatReply, ChatRequest, GatewayError, LlmGateway, StreamHandle},
    tool_executor::ToolExecutorPort,
};
pub use use_cases::{
    debate::{run_debate, DebateInput, RunDebateUseCase},
    ranking::{RankingInput, RunRankingUseCase},
    reflection::ReflectionSynthesizer,
    round::{build_round_config, ExecuteRound, RoundConfig, RoundContext},
    round_parallel::BatchRoundExecutor,
    round_streaming::SequentialRoundExecutor,
};
