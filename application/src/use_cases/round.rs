//! Round execution protocol
//!
//! [`RoundConfig`] captures the per-round-type differences (tool access,
//! agent loop, revised-answer parsing, prompt construction) so that the two
//! execution strategies share a single point of dispatch instead of each
//! switching on the round type.

use async_trait::async_trait;
use chrono::NaiveDate;
use council_domain::parse::{critiques_for_model, parse_revised_answer};
use council_domain::{
    ModelResponse, ParticipantId, PromptTemplate, RoundKind, RoundRecord, ToolCallRecord,
};

use crate::error::RunError;
use crate::events::EventSender;

/// Inputs a round derives its prompts from
///
/// Contexts are built by the orchestrator from the most recent preceding
/// round of the appropriate kind.
#[derive(Debug, Clone, Default)]
pub struct RoundContext {
    pub initial_responses: Vec<ModelResponse>,
    pub critique_responses: Vec<ModelResponse>,
}

impl RoundContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_critique(initial_responses: Vec<ModelResponse>) -> Self {
        Self {
            initial_responses,
            critique_responses: Vec::new(),
        }
    }

    pub fn for_defense(
        initial_responses: Vec<ModelResponse>,
        critique_responses: Vec<ModelResponse>,
    ) -> Self {
        Self {
            initial_responses,
            critique_responses,
        }
    }
}

type PromptFn = Box<dyn Fn(&ParticipantId) -> String + Send + Sync>;

/// Static configuration of one round
pub struct RoundConfig {
    /// Whether participants get the tool schemas for this round
    pub uses_tools: bool,
    /// Whether tool-enabled turns run through the ReAct agent loop
    pub uses_react: bool,
    /// Whether responses are parsed for a revised answer
    pub has_revised_answer: bool,
    prompt: PromptFn,
}

impl RoundConfig {
    /// The phase prompt for one participant
    pub fn prompt_for(&self, model: &ParticipantId) -> String {
        (self.prompt)(model)
    }

    /// Assemble the recorded response for one completed turn
    pub fn build_response(
        &self,
        model: &ParticipantId,
        content: String,
        tool_calls_made: Vec<ToolCallRecord>,
    ) -> ModelResponse {
        let mut response =
            ModelResponse::new(model.clone(), content).with_tool_calls(tool_calls_made);
        if self.uses_react {
            response = response.with_reasoning();
        }
        if self.has_revised_answer {
            let revised = parse_revised_answer(&response.content);
            response = response.with_revised_answer(revised);
        }
        response
    }
}

/// Build the [`RoundConfig`] for a round type
///
/// Single factory consumed by both executors: initial and defense rounds use
/// tools (and the agent loop when ReAct is enabled), critique rounds use
/// neither, and only defense responses carry a revised answer.
pub fn build_round_config(
    kind: RoundKind,
    user_query: &str,
    ctx: &RoundContext,
    react_enabled: bool,
    today: NaiveDate,
) -> RoundConfig {
    match kind {
        RoundKind::Initial => {
            let prompt = PromptTemplate::initial(user_query, today);
            RoundConfig {
                uses_tools: true,
                uses_react: react_enabled,
                has_revised_answer: false,
                prompt: Box::new(move |_| prompt.clone()),
            }
        }
        RoundKind::Critique => {
            let responses_text = PromptTemplate::responses_for_critique(&ctx.initial_responses);
            let query = user_query.to_string();
            RoundConfig {
                uses_tools: false,
                uses_react: false,
                has_revised_answer: false,
                prompt: Box::new(move |model| {
                    PromptTemplate::critique(&query, &responses_text, model, today)
                }),
            }
        }
        RoundKind::Defense => {
            let query = user_query.to_string();
            let initial = ctx.initial_responses.clone();
            let critiques = ctx.critique_responses.clone();
            RoundConfig {
                uses_tools: true,
                uses_react: react_enabled,
                has_revised_answer: true,
                prompt: Box::new(move |model| {
                    let original = initial
                        .iter()
                        .find(|r| &r.model == model)
                        .map(|r| r.content.as_str())
                        .unwrap_or("");
                    let critiques_text = critiques_for_model(model, &critiques);
                    PromptTemplate::defense(&query, original, &critiques_text, today)
                }),
            }
        }
    }
}

/// Round execution strategy
///
/// Implementations emit participant-level events through `events` and close
/// the round with a `round_complete` event carrying the returned record.
/// Participant failures never fail the round; only cancellation does.
#[async_trait]
pub trait ExecuteRound: Send + Sync {
    async fn execute_round(
        &self,
        round_number: u32,
        kind: RoundKind,
        user_query: &str,
        ctx: &RoundContext,
        events: &EventSender,
    ) -> Result<RoundRecord, RunError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 2).expect("valid date")
    }

    fn ctx_with_rounds() -> RoundContext {
        RoundContext::for_defense(
            vec![
                ModelResponse::new("a/one".into(), "first answer"),
                ModelResponse::new("b/two".into(), "second answer"),
            ],
            vec![ModelResponse::new(
                "b/two".into(),
                "## Critique of one\nWeak reasoning.",
            )],
        )
    }

    #[test]
    fn test_initial_config_flags() {
        let config =
            build_round_config(RoundKind::Initial, "Q?", &RoundContext::empty(), true, today());
        assert!(config.uses_tools);
        assert!(config.uses_react);
        assert!(!config.has_revised_answer);
        assert!(config.prompt_for(&"a/one".into()).contains("Q?"));
    }

    #[test]
    fn test_critique_never_uses_react() {
        let ctx = RoundContext::for_critique(vec![ModelResponse::new("a/one".into(), "x")]);
        let config = build_round_config(RoundKind::Critique, "Q?", &ctx, true, today());
        assert!(!config.uses_tools);
        assert!(!config.uses_react);
    }

    #[test]
    fn test_defense_prompt_embeds_own_answer_and_critiques() {
        let config = build_round_config(RoundKind::Defense, "Q?", &ctx_with_rounds(), false, today());
        assert!(config.has_revised_answer);

        let prompt = config.prompt_for(&"a/one".into());
        assert!(prompt.contains("first answer"));
        assert!(prompt.contains("Weak reasoning."));
    }

    #[test]
    fn test_defense_prompt_for_absent_participant() {
        // A participant that missed the initial round still gets a prompt
        let config = build_round_config(RoundKind::Defense, "Q?", &ctx_with_rounds(), false, today());
        let prompt = config.prompt_for(&"c/three".into());
        assert!(prompt.contains("(No specific critiques were extracted for this model)"));
    }
}
