//! The council event protocol
//!
//! [`CouncilEvent`] is the engine's sole public output: every entrypoint
//! yields a stream of these, and the presenter (or any other consumer) is
//! total over the variant set. New variants may be added only additively.

use serde::{Deserialize, Serialize};

use crate::core::participant::ParticipantId;

use super::round::{ModelResponse, RoundKind, RoundRecord};

/// A typed event emitted during a council run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEvent {
    /// A round is about to execute
    RoundStart {
        round_number: u32,
        round_type: RoundKind,
    },
    /// A round finished; carries the completed record
    RoundComplete {
        round_number: u32,
        round_type: RoundKind,
        responses: Vec<ModelResponse>,
    },
    /// A participant's turn began
    ModelStart { model: ParticipantId },
    /// A participant's turn finished successfully
    ModelComplete {
        model: ParticipantId,
        response: ModelResponse,
    },
    /// A participant's turn failed; the participant stays eligible for
    /// later rounds
    ModelError {
        model: ParticipantId,
        reason: String,
    },
    /// A streamed text chunk; `model` is absent for synthesizer chunks when
    /// the producer chooses not to attribute them
    Token {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<ParticipantId>,
        content: String,
    },
    /// A tool invocation is being executed on a participant's behalf
    ToolCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<ParticipantId>,
        name: String,
        args: serde_json::Value,
    },
    /// A tool invocation produced its result
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<ParticipantId>,
        name: String,
        result: String,
    },
    /// A ReAct reasoning step
    Thought { model: ParticipantId, text: String },
    /// A ReAct action selection
    Action {
        model: ParticipantId,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arg: Option<String>,
    },
    /// A ReAct tool observation fed back to the model
    Observation { model: ParticipantId, text: String },
    /// The synthesizer's pre-synthesis analysis
    Reflection { text: String },
    /// The final synthesized answer
    Synthesis { model: ParticipantId, text: String },
    /// Terminal for debate runs: the full transcript
    DebateComplete { rounds: Vec<RoundRecord> },
    /// A fatal run-level failure
    Error { message: String },
}

impl CouncilEvent {
    /// Events that may legally close a run (at most one per run)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CouncilEvent::DebateComplete { .. }
                | CouncilEvent::Synthesis { .. }
                | CouncilEvent::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_match_protocol() {
        let event = CouncilEvent::RoundStart {
            round_number: 1,
            round_type: RoundKind::Initial,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "round_start");
        assert_eq!(json["round_type"], "initial");

        let event = CouncilEvent::ModelError {
            model: "a/m".into(),
            reason: "timeout after 120s".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "model_error");
    }

    #[test]
    fn test_unattributed_token_omits_model() {
        let event = CouncilEvent::Token {
            model: None,
            content: "x".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_terminal_events() {
        assert!(CouncilEvent::DebateComplete { rounds: vec![] }.is_terminal());
        assert!(
            CouncilEvent::Synthesis {
                model: "a/m".into(),
                text: "done".into()
            }
            .is_terminal()
        );
        assert!(
            CouncilEvent::Error {
                message: "quorum lost".into()
            }
            .is_terminal()
        );
        assert!(
            !CouncilEvent::ModelStart { model: "a/m".into() }.is_terminal()
        );
    }
}
