//! Round records and per-round responses

use serde::{Deserialize, Serialize};

use crate::chat::tool::ToolCallRecord;
use crate::core::participant::ParticipantId;

/// Kind of a debate round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    /// Each participant answers the question independently
    Initial,
    /// Each participant critiques the other participants' answers
    Critique,
    /// Each participant addresses critiques and revises its answer
    Defense,
}

impl RoundKind {
    pub fn label(&self) -> &'static str {
        match self {
            RoundKind::Initial => "initial",
            RoundKind::Critique => "critique",
            RoundKind::Defense => "defense",
        }
    }
}

impl std::fmt::Display for RoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One participant's output for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The participant that produced this response
    pub model: ParticipantId,
    /// Full response content
    pub content: String,
    /// Set when the response came out of a ReAct reasoning loop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoned: Option<bool>,
    /// Audit trail of the tool calls executed during this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls_made: Vec<ToolCallRecord>,
    /// Parsed revised answer — present exactly for defense responses,
    /// guaranteed non-empty by the parser fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_answer: Option<String>,
}

impl ModelResponse {
    pub fn new(model: ParticipantId, content: impl Into<String>) -> Self {
        Self {
            model,
            content: content.into(),
            reasoned: None,
            tool_calls_made: Vec::new(),
            revised_answer: None,
        }
    }

    pub fn with_reasoning(mut self) -> Self {
        self.reasoned = Some(true);
        self
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls_made = calls;
        self
    }

    pub fn with_revised_answer(mut self, revised: impl Into<String>) -> Self {
        self.revised_answer = Some(revised.into());
        self
    }

    /// The participant's effective answer: the revision when present,
    /// the full content otherwise
    pub fn answer(&self) -> &str {
        self.revised_answer.as_deref().unwrap_or(&self.content)
    }
}

/// A completed round: its number, kind, and responses in arrival order
///
/// Arrival order is completion order for the batch-parallel executor and
/// submission order for the sequential-streaming executor. Failed
/// participants are absent; they stay eligible for later rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u32,
    pub round_type: RoundKind,
    pub responses: Vec<ModelResponse>,
}

impl RoundRecord {
    pub fn new(round_number: u32, round_type: RoundKind, responses: Vec<ModelResponse>) -> Self {
        Self {
            round_number,
            round_type,
            responses,
        }
    }

    /// Participants present in this round
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.responses.iter().map(|r| &r.model)
    }

    /// Look up one participant's response
    pub fn response_for(&self, model: &ParticipantId) -> Option<&ModelResponse> {
        self.responses.iter().find(|r| &r.model == model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RoundKind::Initial).unwrap(),
            "\"initial\""
        );
        assert_eq!(
            serde_json::to_string(&RoundKind::Defense).unwrap(),
            "\"defense\""
        );
    }

    #[test]
    fn test_answer_prefers_revision() {
        let plain = ModelResponse::new("a/m1".into(), "original");
        assert_eq!(plain.answer(), "original");

        let revised = plain.clone().with_revised_answer("better");
        assert_eq!(revised.answer(), "better");
    }

    #[test]
    fn test_response_lookup() {
        let record = RoundRecord::new(
            1,
            RoundKind::Initial,
            vec![
                ModelResponse::new("a/m1".into(), "x"),
                ModelResponse::new("b/m2".into(), "y"),
            ],
        );
        assert_eq!(
            record.response_for(&"b/m2".into()).unwrap().content,
            "y"
        );
        assert!(record.response_for(&"c/m3".into()).is_none());
    }
}
