//! Terminal run outcomes
//!
//! Returned by the use cases alongside the event stream, and serialized by
//! the conversation store in the persistence shapes consumed by external
//! storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::participant::ParticipantId;

use super::ranking::{AggregateEntry, Label, RankingRecord};
use super::round::{ModelResponse, RoundRecord};

/// Result of a debate run
///
/// `synthesis` is `None` only when the synthesizer failed; the transcript is
/// returned regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateOutcome {
    pub rounds: Vec<RoundRecord>,
    pub synthesis: Option<ModelResponse>,
}

impl DebateOutcome {
    /// Persistence shape: `{mode: "debate", rounds, synthesis}`
    pub fn to_stored(&self) -> serde_json::Value {
        serde_json::json!({
            "mode": "debate",
            "rounds": self.rounds,
            "synthesis": self.synthesis,
        })
    }
}

/// Result of a ranking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub stage1: Vec<ModelResponse>,
    pub stage2: Vec<RankingRecord>,
    pub synthesis: Option<ModelResponse>,
    pub label_to_model: BTreeMap<Label, ParticipantId>,
    pub aggregate: Vec<AggregateEntry>,
}

impl RankingOutcome {
    /// Persistence shape: `{mode: "ranking", stage1, stage2, synthesis, metadata}`
    pub fn to_stored(&self) -> serde_json::Value {
        serde_json::json!({
            "mode": "ranking",
            "stage1": self.stage1,
            "stage2": self.stage2,
            "synthesis": self.synthesis,
            "metadata": {
                "label_to_model": self.label_to_model,
                "aggregate": self.aggregate,
            }
        })
    }
}
