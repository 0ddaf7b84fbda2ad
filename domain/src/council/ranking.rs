//! Anonymized labels and peer-ranking records

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::participant::ParticipantId;

use super::round::ModelResponse;

/// Anonymized identifier for a stage-1 response
///
/// Rendered as `Response A`, `Response B`, … in prompts; labels are a prefix
/// of the alphabet assigned in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub char);

impl Label {
    /// The first `n` labels, `A` onward
    pub fn alphabet(n: usize) -> Vec<Label> {
        (0..n.min(26)).map(|i| Label((b'A' + i as u8) as char)).collect()
    }

    /// Prompt-facing name, e.g. `Response A`
    pub fn display_name(&self) -> String {
        format!("Response {}", self.0)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Ok(Label(c)),
            _ => Err(D::Error::custom(format!("invalid label: {s:?}"))),
        }
    }
}

/// Assign labels to stage-1 responses in submission order
///
/// The resulting map is a bijection onto the successful participants; its
/// keys are a prefix of the alphabet.
pub fn assign_labels(responses: &[ModelResponse]) -> BTreeMap<Label, ParticipantId> {
    Label::alphabet(responses.len())
        .into_iter()
        .zip(responses.iter().map(|r| r.model.clone()))
        .collect()
}

/// One participant's peer evaluation of the anonymized responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    /// The evaluating participant
    pub model: ParticipantId,
    /// Full evaluation text as produced by the model
    pub evaluation: String,
    /// Labels in ranked order, extracted by the ranking parser
    pub parsed_order: Vec<Label>,
}

impl RankingRecord {
    pub fn new(
        model: ParticipantId,
        evaluation: impl Into<String>,
        parsed_order: Vec<Label>,
    ) -> Self {
        Self {
            model,
            evaluation: evaluation.into(),
            parsed_order,
        }
    }
}

/// Aggregate standing of one participant across all peer rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub model: ParticipantId,
    /// Mean 1-based position across the evaluations that mentioned it
    pub mean_position: f64,
    /// Number of evaluations that mentioned it
    pub vote_count: usize,
}
