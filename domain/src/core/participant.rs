//! Participant identity value object

use serde::{Deserialize, Serialize};

/// Identifies a chat model on the LLM gateway (Value Object)
///
/// The gateway namespace is open-ended (`provider/model` identifiers such as
/// `openai/gpt-4o-mini` or `x-ai/grok-3`), so the id is an opaque string
/// compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the full identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display name without the provider prefix
    ///
    /// E.g. `"openai/gpt-4o-mini"` -> `"gpt-4o-mini"`
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::str::FromStr for ParticipantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}
