//! Per-run configuration surface

use std::time::Duration;

use chrono::NaiveDate;
use council_domain::{DomainError, ParticipantId};

/// Default per-participant wall-clock timeout
pub const DEFAULT_PARTICIPANT_TIMEOUT: Duration = Duration::from_secs(120);

/// How rounds are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// All participants concurrent, per-participant events (the default)
    #[default]
    BatchParallel,
    /// One participant at a time with per-token events
    SequentialStreaming,
}

/// Iteration caps for the two native tool loops
///
/// Both loops count executed tool rounds in `0..max`; the model always gets
/// to respond at least once, and a cap of zero returns the first assistant
/// reply verbatim without executing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCallCaps {
    pub non_streaming: u32,
    pub streaming: u32,
}

impl Default for ToolCallCaps {
    fn default() -> Self {
        Self {
            non_streaming: 5,
            streaming: 3,
        }
    }
}

/// Read-only settings for one council run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// The debating panel; fixed for the whole run
    pub participants: Vec<ParticipantId>,
    /// Produces the final synthesis; need not be on the panel
    pub chairman: ParticipantId,
    /// Use the ReAct agent loop for tool-enabled rounds
    pub use_react: bool,
    /// Critique-defense cycles after the initial round
    pub cycles: u32,
    /// Per-participant wall-clock timeout
    pub participant_timeout: Duration,
    pub max_tool_calls: ToolCallCaps,
    /// Calendar date used to orient time-sensitive prompts
    pub today: NaiveDate,
}

impl RunSettings {
    pub fn new(participants: Vec<ParticipantId>, chairman: ParticipantId) -> Self {
        Self {
            participants,
            chairman,
            use_react: false,
            cycles: 1,
            participant_timeout: DEFAULT_PARTICIPANT_TIMEOUT,
            max_tool_calls: ToolCallCaps::default(),
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_react(mut self, use_react: bool) -> Self {
        self.use_react = use_react;
        self
    }

    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.participant_timeout = timeout;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Reject configurations the engine cannot honor
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.participants.len() < 2 {
            return Err(DomainError::NotEnoughParticipants(self.participants.len()));
        }
        if self.cycles < 1 {
            return Err(DomainError::InvalidCycles(self.cycles));
        }
        Ok(())
    }
}
