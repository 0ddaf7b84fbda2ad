//! Configuration file schema
//!
//! All values have working defaults so the binary runs with no config file
//! at all. API keys never live here — they come from the environment.

use std::time::Duration;

use council_application::{RunSettings, ToolCallCaps};
use serde::{Deserialize, Serialize};

/// Top-level configuration file (`council.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub council: CouncilSection,
    pub gateway: GatewaySection,
    pub search: SearchSection,
    pub debate: DebateSection,
    pub storage: StorageSection,
}

/// The participant panel and the chairman
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilSection {
    pub participants: Vec<String>,
    pub chairman: String,
}

impl Default for CouncilSection {
    fn default() -> Self {
        Self {
            participants: vec![
                "openai/gpt-4o-mini".to_string(),
                "x-ai/grok-3".to_string(),
                "deepseek/deepseek-chat".to_string(),
            ],
            chairman: "openai/gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Chat-completions endpoint URL
    pub api_url: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub max_results: u8,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateSection {
    /// Critique-defense cycles after the initial round
    pub cycles: u32,
    /// Per-participant timeout in seconds
    pub timeout_secs: u64,
    /// Use the ReAct agent loop for tool-enabled rounds
    pub use_react: bool,
    /// Tool-execution cap for non-streaming turns
    pub max_tool_calls: u32,
    /// Tool-execution cap for streaming turns
    pub max_tool_calls_streaming: u32,
}

impl Default for DebateSection {
    fn default() -> Self {
        let caps = ToolCallCaps::default();
        Self {
            cycles: 1,
            timeout_secs: 120,
            use_react: false,
            max_tool_calls: caps.non_streaming,
            max_tool_calls_streaming: caps.streaming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory completed runs are written to
    pub data_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "data/conversations".to_string(),
        }
    }
}

impl FileConfig {
    /// Build per-run settings from the file values
    pub fn run_settings(&self) -> RunSettings {
        let mut settings = RunSettings::new(
            self.council
                .participants
                .iter()
                .map(|m| m.as_str().into())
                .collect(),
            self.council.chairman.as_str().into(),
        )
        .with_react(self.debate.use_react)
        .with_cycles(self.debate.cycles)
        .with_timeout(Duration::from_secs(self.debate.timeout_secs));
        settings.max_tool_calls = ToolCallCaps {
            non_streaming: self.debate.max_tool_calls,
            streaming: self.debate.max_tool_calls_streaming,
        };
        settings
    }
}
