//! Tool Executor port
//!
//! Defines how the engine executes tools requested by the models.
//! Implementations live in the infrastructure layer; the registry behind
//! this port is configured at startup and immutable afterwards.

use async_trait::async_trait;
use council_domain::ToolSchema;

/// Port for tool execution
///
/// Execution is infallible by contract: a failed, unknown, or rejected tool
/// invocation is reported inside the returned string so the model is told
/// what happened and the loop never aborts.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Schemas of every registered tool, in registration order
    fn schemas(&self) -> Vec<ToolSchema>;

    /// Check whether a tool is registered
    fn has_tool(&self, name: &str) -> bool {
        self.schemas().iter().any(|schema| schema.name == name)
    }

    /// Execute a tool and return its result as model-facing text
    async fn execute(&self, name: &str, arguments: &serde_json::Value) -> String;
}
