//! Infrastructure layer for the LLM council
//!
//! This crate contains the adapters that implement the ports defined in the
//! application layer: the OpenRouter-compatible HTTP gateway, the Tavily
//! search provider, the tool registry, configuration file loading, and the
//! conversation store.

pub mod config;
pub mod gateway;
pub mod search;
pub mod storage;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use gateway::OpenRouterGateway;
pub use search::{SearchError, TavilySearch};
pub use storage::ConversationStore;
pub use tools::{search_web_schema, ToolHandler, ToolRegistry};
