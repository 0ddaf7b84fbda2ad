//! Tool registry
//!
//! Maps declarative [`ToolSchema`]s to handlers and implements the
//! [`ToolExecutorPort`]. The registry is assembled at startup and read-only
//! afterwards. Execution is infallible: unknown tools and bad arguments are
//! reported to the model as result text, never as errors.

use std::sync::Arc;

use async_trait::async_trait;
use council_application::use_cases::tool_loop::INVALID_ARGUMENTS;
use council_application::ToolExecutorPort;
use council_domain::ToolSchema;
use tracing::debug;

use crate::search::TavilySearch;

/// A tool implementation behind the registry
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: &serde_json::Value) -> String;
}

/// Schema of the built-in `search_web` tool
pub fn search_web_schema() -> ToolSchema {
    ToolSchema::new(
        "search_web",
        "Search the web for current information. Use this when you need up-to-date information, recent events, current statistics, or facts you're unsure about.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to look up on the web"
                }
            },
            "required": ["query"],
        }),
    )
}

/// The built-in web search tool
pub struct SearchWebTool {
    search: TavilySearch,
}

impl SearchWebTool {
    pub fn new(search: TavilySearch) -> Self {
        Self { search }
    }
}

#[async_trait]
impl ToolHandler for SearchWebTool {
    async fn call(&self, arguments: &serde_json::Value) -> String {
        let Some(query) = arguments.get("query").and_then(|v| v.as_str()) else {
            return INVALID_ARGUMENTS.to_string();
        };
        self.search.search_formatted(query).await
    }
}

/// Registry of declared tools, immutable after startup
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<(ToolSchema, Arc<dyn ToolHandler>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; registration order is schema order
    pub fn register(mut self, schema: ToolSchema, handler: Arc<dyn ToolHandler>) -> Self {
        debug!(tool = %schema.name, "registered tool");
        self.tools.push((schema, handler));
        self
    }

    /// The default registry: `search_web` over the given provider
    pub fn with_search(search: TavilySearch) -> Self {
        Self::new().register(search_web_schema(), Arc::new(SearchWebTool::new(search)))
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|(schema, _)| schema.clone()).collect()
    }

    async fn execute(&self, name: &str, arguments: &serde_json::Value) -> String {
        match self
            .tools
            .iter()
            .find(|(schema, _)| schema.name == name)
            .map(|(_, handler)| handler)
        {
            Some(handler) => handler.call(arguments).await,
            None => format!("Unknown tool: {name}"),
        }
    }
}
