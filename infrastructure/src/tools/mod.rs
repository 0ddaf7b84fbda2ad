//! Tool registry and built-in tools.

mod registry;

pub use registry::{search_web_schema, SearchWebTool, ToolHandler, ToolRegistry};
