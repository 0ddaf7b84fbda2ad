//! Web search adapters.

mod tavily;

pub use tavily::{format_results, SearchError, SearchResponse, SearchResult, TavilySearch};
