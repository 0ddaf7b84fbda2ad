//! Tavily search provider
//!
//! Wraps the Tavily search API and formats results for model consumption.
//! The adapter degrades truthfully: without an API key, or when the provider
//! fails, the model is told search is unavailable and proceeds on its own
//! knowledge — a failed search never kills a participant.

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Model-facing text returned whenever the provider cannot be used
pub const SEARCH_UNAVAILABLE: &str =
    "Web search is currently unavailable. Answer from your existing knowledge and note where information may be outdated.";

/// Model-facing text for queries the provider had nothing for
pub const NO_RESULTS: &str = "Web search returned no results for this query.";

/// Errors from the search provider
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search provider is not configured")]
    NotConfigured,

    #[error("search request failed: {0}")]
    Http(String),

    #[error("search provider returned {0}")]
    Status(u16),
}

/// Response from the search provider
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Tavily search client
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: Option<String>,
    max_results: u8,
}

impl TavilySearch {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            max_results: 5,
        }
    }

    pub fn with_max_results(mut self, max_results: u8) -> Self {
        self.max_results = max_results;
        self
    }

    /// Search and format for the model, degrading to the unavailable
    /// sentinel on any failure
    pub async fn search_formatted(&self, query: &str) -> String {
        match self.search(query).await {
            Ok(response) => format_results(&response),
            Err(error) => {
                warn!(%error, query, "search unavailable");
                SEARCH_UNAVAILABLE.to_string()
            }
        }
    }

    /// Raw search call
    pub async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        let Some(api_key) = &self.api_key else {
            return Err(SearchError::NotConfigured);
        };

        let payload = json!({
            "api_key": api_key,
            "query": query,
            "search_depth": "basic",
            "max_results": self.max_results,
            "include_answer": true,
            "include_raw_content": false,
        });

        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))
    }
}

/// Format provider results as `[N] title / url / snippet` blocks
pub fn format_results(response: &SearchResponse) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(answer) = &response.answer
        && !answer.is_empty()
    {
        parts.push(format!("Quick Answer: {answer}"));
    }

    for (i, result) in response.results.iter().enumerate() {
        parts.push(format!(
            "[{}] {}\n{}\n{}",
            i + 1,
            result.title,
            result.url,
            result.content
        ));
    }

    if parts.is_empty() {
        return NO_RESULTS.to_string();
    }
    parts.join("\n\n")
}
