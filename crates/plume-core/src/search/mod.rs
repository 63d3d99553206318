//! Live web search.

mod tavily;

pub use tavily::TavilySearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web search errors. A missing API key is not an error; see [`SearchOutcome`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request could not be sent or the response could not be read.
    #[error("search request failed: {0}")]
    Request(String),

    /// The search API answered with a non-success status.
    #[error("search API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// What a search call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Formatted results (possibly empty when nothing matched).
    Results(String),
    /// No search backend is configured; the message says which.
    Unconfigured(String),
}

/// Trace entry recorded when search was requested but no backend is configured.
pub const SEARCH_UNCONFIGURED: &str =
    "Searcher: web search skipped, search provider not configured.";

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Extracted page content.
    pub content: String,
}

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs `query` and returns formatted results.
    async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError>;
}

/// Renders results as `Title/URL/Content` blocks joined by `---` lines.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("Title: {}\nURL: {}\nContent: {}\n", r.title, r.url, r.content))
        .collect::<Vec<_>>()
        .join("\n---\n")
}
