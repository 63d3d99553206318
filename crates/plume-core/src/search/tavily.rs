//! Tavily search client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::{SearchError, SearchOutcome, SearchProvider, SearchResult, format_results};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
const UNCONFIGURED_MESSAGE: &str = "Tavily API key not configured.";

/// Tavily web search.
#[derive(Debug, Clone)]
pub struct TavilySearch {
    api_key: Option<String>,
    base_url: String,
    search_depth: String,
    client: Client,
}

impl TavilySearch {
    /// Creates a client. `None` or a blank key yields an unconfigured client.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            search_depth: crate::config::DEFAULT_SEARCH_DEPTH.to_string(),
            client: Client::new(),
        }
    }

    /// Points the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the search depth ("basic" or "advanced").
    #[must_use]
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    /// Reuses an existing HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let Some(api_key) = &self.api_key else {
            warn!("Web search requested but no Tavily API key is configured");
            return Ok(SearchOutcome::Unconfigured(UNCONFIGURED_MESSAGE.to_string()));
        };

        debug!(query = %query, search_depth = %self.search_depth, "Running Tavily search");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(api_key)
            .json(&TavilyRequest { query, search_depth: &self.search_depth })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Tavily");
                SearchError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Tavily returned error status");
            return Err(SearchError::Api { status: status.as_u16(), body });
        }

        let parsed: TavilyResponse =
            response.json().await.map_err(|e| SearchError::Request(e.to_string()))?;
        debug!(results = parsed.results.len(), "Tavily search complete");

        Ok(SearchOutcome::Results(format_results(&parsed.results)))
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}
