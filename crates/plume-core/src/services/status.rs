//! Which backends are configured.

use plume_abstraction::Provider;
use plume_models::{DEFAULT_ANTHROPIC_MODEL, DEFAULT_GOOGLE_MODEL, DEFAULT_OPENAI_MODEL};
use serde::Serialize;

use crate::config::PlumeConfig;

/// One LLM backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    /// Backend.
    pub provider: Provider,
    /// Whether an API key is set.
    pub configured: bool,
    /// Model used when none is requested.
    pub default_model: &'static str,
}

/// Configuration status of every backend Plume talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// LLM backends in fallback order.
    pub providers: Vec<ProviderStatus>,
    /// Whether web search has an API key.
    pub search_configured: bool,
}

impl StatusReport {
    /// Builds the report from `config`.
    pub fn from_config(config: &PlumeConfig) -> Self {
        let credentials = config.credentials();
        let providers = Provider::ALL
            .into_iter()
            .map(|provider| ProviderStatus {
                provider,
                configured: credentials.is_configured(provider),
                default_model: default_model(provider),
            })
            .collect();
        Self { providers, search_configured: config.search_api_key().is_some() }
    }

    /// Whether at least one LLM backend is configured.
    pub fn any_provider(&self) -> bool {
        self.providers.iter().any(|p| p.configured)
    }
}

const fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => DEFAULT_OPENAI_MODEL,
        Provider::Google => DEFAULT_GOOGLE_MODEL,
        Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
    }
}
