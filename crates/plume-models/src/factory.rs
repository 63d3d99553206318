//! Model factory for creating model instances from configuration.
//!
//! Credentials are resolved by the caller; the factory never reads the environment.

use crate::{ClaudeModel, GeminiModel, OpenAIModel};
use plume_abstraction::{Model, Provider};
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

/// Model type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Anthropic Claude model.
    Claude,
    /// Google Gemini model.
    Gemini,
    /// OpenAI model.
    OpenAI,
}

impl From<Provider> for ModelType {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::OpenAI => Self::OpenAI,
            Provider::Google => Self::Gemini,
            Provider::Anthropic => Self::Claude,
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// The type of model to create.
    pub model_type: ModelType,
    /// The model ID (e.g., "gemini-3-flash-preview", "gpt-4o").
    pub model_id: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Optional API root override.
    pub base_url: Option<String>,
    /// Optional shared HTTP client.
    pub client: Option<Client>,
}

impl ModelConfig {
    /// Creates a new `ModelConfig` for the given type, model ID and key.
    #[must_use]
    pub fn new(model_type: ModelType, model_id: String, api_key: String) -> Self {
        Self { model_type, model_id, api_key, base_url: None, client: None }
    }

    /// Sets the base URL for this configuration.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Shares an HTTP client with the created model.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }
}

/// Applies the optional base URL and client overrides shared by every HTTP-backed model.
macro_rules! configure_http_model {
    ($model:expr, $config:expr) => {{
        let mut model = $model;
        if let Some(base_url) = $config.base_url {
            model = model.with_base_url(base_url);
        }
        if let Some(client) = $config.client {
            model = model.with_client(client);
        }
        model
    }};
}

/// Factory for creating model instances.
pub struct ModelFactory;

impl ModelFactory {
    /// Creates a model instance from the given configuration.
    pub fn create(config: ModelConfig) -> Arc<dyn Model + Send + Sync> {
        debug!(
            model_type = ?config.model_type,
            model_id = %config.model_id,
            "Creating model instance"
        );

        match config.model_type {
            ModelType::Claude => {
                let model = ClaudeModel::with_api_key(config.model_id, config.api_key);
                Arc::new(configure_http_model!(model, config))
            }
            ModelType::Gemini => {
                let model = GeminiModel::with_api_key(config.model_id, config.api_key);
                Arc::new(configure_http_model!(model, config))
            }
            ModelType::OpenAI => {
                let model = OpenAIModel::with_api_key(config.model_id, config.api_key);
                Arc::new(configure_http_model!(model, config))
            }
        }
    }
}
