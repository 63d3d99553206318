//! OpenAI model implementation.
//!
//! This module provides an implementation of the `Model` trait for OpenAI's chat
//! completions API. Images are sent as `image_url` parts; both remote URLs and
//! base64 payloads (as `data:` URIs) are accepted.

use async_trait::async_trait;
use plume_abstraction::{
    ChatMessage, ContentBlock, ImageSource, MessageContent, Model, ModelError, ModelParameters,
    ModelResponse, ModelUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI model implementation.
#[derive(Debug, Clone)]
pub struct OpenAIModel {
    /// The model ID (e.g., "gpt-4o").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the OpenAI API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAIModel {
    /// Creates a new `OpenAIModel` with a custom API key.
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self { model_id, api_key, base_url: DEFAULT_BASE_URL.to_string(), client: Client::new() }
    }

    /// Points the model at a different API root (proxies, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Reuses an existing HTTP client and its connection pool.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// OpenAI takes images either by URL or inline as a `data:` URI.
    pub fn accepts_image(_source: &ImageSource, _media_type: &str) -> bool {
        true
    }

    /// Converts our ChatMessage role to OpenAI API role format.
    fn role_to_openai(role: &str) -> String {
        match role {
            "assistant" => "assistant".to_string(),
            "system" => "system".to_string(),
            "user" => "user".to_string(),
            _ => role.to_string(),
        }
    }

    fn to_openai_content(content: &MessageContent) -> OpenAIContent {
        match content {
            MessageContent::Text(text) => OpenAIContent::Text(text.clone()),
            MessageContent::Blocks(blocks) => OpenAIContent::Parts(
                blocks
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => OpenAIPart::Text { text: text.clone() },
                        ContentBlock::Image { source, media_type } => {
                            let url = match source {
                                ImageSource::Url { url } => url.clone(),
                                ImageSource::Base64 { data } => {
                                    format!("data:{media_type};base64,{data}")
                                }
                            };
                            OpenAIPart::ImageUrl { image_url: OpenAIImageUrl { url } }
                        }
                    })
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            parameters = ?parameters,
            "OpenAIModel generating chat completion"
        );

        let url = format!("{}/chat/completions", self.base_url);

        let openai_messages: Vec<OpenAIMessage> = messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: Self::role_to_openai(&msg.role),
                content: Self::to_openai_content(&msg.content),
            })
            .collect();

        let mut request_body = OpenAIRequest {
            model: self.model_id.clone(),
            messages: openai_messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
        };

        if let Some(params) = parameters {
            request_body.temperature = params.temperature;
            request_body.top_p = params.top_p;
            request_body.max_tokens = params.max_tokens;
            request_body.stop = params.stop_sequences;
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                "OpenAI API returned error status"
            );

            // 402 and 429 are both quota/rate-limit conditions for OpenAI.
            if status == 402 || status == 429 {
                return Err(ModelError::QuotaExceeded {
                    provider: "openai".to_string(),
                    message: Some(error_text),
                });
            }

            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                error!("No content in OpenAI API response");
                ModelError::ModelResponseError("No content in API response".to_string())
            })?;

        let usage = openai_response.usage.map(|u| ModelUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ModelResponse { content, model_id: Some(self.model_id.clone()), usage })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI API request/response structures

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: OpenAIContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize)]
struct OpenAIImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
