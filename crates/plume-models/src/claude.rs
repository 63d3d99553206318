//! Claude (Anthropic) model implementation.
//!
//! This module provides an implementation of the `Model` trait for Anthropic's Messages API.
//!
//! ## System Message Handling
//!
//! Claude takes system instructions through a dedicated `system` field rather than
//! inline in the messages array. System messages are extracted from the
//! `ChatMessage` list, filtered out of `messages`, and sent via `system`.
//!
//! ## Images
//!
//! Only inline base64 images in `image/jpeg`, `image/png`, `image/gif` or
//! `image/webp` are accepted. URL sources are rejected before any request is made.

use async_trait::async_trait;
use plume_abstraction::{
    ChatMessage, ContentBlock, ImageSource, MessageContent, Model, ModelError, ModelParameters,
    ModelResponse, ModelUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const SUPPORTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Claude model implementation.
#[derive(Debug, Clone)]
pub struct ClaudeModel {
    /// The model ID (e.g., "claude-3-sonnet-20240229").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the Claude API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl ClaudeModel {
    /// Creates a new `ClaudeModel` with a custom API key.
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self { model_id, api_key, base_url: DEFAULT_BASE_URL.to_string(), client: Client::new() }
    }

    /// Points the model at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Reuses an existing HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Whether Claude can take this image as-is.
    pub fn accepts_image(source: &ImageSource, media_type: &str) -> bool {
        matches!(source, ImageSource::Base64 { .. }) && SUPPORTED_IMAGE_TYPES.contains(&media_type)
    }

    /// Extracts the first system message from the chat history.
    fn extract_system_prompt(messages: &[ChatMessage]) -> Option<String> {
        messages.iter().find(|msg| msg.role == "system").map(|msg| msg.content.text())
    }

    /// Converts our ChatMessage to Claude API message format.
    fn to_claude_message(msg: &ChatMessage) -> Result<ClaudeMessage, ModelError> {
        let role = if msg.role == "assistant" { "assistant" } else { "user" }.to_string();
        let content = match &msg.content {
            MessageContent::Text(text) => ClaudeMessageContent::Text(text.clone()),
            MessageContent::Blocks(blocks) => ClaudeMessageContent::Blocks(
                blocks.iter().map(Self::to_claude_block).collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(ClaudeMessage { role, content })
    }

    fn to_claude_block(block: &ContentBlock) -> Result<ClaudeBlock, ModelError> {
        match block {
            ContentBlock::Text { text } => Ok(ClaudeBlock::Text { text: text.clone() }),
            ContentBlock::Image { source: ImageSource::Base64 { data }, media_type }
                if SUPPORTED_IMAGE_TYPES.contains(&media_type.as_str()) =>
            {
                Ok(ClaudeBlock::Image {
                    source: ClaudeImageSource {
                        source_type: "base64".to_string(),
                        media_type: media_type.clone(),
                        data: data.clone(),
                    },
                })
            }
            ContentBlock::Image { source, media_type } => {
                let kind = match source {
                    ImageSource::Base64 { .. } => media_type.as_str(),
                    ImageSource::Url { .. } => "URL",
                };
                Err(ModelError::UnsupportedContentType {
                    content_type: format!("image ({kind})"),
                    model: "anthropic".to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl Model for ClaudeModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            parameters = ?parameters,
            "ClaudeModel generating chat completion"
        );

        let url = format!("{}/messages", self.base_url);

        let system = Self::extract_system_prompt(messages);

        let claude_messages: Vec<ClaudeMessage> = messages
            .iter()
            .filter(|msg| msg.role != "system")
            .map(Self::to_claude_message)
            .collect::<Result<_, _>>()?;

        let mut request_body = ClaudeRequest {
            model: self.model_id.clone(),
            messages: claude_messages,
            max_tokens: 4096,
            system,
            temperature: None,
            top_p: None,
            stop_sequences: None,
        };

        if let Some(params) = parameters {
            request_body.temperature = params.temperature;
            request_body.top_p = params.top_p;
            if let Some(max_tokens) = params.max_tokens {
                request_body.max_tokens = max_tokens;
            }
            request_body.stop_sequences = params.stop_sequences;
        }

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Claude API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                "Claude API returned error status"
            );

            if status == 402 || status == 429 || is_quota_error_body(&error_text) {
                return Err(ModelError::QuotaExceeded {
                    provider: "anthropic".to_string(),
                    message: Some(error_text),
                });
            }

            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let claude_response: ClaudeResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Claude API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let content = claude_response
            .content
            .iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text.clone())
            .ok_or_else(|| {
                error!("No text content in Claude API response");
                ModelError::ModelResponseError("No text content in API response".to_string())
            })?;

        let usage = Some(ModelUsage {
            prompt_tokens: claude_response.usage.input_tokens,
            completion_tokens: claude_response.usage.output_tokens,
            total_tokens: claude_response.usage.input_tokens + claude_response.usage.output_tokens,
        });

        Ok(ModelResponse { content, model_id: Some(self.model_id.clone()), usage })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Anthropic reports quota problems as typed errors: `{"error": {"type": "..."}}`.
fn is_quota_error_body(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("type"))
                .or_else(|| json.get("type"))
                .and_then(|t| t.as_str())
                .map(|t| matches!(t, "rate_limit_error" | "overloaded_error" | "insufficient_quota"))
        })
        .unwrap_or(false)
}

// Claude API request/response structures

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<ClaudeMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: ClaudeMessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ClaudeMessageContent {
    Text(String),
    Blocks(Vec<ClaudeBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeBlock {
    Text { text: String },
    Image { source: ClaudeImageSource },
}

#[derive(Debug, Serialize)]
struct ClaudeImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_model_creation_with_api_key() {
        let model = ClaudeModel::with_api_key(
            "claude-3-sonnet-20240229".to_string(),
            "test-key".to_string(),
        );
        assert_eq!(model.model_id(), "claude-3-sonnet-20240229");
    }

    #[test]
    fn test_system_prompt_extraction() {
        let messages = vec![ChatMessage::system("You are helpful"), ChatMessage::user("Hello")];
        let system = ClaudeModel::extract_system_prompt(&messages);
        assert_eq!(system, Some("You are helpful".to_string()));
    }

    #[test]
    fn test_accepts_only_inline_common_formats() {
        let inline = ImageSource::Base64 { data: "AAAA".to_string() };
        let remote = ImageSource::Url { url: "https://example.com/a.png".to_string() };
        assert!(ClaudeModel::accepts_image(&inline, "image/png"));
        assert!(ClaudeModel::accepts_image(&inline, "image/webp"));
        assert!(!ClaudeModel::accepts_image(&inline, "image/bmp"));
        assert!(!ClaudeModel::accepts_image(&remote, "image/png"));
    }

    #[test]
    fn test_url_image_rejected_before_request() {
        let block = ContentBlock::Image {
            source: ImageSource::Url { url: "https://example.com/a.png".to_string() },
            media_type: "image/png".to_string(),
        };
        let err = ClaudeModel::to_claude_block(&block).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedContentType { .. }));
    }

    #[test]
    fn test_quota_error_body_detection() {
        assert!(is_quota_error_body(
            r#"{"error":{"type":"rate_limit_error","message":"Rate limit exceeded"}}"#
        ));
        assert!(is_quota_error_body(r#"{"type":"overloaded_error"}"#));
        assert!(!is_quota_error_body(r#"{"error":{"type":"invalid_request_error"}}"#));
        assert!(!is_quota_error_body("not json"));
    }
}
