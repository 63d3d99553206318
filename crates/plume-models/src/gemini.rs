//! Google Gemini model implementation.
//!
//! This module provides an implementation of the `Model` trait for Google's Gemini API.
//! System messages travel in the dedicated `systemInstruction` field. Images must be
//! sent inline (`inline_data`); the API cannot fetch arbitrary URLs, so URL sources are
//! rejected with `ModelError::UnsupportedContentType` before a request is built.

use async_trait::async_trait;
use plume_abstraction::{
    ChatMessage, ContentBlock, ImageSource, MessageContent, Model, ModelError, ModelParameters,
    ModelResponse, ModelUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini model implementation.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    /// The model ID (e.g., "gemini-3-flash-preview").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the Gemini API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl GeminiModel {
    /// Creates a new `GeminiModel` with a custom API key.
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

    /// Gemini only takes inline image bytes.
    pub fn accepts_image(source: &ImageSource, _media_type: &str) -> bool {
        matches!(source, ImageSource::Base64 { .. })
    }

    /// Converts our ChatMessage role to Gemini API role format.
    fn role_to_gemini(role: &str) -> String {
        match role {
            "assistant" => "model".to_string(),
            _ => "user".to_string(),
        }
    }

    /// Extracts system messages from the chat history and concatenates them with "\n\n".
    fn extract_system_messages(messages: &[ChatMessage]) -> Option<String> {
        let system_messages: Vec<String> = messages
            .iter()
            .filter(|msg| msg.role == "system")
            .map(|msg| msg.content.text())
            .collect();

        if system_messages.is_empty() {
            None
        } else {
            Some(system_messages.join("\n\n"))
        }
    }

    fn to_gemini_parts(content: &MessageContent) -> Result<Vec<GeminiPart>, ModelError> {
        match content {
            MessageContent::Text(text) => Ok(vec![GeminiPart::Text { text: text.clone() }]),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => Ok(GeminiPart::Text { text: text.clone() }),
                    ContentBlock::Image { source: ImageSource::Base64 { data }, media_type } => {
                        Ok(GeminiPart::InlineData {
                            inline_data: GeminiInlineData {
                                mime_type: media_type.clone(),
                                data: data.clone(),
                            },
                        })
                    }
                    ContentBlock::Image { source: ImageSource::Url { .. }, .. } => {
                        Err(ModelError::UnsupportedContentType {
                            content_type: "image (URL)".to_string(),
                            model: "google".to_string(),
                        })
                    }
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            parameters = ?parameters,
            "GeminiModel generating chat completion"
        );

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model_id);

        let system_instruction = Self::extract_system_messages(messages);

        let contents: Vec<GeminiContent> = messages
            .iter()
            .filter(|msg| msg.role != "system")
            .map(|msg| {
                Ok(GeminiContent {
                    role: Self::role_to_gemini(&msg.role),
                    parts: Self::to_gemini_parts(&msg.content)?,
                })
            })
            .collect::<Result<_, ModelError>>()?;

        let request_body = GeminiRequest {
            contents,
            generation_config: parameters.map(|params| GeminiGenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                max_output_tokens: params.max_tokens,
                stop_sequences: params.stop_sequences,
            }),
            system_instruction: system_instruction.map(|text| GeminiSystemInstruction {
                parts: vec![GeminiPart::Text { text }],
            }),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Gemini API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                "Gemini API returned error status"
            );

            if status == 402
                || status == 429
                || error_text.to_uppercase().contains("RESOURCE_EXHAUSTED")
            {
                return Err(ModelError::QuotaExceeded {
                    provider: "google".to_string(),
                    message: Some(error_text),
                });
            }

            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let candidate = gemini_response.candidates.first().ok_or_else(|| {
            error!("No candidates in Gemini API response");
            ModelError::ModelResponseError("No content in API response".to_string())
        })?;

        let texts: Vec<&str> =
            candidate.content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if texts.is_empty() {
            error!("No content in Gemini API response");
            return Err(ModelError::ModelResponseError("No content in API response".to_string()));
        }
        let content = texts.concat();

        let usage = gemini_response.usage_metadata.map(|meta| ModelUsage {
            prompt_tokens: meta.prompt_token_count.unwrap_or(0),
            completion_tokens: meta.candidates_token_count.unwrap_or(0),
            total_tokens: meta.total_token_count.unwrap_or(0),
        });

        Ok(ModelResponse { content, model_id: Some(self.model_id.clone()), usage })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_field_names)] // Matches API naming
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_conversion() {
        assert_eq!(GeminiModel::role_to_gemini("assistant"), "model");
        assert_eq!(GeminiModel::role_to_gemini("user"), "user");
    }

    #[test]
    fn test_system_messages_concatenated() {
        let messages = vec![
            ChatMessage::system("First"),
            ChatMessage::user("Hi"),
            ChatMessage::system("Second"),
        ];
        assert_eq!(
            GeminiModel::extract_system_messages(&messages),
            Some("First\n\nSecond".to_string())
        );
        assert_eq!(GeminiModel::extract_system_messages(&[ChatMessage::user("Hi")]), None);
    }

    #[test]
    fn test_inline_image_part() {
        let content = MessageContent::Blocks(vec![ContentBlock::Image {
            source: ImageSource::Base64 { data: "QUJD".to_string() },
            media_type: "image/jpeg".to_string(),
        }]);
        let parts = GeminiModel::to_gemini_parts(&content).unwrap();
        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(json[0]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(json[0]["inline_data"]["data"], "QUJD");
    }

    #[test]
    fn test_url_image_rejected() {
        let content = MessageContent::Blocks(vec![ContentBlock::Image {
            source: ImageSource::Url { url: "https://example.com/cat.png".to_string() },
            media_type: "image/png".to_string(),
        }]);
        let err = GeminiModel::to_gemini_parts(&content).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedContentType { .. }));
        assert!(!GeminiModel::accepts_image(
            &ImageSource::Url { url: "https://example.com/cat.png".to_string() },
            "image/png"
        ));
    }
}
