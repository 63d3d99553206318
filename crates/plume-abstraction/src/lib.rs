//! Model abstraction layer for Plume.
//!
//! This module defines the core traits and types for interacting with AI models.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when interacting with an AI model.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The model returned an error (e.g., invalid input, rate limiting).
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The model provider is not supported or configured.
    #[error("Unsupported Model Provider: {0}")]
    UnsupportedModelProvider(String),

    /// The model cannot accept this kind of content (e.g., an image URL for an inline-only API).
    #[error("Content type '{content_type}' is not supported by {model}")]
    UnsupportedContentType {
        /// Description of the rejected content.
        content_type: String,
        /// The provider that rejected it.
        model: String,
    },

    /// Provider quota exceeded or rate limit hit.
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "openai", "google").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

/// The LLM backends Plume knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions.
    OpenAI,
    /// Google Gemini `generateContent`.
    Google,
    /// Anthropic Claude messages.
    Anthropic,
}

impl Provider {
    /// All providers, in primary/secondary/tertiary order.
    pub const ALL: [Self; 3] = [Self::OpenAI, Self::Google, Self::Anthropic];

    /// Lowercase identifier used in requests and config files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Google => "google",
            Self::Anthropic => "anthropic",
        }
    }

    /// Human-readable vendor name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Google => "Google",
            Self::Anthropic => "Anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "google" | "gemini" => Ok(Self::Google),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            _ => Err(()),
        }
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Inline base64 payload (what a `data:` URI carries).
    Base64 {
        /// Base64-encoded image bytes.
        data: String,
    },
    /// Remote image the provider fetches itself.
    Url {
        /// The image URL.
        url: String,
    },
}

/// One piece of a multimodal message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An image with its MIME type.
    Image {
        /// The image payload.
        source: ImageSource,
        /// MIME type such as `image/png`.
        media_type: String,
    },
}

/// Content of a chat message: either plain text or a list of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Multimodal content.
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Concatenates the text parts of this content.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Represents a message in a conversation with a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender (e.g., "user", "assistant", "system").
    pub role: String,
    /// The content of the message.
    pub content: MessageContent,
}

impl ChatMessage {
    /// A system instruction.
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    /// A user turn.
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Parameters for controlling the model's generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParameters {
    /// What sampling temperature to use, between 0 and 2.
    pub temperature: Option<f32>,

    /// Nucleus sampling mass.
    pub top_p: Option<f32>,

    /// The maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sequences where the API will stop generating further tokens.
    pub stop_sequences: Option<Vec<String>>,
}

impl ModelParameters {
    /// Parameters that only cap the output length.
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self { max_tokens: Some(max_tokens), ..Self::default() }
    }
}

/// The response from a text generation or chat completion model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated content.
    pub content: String,

    /// Optional: The ID of the model used to generate the response.
    pub model_id: Option<String>,

    /// Optional: Usage statistics for the request.
    pub usage: Option<ModelUsage>,
}

/// Usage statistics for a model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,

    /// Number of tokens in the completion.
    pub completion_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

/// A trait for interacting with different AI models.
///
/// All models must be `Send + Sync` to allow concurrent use across threads.
#[async_trait]
pub trait Model: Send + Sync {
    /// Generates a text completion based on the given prompt.
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        let messages = vec![ChatMessage::user(prompt)];
        self.generate_chat_completion(&messages, parameters).await
    }

    /// Generates a chat completion based on the given conversation history.
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}
