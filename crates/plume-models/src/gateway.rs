//! Provider gateway with credential-driven fallback.
//!
//! The gateway is the single entry point the rest of Plume uses to reach an LLM.
//! It picks a backend for every call from the configured credentials, and keeps two
//! outcomes strictly apart:
//!
//! - a missing credential is a *result* ([`Generation::Unconfigured`]) carrying a
//!   human-readable message, so callers can keep going;
//! - a failing request to a configured backend is an *error* ([`GatewayError`]).
//!
//! Text fallback: a request for OpenAI without an OpenAI key is rerouted to Google,
//! then Anthropic. Requests naming Google or Anthropic are never rerouted.
//!
//! Image fallback walks OpenAI, Google, Anthropic and uses the first backend that
//! is configured and accepts the image encoding:
//!
//! | Backend   | Accepted encodings                          |
//! |-----------|---------------------------------------------|
//! | OpenAI    | inline base64, remote URL                   |
//! | Google    | inline base64                               |
//! | Anthropic | inline base64 in jpeg, png, gif or webp     |

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use plume_abstraction::{
    ChatMessage, ContentBlock, ImageSource, MessageContent, Model, ModelError, ModelParameters,
    Provider,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{ClaudeModel, GeminiModel, ModelConfig, ModelFactory, OpenAIModel};

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
/// Default Gemini model, also substituted for non-Gemini model ids sent to Google.
pub const DEFAULT_GOOGLE_MODEL: &str = "gemini-3-flash-preview";
/// Default Claude model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-sonnet-20240229";
/// System prompt used when the caller has nothing more specific.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful social media assistant.";

const ANTHROPIC_MAX_TOKENS: u32 = 1024;
const VISION_MAX_TOKENS: u32 = 500;
const UNSUPPORTED_PROVIDER: &str = "Unsupported provider.";
const NO_VISION_PROVIDER: &str =
    "No vision provider configured for this image (OpenAI, Google or Anthropic).";
const NO_VISION_FORMAT: &str = "Image format not supported by any configured vision provider.";

/// Credentials for one backend.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredential {
    /// API key sent with every request.
    pub api_key: String,
    /// Optional API root override.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderCredential {
    /// A credential for the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: None }
    }

    /// Sends requests to `base_url` instead of the public endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Which backends have credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    /// OpenAI credentials (primary).
    pub openai: Option<ProviderCredential>,
    /// Google credentials (secondary).
    pub google: Option<ProviderCredential>,
    /// Anthropic credentials (tertiary).
    pub anthropic: Option<ProviderCredential>,
}

impl ProviderCredentials {
    /// Returns the credential for `provider`, if configured.
    pub fn get(&self, provider: Provider) -> Option<&ProviderCredential> {
        match provider {
            Provider::OpenAI => self.openai.as_ref(),
            Provider::Google => self.google.as_ref(),
            Provider::Anthropic => self.anthropic.as_ref(),
        }
    }

    /// Whether `provider` has a credential.
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.get(provider).is_some()
    }

    /// Configured providers in fallback order.
    pub fn configured(&self) -> Vec<Provider> {
        Provider::ALL.into_iter().filter(|p| self.is_configured(*p)).collect()
    }
}

/// The (provider, model) pair a caller asks for.
///
/// The provider stays a free-form string: an unknown name is a soft failure, not a
/// parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Requested provider name.
    pub provider: String,
    /// Requested model id.
    pub model: String,
}

impl ProviderSpec {
    /// Creates a spec.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self { provider: provider.into(), model: model.into() }
    }
}

impl Default for ProviderSpec {
    fn default() -> Self {
        Self::new(Provider::OpenAI.as_str(), DEFAULT_OPENAI_MODEL)
    }
}

/// Where a text request will actually go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Call this backend with this model.
    Dispatch {
        /// Selected backend.
        provider: Provider,
        /// Model id after any rewrite.
        model: String,
    },
    /// No backend can serve the request; the message is the result.
    Unconfigured(String),
}

/// Whether dispatching to `provider` differs from what `spec` asked for.
///
/// Aliases such as `gemini` or `claude` name the same provider.
fn is_fallback(spec: &ProviderSpec, provider: Provider) -> bool {
    Provider::from_str(&spec.provider).is_ok_and(|requested| requested != provider)
}

/// Applies the text fallback policy. Pure: the same spec and credentials always
/// produce the same route.
pub fn route_text(spec: &ProviderSpec, credentials: &ProviderCredentials) -> Route {
    let Ok(requested) = Provider::from_str(&spec.provider) else {
        return Route::Unconfigured(UNSUPPORTED_PROVIDER.to_string());
    };

    let needs_fallback = requested == Provider::OpenAI && !credentials.is_configured(requested);
    let (provider, model) = if needs_fallback {
        if credentials.is_configured(Provider::Google) {
            (Provider::Google, DEFAULT_GOOGLE_MODEL.to_string())
        } else if credentials.is_configured(Provider::Anthropic) {
            (Provider::Anthropic, DEFAULT_ANTHROPIC_MODEL.to_string())
        } else {
            (requested, spec.model.clone())
        }
    } else {
        (requested, spec.model.clone())
    };

    if !credentials.is_configured(provider) {
        return Route::Unconfigured(unconfigured_message(provider));
    }

    let model = if provider == Provider::Google && !model.starts_with("gemini") {
        DEFAULT_GOOGLE_MODEL.to_string()
    } else {
        model
    };

    Route::Dispatch { provider, model }
}

fn unconfigured_message(provider: Provider) -> String {
    format!("{} API key not configured.", provider.display_name())
}

/// An image ready to be sent to a multimodal backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Payload location.
    pub source: ImageSource,
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
}

impl ImageInput {
    /// Wraps raw bytes as an inline image.
    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            source: ImageSource::Base64 { data: STANDARD.encode(bytes) },
            media_type: media_type.into(),
        }
    }

    /// Parses either a `data:<type>;base64,<payload>` URI or a remote URL.
    ///
    /// # Errors
    /// Returns `ModelError::UnsupportedContentType` for a `data:` URI that is not
    /// base64-encoded.
    pub fn parse(uri: &str) -> Result<Self, ModelError> {
        let Some(rest) = uri.strip_prefix("data:") else {
            return Ok(Self {
                source: ImageSource::Url { url: uri.to_string() },
                media_type: "application/octet-stream".to_string(),
            });
        };

        let (header, data) = rest.split_once(',').unwrap_or((rest, ""));
        let Some(media_type) = header.strip_suffix(";base64") else {
            return Err(ModelError::UnsupportedContentType {
                content_type: format!("data URI ({header})"),
                model: "gateway".to_string(),
            });
        };

        Ok(Self {
            source: ImageSource::Base64 { data: data.to_string() },
            media_type: media_type.to_string(),
        })
    }

    /// Renders the image as a URI (a `data:` URI for inline payloads).
    pub fn to_uri(&self) -> String {
        match &self.source {
            ImageSource::Base64 { data } => format!("data:{};base64,{data}", self.media_type),
            ImageSource::Url { url } => url.clone(),
        }
    }

    fn accepted_by(&self, provider: Provider) -> bool {
        match provider {
            Provider::OpenAI => OpenAIModel::accepts_image(&self.source, &self.media_type),
            Provider::Google => GeminiModel::accepts_image(&self.source, &self.media_type),
            Provider::Anthropic => ClaudeModel::accepts_image(&self.source, &self.media_type),
        }
    }
}

/// Outcome of a gateway call that did not hit a transport or API failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generation {
    /// A backend produced content.
    Generated {
        /// Generated text.
        content: String,
        /// Backend that served the call.
        provider: Provider,
        /// Model that served the call.
        model: String,
    },
    /// No backend was available; the message explains why.
    Unconfigured {
        /// Explanation suitable for showing to a user.
        message: String,
    },
}

impl Generation {
    /// The text of this outcome, whichever kind it is.
    pub fn text(&self) -> &str {
        match self {
            Self::Generated { content, .. } => content,
            Self::Unconfigured { message } => message,
        }
    }

    /// Consumes the outcome, returning its text.
    pub fn into_text(self) -> String {
        match self {
            Self::Generated { content, .. } => content,
            Self::Unconfigured { message } => message,
        }
    }

    /// Backend that served the call, if any.
    pub fn provider(&self) -> Option<Provider> {
        match self {
            Self::Generated { provider, .. } => Some(*provider),
            Self::Unconfigured { .. } => None,
        }
    }

    /// Whether a backend produced this outcome.
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }
}

/// A configured backend failed.
#[derive(Debug, Clone, Error)]
#[error("{provider} request with model '{model}' failed: {source}")]
pub struct GatewayError {
    /// The backend that failed.
    pub provider: Provider,
    /// The model that was requested.
    pub model: String,
    /// Underlying model error.
    #[source]
    pub source: ModelError,
}

/// Text and image generation across providers.
#[async_trait]
pub trait LanguageGateway: Send + Sync {
    /// Generates text for `prompt` under `system_prompt`, routed per `spec`.
    ///
    /// # Errors
    /// Returns `GatewayError` only when a configured backend fails.
    async fn generate_text(
        &self,
        prompt: &str,
        system_prompt: &str,
        spec: &ProviderSpec,
    ) -> Result<Generation, GatewayError>;

    /// Describes `image` according to `prompt`.
    ///
    /// # Errors
    /// Returns `GatewayError` only when a configured backend fails.
    async fn analyze_image(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<Generation, GatewayError>;
}

/// The production gateway: credentials plus one shared HTTP client.
#[derive(Debug, Clone)]
pub struct ProviderGateway {
    credentials: ProviderCredentials,
    client: Client,
}

impl ProviderGateway {
    /// Creates a gateway over `credentials`.
    pub fn new(credentials: ProviderCredentials) -> Self {
        Self { credentials, client: Client::new() }
    }

    /// Creates a gateway that reuses `client`.
    pub fn with_client(credentials: ProviderCredentials, client: Client) -> Self {
        Self { credentials, client }
    }

    /// The credentials this gateway routes with.
    pub fn credentials(&self) -> &ProviderCredentials {
        &self.credentials
    }

    fn model_for(
        &self,
        provider: Provider,
        model: &str,
    ) -> Result<Arc<dyn Model + Send + Sync>, GatewayError> {
        let Some(credential) = self.credentials.get(provider) else {
            return Err(GatewayError {
                provider,
                model: model.to_string(),
                source: ModelError::UnsupportedModelProvider(unconfigured_message(provider)),
            });
        };

        let mut config =
            ModelConfig::new(provider.into(), model.to_string(), credential.api_key.clone())
                .with_client(self.client.clone());
        if let Some(base_url) = &credential.base_url {
            config = config.with_base_url(base_url.clone());
        }

        Ok(ModelFactory::create(config))
    }

    async fn dispatch(
        &self,
        provider: Provider,
        model: &str,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<Generation, GatewayError> {
        let backend = self.model_for(provider, model)?;
        let response =
            backend.generate_chat_completion(messages, parameters).await.map_err(|source| {
                error!(
                    provider = %provider,
                    model = %model,
                    error = %source,
                    "Provider call failed"
                );
                GatewayError { provider, model: model.to_string(), source }
            })?;

        Ok(Generation::Generated { content: response.content, provider, model: model.to_string() })
    }
}

#[async_trait]
impl LanguageGateway for ProviderGateway {
    async fn generate_text(
        &self,
        prompt: &str,
        system_prompt: &str,
        spec: &ProviderSpec,
    ) -> Result<Generation, GatewayError> {
        let (provider, model) = match route_text(spec, &self.credentials) {
            Route::Dispatch { provider, model } => (provider, model),
            Route::Unconfigured(message) => {
                warn!(
                    requested_provider = %spec.provider,
                    requested_model = %spec.model,
                    message = %message,
                    "No provider available for text generation"
                );
                return Ok(Generation::Unconfigured { message });
            }
        };

        if is_fallback(spec, provider) {
            info!(
                requested_provider = %spec.provider,
                provider = %provider,
                model = %model,
                "Falling back to another provider"
            );
        }
        debug!(
            provider = %provider,
            model = %model,
            prompt_len = prompt.len(),
            "Dispatching text generation"
        );

        let parameters = (provider == Provider::Anthropic)
            .then(|| ModelParameters::with_max_tokens(ANTHROPIC_MAX_TOKENS));
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(prompt)];

        self.dispatch(provider, &model, &messages, parameters).await
    }

    async fn analyze_image(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<Generation, GatewayError> {
        let mut any_configured = false;

        for provider in Provider::ALL {
            if !self.credentials.is_configured(provider) {
                continue;
            }
            any_configured = true;

            if !image.accepted_by(provider) {
                debug!(
                    provider = %provider,
                    media_type = %image.media_type,
                    "Image encoding not accepted, trying next provider"
                );
                continue;
            }

            let model = vision_model(provider);
            debug!(provider = %provider, model = %model, "Dispatching image analysis");
            let messages = [ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Blocks(vec![
                    ContentBlock::Text { text: prompt.to_string() },
                    ContentBlock::Image {
                        source: image.source.clone(),
                        media_type: image.media_type.clone(),
                    },
                ]),
            }];
            let parameters = Some(ModelParameters::with_max_tokens(VISION_MAX_TOKENS));

            return self.dispatch(provider, model, &messages, parameters).await;
        }

        let message = if any_configured { NO_VISION_FORMAT } else { NO_VISION_PROVIDER };
        warn!(
            media_type = %image.media_type,
            message = %message,
            "No provider available for image analysis"
        );
        Ok(Generation::Unconfigured { message: message.to_string() })
    }
}

fn vision_model(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => DEFAULT_OPENAI_MODEL,
        Provider::Google => DEFAULT_GOOGLE_MODEL,
        Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
    }
}
