//! Model implementations for Plume.
//!
//! This crate provides concrete implementations of the `Model` trait and the
//! [`ProviderGateway`] that routes generation requests between them.
//!
//! # Supported Providers
//!
//! - **OpenAI**: primary backend for text and images
//! - **Gemini**: secondary backend (Google), inline images only
//! - **Claude**: tertiary backend (Anthropic), inline jpeg/png/gif/webp images

pub mod claude;
pub mod factory;
pub mod gateway;
pub mod gemini;
pub mod openai;

pub use claude::ClaudeModel;
pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use gateway::{
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_GOOGLE_MODEL, DEFAULT_OPENAI_MODEL, DEFAULT_SYSTEM_PROMPT,
    GatewayError, Generation, ImageInput, LanguageGateway, ProviderCredential,
    ProviderCredentials, ProviderGateway, ProviderSpec, Route, route_text,
};
pub use gemini::GeminiModel;
pub use openai::OpenAIModel;
