//! Error types for Plume Core.

use plume_abstraction::{ModelError, Provider};
use plume_models::GatewayError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::documents::DocumentError;
use crate::knowledge::KnowledgeError;
use crate::prompts::PromptError;
use crate::search::SearchError;

/// Core error type for Plume operations.
#[derive(Error, Debug)]
pub enum PlumeError {
    /// The requested platform has no template.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A file or image extension outside the accepted set.
    #[error("Unsupported input format: {0}")]
    UnsupportedInputFormat(String),

    /// A configured provider failed while serving a stage.
    #[error("{stage} call to {provider} ({model}) failed: {source}")]
    Upstream {
        /// Stage that issued the call.
        stage: String,
        /// Provider that failed.
        provider: Provider,
        /// Model that was requested.
        model: String,
        /// Underlying model error.
        #[source]
        source: ModelError,
    },

    /// Web search errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Knowledge store errors
    #[error("Knowledge store error: {0}")]
    Knowledge(#[from] KnowledgeError),

    /// Document loading errors
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled before it finished.
    #[error("Operation cancelled")]
    Cancelled,
}

impl PlumeError {
    /// Wraps a gateway failure with the stage that triggered it.
    pub fn upstream(stage: impl Into<String>, err: GatewayError) -> Self {
        Self::Upstream {
            stage: stage.into(),
            provider: err.provider,
            model: err.model,
            source: err.source,
        }
    }
}

/// Result type alias for Plume operations.
pub type Result<T> = std::result::Result<T, PlumeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plume_error_upstream_names_stage_and_provider() {
        let gateway_err = GatewayError {
            provider: Provider::Google,
            model: "gemini-3-flash-preview".to_string(),
            source: ModelError::RequestError("connection reset".to_string()),
        };
        let err = PlumeError::upstream("planner", gateway_err);
        match &err {
            PlumeError::Upstream { stage, provider, .. } => {
                assert_eq!(stage, "planner");
                assert_eq!(*provider, Provider::Google);
            }
            _ => panic!("Expected Upstream error variant"),
        }
        let msg = err.to_string();
        assert!(msg.contains("planner"));
        assert!(msg.contains("google"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_plume_error_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let plume_err: PlumeError = io_err.into();
        match plume_err {
            PlumeError::Io(_) => {}
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_plume_error_display() {
        let err = PlumeError::UnsupportedPlatform("tiktok".to_string());
        assert_eq!(err.to_string(), "Unsupported platform: tiktok");

        let err = PlumeError::UnsupportedInputFormat("bmp".to_string());
        assert!(err.to_string().contains("bmp"));

        assert_eq!(PlumeError::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_plume_error_from_document_error() {
        let err: PlumeError = DocumentError::UnsupportedFormat("docx".to_string()).into();
        match err {
            PlumeError::Document(DocumentError::UnsupportedFormat(ext)) => assert_eq!(ext, "docx"),
            _ => panic!("Expected Document error variant"),
        }
    }
}
