//! Copy generation request and response.

use plume_models::{DEFAULT_OPENAI_MODEL, ProviderSpec};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::platform::Platform;

/// Style used when the caller does not give one.
pub const DEFAULT_STYLE: &str = "professional and friendly";

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

fn default_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

const fn default_true() -> bool {
    true
}

/// A request for one piece of social copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Target platform name (facebook, instagram or threads; any case).
    pub platform: String,
    /// What the post is about.
    pub topic: String,
    /// Desired tone.
    #[serde(default = "default_style")]
    pub style: String,
    /// Model hint.
    #[serde(default = "default_model")]
    pub model: String,
    /// Provider hint.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Ground the copy in brand knowledge.
    #[serde(default = "default_true")]
    pub use_rag: bool,
    /// Run the plan/write/edit workflow instead of a single call.
    #[serde(default)]
    pub use_agent: bool,
    /// Include live web search results.
    #[serde(default)]
    pub use_search: bool,
}

impl GenerationRequest {
    /// A request with default style, model, provider and flags.
    pub fn new(platform: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            topic: topic.into(),
            style: default_style(),
            model: default_model(),
            provider: default_provider(),
            use_rag: true,
            use_agent: false,
            use_search: false,
        }
    }

    /// Validates and returns the target platform.
    pub fn platform(&self) -> Result<Platform> {
        self.platform.parse()
    }

    /// The provider/model pair to route with.
    pub fn provider_spec(&self) -> ProviderSpec {
        ProviderSpec::new(self.provider.clone(), self.model.clone())
    }
}

/// Result of a copy generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyResponse {
    /// The post text.
    pub content: String,
    /// Brand snippets that grounded the post.
    #[serde(default)]
    pub context_used: Vec<String>,
    /// Ordered trace of what happened.
    #[serde(default)]
    pub logs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"platform":"Facebook","topic":"tea"}"#).unwrap();
        assert_eq!(request, GenerationRequest::new("Facebook", "tea"));
        assert_eq!(request.style, "professional and friendly");
        assert_eq!(request.provider_spec(), ProviderSpec::new("openai", "gpt-4o"));
        assert!(request.use_rag);
        assert!(!request.use_agent);
        assert!(!request.use_search);
        assert_eq!(request.platform().unwrap(), Platform::Facebook);
    }

    #[test]
    fn test_response_shape() {
        let response = CopyResponse {
            content: "Hi".to_string(),
            context_used: vec![],
            logs: vec!["Single-pass generation completed.".to_string()],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "content": "Hi",
                "context_used": [],
                "logs": ["Single-pass generation completed."]
            })
        );
    }
}
