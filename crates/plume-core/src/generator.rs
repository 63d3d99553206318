//! Single-call copy generation.

use std::sync::Arc;

use plume_models::{DEFAULT_SYSTEM_PROMPT, Generation, LanguageGateway};
use tracing::{debug, warn};

use crate::context::ContextAssembler;
use crate::error::{PlumeError, Result};
use crate::platform::Platform;
use crate::request::GenerationRequest;
use crate::search::{SEARCH_UNCONFIGURED, SearchOutcome, SearchProvider};

const SINGLE_PASS_COMPLETED: &str = "Single-pass generation completed.";

/// Copy text plus the trace of how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCopy {
    /// Post text.
    pub content: String,
    /// Ordered trace entries.
    pub logs: Vec<String>,
}

/// Builds one prompt and makes exactly one gateway call.
pub struct SingleShotGenerator {
    gateway: Arc<dyn LanguageGateway>,
    search: Arc<dyn SearchProvider>,
    assembler: ContextAssembler,
}

impl SingleShotGenerator {
    /// Creates a generator over the given collaborators.
    pub fn new(gateway: Arc<dyn LanguageGateway>, search: Arc<dyn SearchProvider>) -> Self {
        Self { gateway, search, assembler: ContextAssembler::new() }
    }

    /// Generates copy for `request` on `platform`.
    ///
    /// When `request.use_search` is set the topic itself is the search query.
    /// An unconfigured search backend only adds a trace entry.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        platform: Platform,
        brand_context: &str,
    ) -> Result<GeneratedCopy> {
        let mut logs = Vec::new();

        let search_context = if request.use_search {
            match self.search.search(&request.topic).await? {
                SearchOutcome::Results(results) => results,
                SearchOutcome::Unconfigured(message) => {
                    warn!(message = %message, "Skipping web search");
                    logs.push(SEARCH_UNCONFIGURED.to_string());
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let prompt = self.assembler.build_prompt(
            platform.template(),
            &request.topic,
            &request.style,
            brand_context,
            &search_context,
        )?;

        let spec = request.provider_spec();
        debug!(
            platform = %platform,
            provider = %spec.provider,
            model = %spec.model,
            "Single-pass generation"
        );

        let generation = self
            .gateway
            .generate_text(&prompt, DEFAULT_SYSTEM_PROMPT, &spec)
            .await
            .map_err(|e| PlumeError::upstream("generator", e))?;
        if let Generation::Unconfigured { message } = &generation {
            warn!(message = %message, "Generation ran without a configured provider");
        }

        logs.push(SINGLE_PASS_COMPLETED.to_string());
        Ok(GeneratedCopy { content: generation.into_text(), logs })
    }
}
