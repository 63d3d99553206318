//! Copy generation service.
//!
//! Validates the request, retrieves brand context, then runs either the
//! single-call path or the draft/critique workflow.

use std::sync::Arc;

use plume_models::LanguageGateway;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{DEFAULT_COLLECTION, DEFAULT_RETRIEVAL_LIMIT};
use crate::error::{PlumeError, Result};
use crate::generator::SingleShotGenerator;
use crate::knowledge::KnowledgeStore;
use crate::request::{CopyResponse, GenerationRequest};
use crate::search::SearchProvider;
use crate::workflow::{AgentState, WorkflowEngine, WorkflowOptions};

/// Generates social copy from a [`GenerationRequest`].
pub struct CopyService {
    knowledge: Arc<dyn KnowledgeStore>,
    generator: SingleShotGenerator,
    engine: WorkflowEngine,
    collection: String,
    retrieval_limit: usize,
}

impl CopyService {
    /// Creates a service that retrieves from the default collection.
    ///
    /// # Arguments
    /// * `gateway` - LLM access shared by both generation paths
    /// * `search` - Web search backend
    /// * `knowledge` - Brand knowledge store
    pub fn new(
        gateway: Arc<dyn LanguageGateway>,
        search: Arc<dyn SearchProvider>,
        knowledge: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self {
            knowledge,
            generator: SingleShotGenerator::new(Arc::clone(&gateway), Arc::clone(&search)),
            engine: WorkflowEngine::new(gateway, search),
            collection: DEFAULT_COLLECTION.to_string(),
            retrieval_limit: DEFAULT_RETRIEVAL_LIMIT,
        }
    }

    /// Retrieves brand context from `collection`.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Retrieves at most `limit` snippets per request.
    #[must_use]
    pub fn with_retrieval_limit(mut self, limit: usize) -> Self {
        self.retrieval_limit = limit;
        self
    }

    /// Generates copy for `request`.
    ///
    /// # Errors
    /// `UnsupportedPlatform` before any other work, then knowledge, search and
    /// upstream failures as they happen.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<CopyResponse> {
        self.generate_with_cancel(request, &CancellationToken::new()).await
    }

    /// Like [`generate`](Self::generate), aborting with `Cancelled` when `cancel` fires.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<CopyResponse> {
        let platform = request.platform()?;
        info!(
            platform = %platform,
            topic = %request.topic,
            use_rag = request.use_rag,
            use_agent = request.use_agent,
            use_search = request.use_search,
            "Generating copy"
        );

        let context_used: Vec<String> = if request.use_rag {
            let snippets = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(PlumeError::Cancelled),
                snippets = self.knowledge.query_similar(
                    &self.collection,
                    &request.topic,
                    self.retrieval_limit,
                ) => snippets?,
            };
            snippets.into_iter().map(|snippet| snippet.content).collect()
        } else {
            Vec::new()
        };
        debug!(snippets = context_used.len(), "Retrieved brand context");
        let brand_context = context_used.join("\n");

        let (content, logs) = if request.use_agent {
            let mut state =
                AgentState::new(platform, &request.topic, &request.style, brand_context);
            let options = WorkflowOptions {
                use_search: request.use_search,
                provider: request.provider_spec(),
            };
            self.engine.run(&mut state, &options, cancel).await?;
            let content = state.final_copy.unwrap_or(state.draft);
            (content, state.trace)
        } else {
            let copy = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(PlumeError::Cancelled),
                copy = self.generator.generate(request, platform, &brand_context) => copy?,
            };
            (copy.content, copy.logs)
        };

        Ok(CopyResponse { content, context_used, logs })
    }
}
