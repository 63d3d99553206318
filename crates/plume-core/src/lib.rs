//! Plume Core - social media copy generation.
//!
//! This crate provides:
//! - Platform templates and prompt assembly
//! - A single-call generator and a search/plan/write/edit workflow
//! - Brand knowledge ingestion and retrieval
//! - Image analysis for post ideas
//! - Layered TOML configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use plume_core::{GenerationRequest, PlumeConfig, PlumeServices};
//!
//! #[tokio::main]
//! async fn main() -> plume_core::Result<()> {
//!     let config = PlumeConfig::discover_and_load()?;
//!     let services = PlumeServices::from_config(&config).await?;
//!
//!     let mut request = GenerationRequest::new("instagram", "autumn menu launch");
//!     request.use_agent = true;
//!     let response = services.copy.generate(&request).await?;
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod documents;
pub mod error;
pub mod generator;
pub mod knowledge;
pub mod platform;
pub mod prompts;
pub mod request;
pub mod search;
pub mod services;
pub mod workflow;

pub use config::{ConfigError, PlumeConfig};
pub use context::{ContextAssembler, PromptSection};
pub use documents::{DocumentError, DocumentKind, DocumentProcessor, RecursiveCharacterSplitter};
pub use error::{PlumeError, Result};
pub use generator::{GeneratedCopy, SingleShotGenerator};
pub use knowledge::{
    InMemoryKnowledgeStore, KnowledgeError, KnowledgeStore, Metadata, RetrievedSnippet,
};
pub use platform::Platform;
pub use prompts::{PromptContext, PromptError, PromptTemplate, RenderOptions};
pub use request::{CopyResponse, DEFAULT_STYLE, GenerationRequest};
pub use search::{SearchError, SearchOutcome, SearchProvider, SearchResult, TavilySearch};
pub use services::{
    BrandService, CopyService, PlumeServices, ProviderStatus, StatusReport, VisionService,
};
pub use workflow::{
    AgentState, MAX_REVISIONS, StageUpdate, WorkflowEngine, WorkflowOptions, WorkflowStage,
    merge_trace,
};
