//! High-level operations behind the `plume` command line.
//!
//! [`PlumeServices::from_config`] wires every collaborator from a
//! [`PlumeConfig`]; callers needing custom backends construct the individual
//! services directly.

mod brand;
mod copy;
mod status;
mod vision;

pub use brand::BrandService;
pub use copy::CopyService;
pub use status::{ProviderStatus, StatusReport};
pub use vision::{DEFAULT_VISION_PROMPT, IMAGE_EXTENSIONS, VisionService};

use std::sync::Arc;

use plume_models::{LanguageGateway, ProviderGateway};
use tracing::debug;

use crate::config::PlumeConfig;
use crate::documents::{DocumentProcessor, RecursiveCharacterSplitter};
use crate::error::Result;
use crate::knowledge::{InMemoryKnowledgeStore, KnowledgeStore};
use crate::search::{SearchProvider, TavilySearch};

/// Every service, sharing one gateway, search client and knowledge store.
pub struct PlumeServices {
    /// Copy generation.
    pub copy: CopyService,
    /// Brand document ingestion and lookup.
    pub brand: BrandService,
    /// Image analysis.
    pub vision: VisionService,
    /// Backend status at construction time.
    pub status: StatusReport,
}

impl PlumeServices {
    /// Builds the services described by `config`.
    ///
    /// Opens the knowledge store file, creating nothing until the first ingest.
    pub async fn from_config(config: &PlumeConfig) -> Result<Self> {
        let gateway: Arc<dyn LanguageGateway> =
            Arc::new(ProviderGateway::new(config.credentials()));

        let mut tavily = TavilySearch::new(config.search_api_key().map(str::to_string))
            .with_search_depth(config.search_depth());
        let base_url = config.search.base_url.as_deref().filter(|u| !u.trim().is_empty());
        if let Some(base_url) = base_url {
            tavily = tavily.with_base_url(base_url);
        }
        let search: Arc<dyn SearchProvider> = Arc::new(tavily);

        let store_path = config.store_path();
        let knowledge: Arc<dyn KnowledgeStore> =
            Arc::new(InMemoryKnowledgeStore::open(&store_path).await?);
        debug!(
            store_path = %store_path.display(),
            collection = %config.collection(),
            "Knowledge store ready"
        );

        let processor = DocumentProcessor::new(RecursiveCharacterSplitter::new(
            config.chunk_size(),
            config.chunk_overlap(),
        ));

        Ok(Self {
            copy: CopyService::new(Arc::clone(&gateway), search, Arc::clone(&knowledge))
                .with_collection(config.collection())
                .with_retrieval_limit(config.retrieval_limit()),
            brand: BrandService::new(knowledge, processor).with_collection(config.collection()),
            vision: VisionService::new(gateway),
            status: StatusReport::from_config(config),
        })
    }
}
