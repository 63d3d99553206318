//! Brand knowledge ingestion and lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{DEFAULT_COLLECTION, DEFAULT_RETRIEVAL_LIMIT};
use crate::documents::{DocumentKind, DocumentProcessor};
use crate::error::{PlumeError, Result};
use crate::knowledge::{KnowledgeStore, Metadata, RetrievedSnippet};

/// Feeds brand documents into a [`KnowledgeStore`] and searches them.
pub struct BrandService {
    knowledge: Arc<dyn KnowledgeStore>,
    processor: DocumentProcessor,
    collection: String,
}

impl BrandService {
    /// Creates a service writing to the default collection.
    pub fn new(knowledge: Arc<dyn KnowledgeStore>, processor: DocumentProcessor) -> Self {
        Self { knowledge, processor, collection: DEFAULT_COLLECTION.to_string() }
    }

    /// Uses `collection` instead of the default.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Chunks the file at `path` and stores every chunk tagged with its file name.
    ///
    /// # Returns
    /// The number of chunks stored.
    ///
    /// # Errors
    /// `UnsupportedInputFormat` for anything but pdf, txt or csv, checked before
    /// the file is opened.
    pub async fn ingest(&self, path: &Path) -> Result<usize> {
        let kind = DocumentKind::from_path(path).map_err(|_| {
            PlumeError::UnsupportedInputFormat(format!(
                "{} (accepted: {})",
                path.display(),
                DocumentKind::EXTENSIONS.join(", ")
            ))
        })?;

        let processor = self.processor;
        let owned: PathBuf = path.to_path_buf();
        let chunks = tokio::task::spawn_blocking(move || processor.process_file(&owned))
            .await
            .map_err(|e| PlumeError::Io(std::io::Error::other(e)))??;

        if chunks.is_empty() {
            warn!(path = %path.display(), "Document produced no text");
            return Ok(0);
        }

        let source = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let metadata: Vec<Metadata> = chunks
            .iter()
            .map(|_| Metadata::from([("source".to_string(), source.clone())]))
            .collect();
        let count = chunks.len();

        self.knowledge.add_documents(&self.collection, chunks, metadata).await?;
        info!(
            source = %source,
            kind = %kind,
            chunks = count,
            collection = %self.collection,
            "Ingested brand document"
        );
        Ok(count)
    }

    /// Returns up to `limit` snippets most similar to `query`.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<RetrievedSnippet>> {
        let limit = limit.unwrap_or(DEFAULT_RETRIEVAL_LIMIT);
        Ok(self.knowledge.query_similar(&self.collection, query, limit).await?)
    }
}
