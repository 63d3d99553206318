use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{KnowledgeError, KnowledgeStore, Metadata, RetrievedSnippet};

const SOURCE_KEY: &str = "source";
const UNKNOWN_SOURCE: &str = "unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    content: String,
    #[serde(default)]
    metadata: Metadata,
}

type Collections = HashMap<String, Vec<StoredDocument>>;

/// In-process knowledge store.
///
/// Documents are ranked by the share of the query's character bigrams they
/// contain, which works for both space-delimited and CJK text. Documents with no
/// overlap are never returned. Ties keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeStore {
    collections: RwLock<Collections>,
    path: Option<PathBuf>,
}

impl InMemoryKnowledgeStore {
    /// An empty store that lives only as long as the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store persisted at `path`, starting empty if the file does not exist.
    ///
    /// Every successful `add_documents` rewrites the file. A failed write leaves
    /// both the file and the in-memory documents unchanged.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, KnowledgeError> {
        let path = path.into();
        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collections::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), collections = collections.len(), "Opened knowledge store");
        Ok(Self { collections: RwLock::new(collections), path: Some(path) })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections.read().await.get(collection).map_or(0, Vec::len)
    }

    /// Whether `collection` holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    async fn persist(&self, collections: &Collections) -> Result<(), KnowledgeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(collections)?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        if let Err(e) = tokio::fs::rename(&staging, path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn add_documents(
        &self,
        collection: &str,
        texts: Vec<String>,
        metadata: Vec<Metadata>,
    ) -> Result<(), KnowledgeError> {
        if texts.len() != metadata.len() {
            return Err(KnowledgeError::MetadataMismatch {
                texts: texts.len(),
                metadata: metadata.len(),
            });
        }

        let added = texts.len();
        let mut collections = self.collections.write().await;
        let mut staged = collections.clone();
        staged.entry(collection.to_string()).or_default().extend(
            texts.into_iter().zip(metadata).map(|(content, metadata)| StoredDocument {
                content,
                metadata,
            }),
        );
        self.persist(&staged).await?;
        *collections = staged;

        info!(collection = %collection, added, "Added documents to knowledge store");
        Ok(())
    }

    async fn query_similar(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedSnippet>, KnowledgeError> {
        let query_grams = bigrams(query);
        if query_grams.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            debug!(collection = %collection, "Query against empty collection");
            return Ok(Vec::new());
        };

        let mut scored: Vec<(usize, &StoredDocument)> = documents
            .iter()
            .map(|doc| (bigrams(&doc.content).intersection(&query_grams).count(), doc))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let snippets: Vec<RetrievedSnippet> = scored
            .into_iter()
            .take(limit)
            .map(|(_, doc)| RetrievedSnippet {
                content: doc.content.clone(),
                source: doc
                    .metadata
                    .get(SOURCE_KEY)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            })
            .collect();

        debug!(collection = %collection, hits = snippets.len(), "Knowledge query complete");
        Ok(snippets)
    }
}

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    match chars.as_slice() {
        [] => HashSet::new(),
        [only] => HashSet::from([(*only, *only)]),
        _ => chars.windows(2).map(|w| (w[0], w[1])).collect(),
    }
}
