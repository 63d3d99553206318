//! Brand knowledge retrieval.
//!
//! [`KnowledgeStore`] is the seam between Plume and whatever holds brand
//! documents. The bundled [`InMemoryKnowledgeStore`] ranks by character-bigram
//! overlap and can persist to a JSON file.

mod memory;

pub use memory::InMemoryKnowledgeStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Free-form metadata attached to a stored document.
pub type Metadata = BTreeMap<String, String>;

/// A document returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    /// Document text.
    pub content: String,
    /// Where the text came from (usually a file name).
    pub source: String,
}

/// Knowledge store errors.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// `texts` and `metadata` must pair up one to one.
    #[error("{texts} texts but {metadata} metadata entries")]
    MetadataMismatch {
        /// Number of texts supplied.
        texts: usize,
        /// Number of metadata entries supplied.
        metadata: usize,
    },

    /// Backing file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not valid JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage and similarity lookup for brand documents.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Adds `texts` to `collection`, pairing each with the matching `metadata` entry.
    async fn add_documents(
        &self,
        collection: &str,
        texts: Vec<String>,
        metadata: Vec<Metadata>,
    ) -> Result<(), KnowledgeError>;

    /// Returns at most `limit` documents most similar to `query`, best first.
    async fn query_similar(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedSnippet>, KnowledgeError>;
}
