//! Configuration file support.
//!
//! Settings come from up to three layers, later layers winning:
//! 1. Global config (`~/.plume/config.toml`)
//! 2. Local config (`./plume.toml`)
//! 3. Environment variables (`OPENAI_API_KEY`, `GOOGLE_API_KEY`, ...)
//!
//! Empty strings are treated as unset at every layer.

use plume_abstraction::Provider;
use plume_models::{ProviderCredential, ProviderCredentials};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default knowledge collection.
pub const DEFAULT_COLLECTION: &str = "brand_knowledge";
/// Default number of snippets retrieved per query.
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 3;
/// Default chunk size, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between neighbouring chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default Tavily search depth.
pub const DEFAULT_SEARCH_DEPTH: &str = "basic";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Credentials for one LLM backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// API root override (proxies, self-hosted gateways)
    #[serde(default)]
    pub base_url: Option<String>,
}

/// The `[providers]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Primary backend
    #[serde(default)]
    pub openai: ProviderEntry,

    /// Secondary backend
    #[serde(default)]
    pub google: ProviderEntry,

    /// Tertiary backend
    #[serde(default)]
    pub anthropic: ProviderEntry,
}

impl ProvidersConfig {
    fn entry(&self, provider: Provider) -> &ProviderEntry {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Google => &self.google,
            Provider::Anthropic => &self.anthropic,
        }
    }

    fn entry_mut(&mut self, provider: Provider) -> &mut ProviderEntry {
        match provider {
            Provider::OpenAI => &mut self.openai,
            Provider::Google => &mut self.google,
            Provider::Anthropic => &mut self.anthropic,
        }
    }
}

/// The `[search]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Tavily API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// API root override
    #[serde(default)]
    pub base_url: Option<String>,

    /// "basic" or "advanced"
    #[serde(default)]
    pub search_depth: Option<String>,
}

/// The `[knowledge]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// JSON file backing the knowledge store
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Collection brand documents go into
    #[serde(default)]
    pub collection: Option<String>,

    /// Snippets retrieved per query
    #[serde(default)]
    pub limit: Option<usize>,
}

/// The `[documents]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Maximum chunk length, in characters
    #[serde(default)]
    pub chunk_size: Option<usize>,

    /// Overlap between neighbouring chunks, in characters
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
}

/// Plume configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlumeConfig {
    /// LLM backends
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Web search
    #[serde(default)]
    pub search: SearchConfig,

    /// Brand knowledge store
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Document chunking
    #[serde(default)]
    pub documents: DocumentsConfig,
}

impl PlumeConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".plume").join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from("plume.toml")
    }

    /// Discover and load configuration files from their default locations.
    ///
    /// Missing files are skipped; malformed files are errors.
    pub fn discover_and_load() -> ConfigResult<Self> {
        Self::discover_and_load_from(&Self::default_global_path(), &Self::default_local_path())
    }

    /// Loads `global` then `local`, the latter overriding the former, and validates the result.
    pub fn discover_and_load_from(global: &Path, local: &Path) -> ConfigResult<Self> {
        let mut config = Self::default();
        for path in [global, local] {
            match Self::load_from_file(path) {
                Ok(layer) => config.merge(&layer),
                Err(ConfigError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are set.
    pub fn merge(&mut self, other: &Self) {
        for provider in Provider::ALL {
            let theirs = other.providers.entry(provider);
            let ours = self.providers.entry_mut(provider);
            override_with(&mut ours.api_key, theirs.api_key.as_ref());
            override_with(&mut ours.base_url, theirs.base_url.as_ref());
        }

        override_with(&mut self.search.api_key, other.search.api_key.as_ref());
        override_with(&mut self.search.base_url, other.search.base_url.as_ref());
        override_with(&mut self.search.search_depth, other.search.search_depth.as_ref());

        override_with(&mut self.knowledge.store_path, other.knowledge.store_path.as_ref());
        override_with(&mut self.knowledge.collection, other.knowledge.collection.as_ref());
        override_with(&mut self.knowledge.limit, other.knowledge.limit.as_ref());

        override_with(&mut self.documents.chunk_size, other.documents.chunk_size.as_ref());
        override_with(&mut self.documents.chunk_overlap, other.documents.chunk_overlap.as_ref());
    }

    /// Overrides API keys from the process environment.
    #[allow(clippy::disallowed_methods)] // env::var is needed for API key loading
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Overrides API keys using `lookup` as the environment.
    ///
    /// `GOOGLE_API_KEY` wins over `GEMINI_API_KEY`; empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.providers.openai.api_key = Some(key);
        }
        if let Some(key) = non_empty("GOOGLE_API_KEY").or_else(|| non_empty("GEMINI_API_KEY")) {
            self.providers.google.api_key = Some(key);
        }
        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.providers.anthropic.api_key = Some(key);
        }
        if let Some(key) = non_empty("TAVILY_API_KEY") {
            self.search.api_key = Some(key);
        }
    }

    /// Rejects chunking settings the splitter cannot honour.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.documents.chunk_size == Some(0) {
            return Err(ConfigError::InvalidValue("documents.chunk_size must be positive".into()));
        }
        if self.chunk_overlap() >= self.chunk_size() {
            return Err(ConfigError::InvalidValue(format!(
                "documents.chunk_overlap ({}) must be smaller than documents.chunk_size ({})",
                self.chunk_overlap(),
                self.chunk_size()
            )));
        }
        if self.knowledge.limit == Some(0) {
            return Err(ConfigError::InvalidValue("knowledge.limit must be positive".into()));
        }
        Ok(())
    }

    /// Credentials for every backend with a non-empty API key.
    pub fn credentials(&self) -> ProviderCredentials {
        let credential = |entry: &ProviderEntry| {
            non_blank(entry.api_key.as_deref()).map(|key| ProviderCredential {
                api_key: key.to_string(),
                base_url: non_blank(entry.base_url.as_deref()).map(str::to_string),
            })
        };
        ProviderCredentials {
            openai: credential(&self.providers.openai),
            google: credential(&self.providers.google),
            anthropic: credential(&self.providers.anthropic),
        }
    }

    /// Tavily API key, if set.
    pub fn search_api_key(&self) -> Option<&str> {
        non_blank(self.search.api_key.as_deref())
    }

    /// Tavily search depth.
    pub fn search_depth(&self) -> &str {
        non_blank(self.search.search_depth.as_deref()).unwrap_or(DEFAULT_SEARCH_DEPTH)
    }

    /// Collection brand documents are stored in.
    pub fn collection(&self) -> &str {
        non_blank(self.knowledge.collection.as_deref()).unwrap_or(DEFAULT_COLLECTION)
    }

    /// Snippets retrieved per query.
    pub fn retrieval_limit(&self) -> usize {
        self.knowledge.limit.unwrap_or(DEFAULT_RETRIEVAL_LIMIT)
    }

    /// Chunk size for the document splitter.
    pub fn chunk_size(&self) -> usize {
        self.documents.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    /// Chunk overlap for the document splitter.
    pub fn chunk_overlap(&self) -> usize {
        self.documents.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP)
    }

    /// Knowledge store file, defaulting to `~/.plume/knowledge.json`.
    pub fn store_path(&self) -> PathBuf {
        self.knowledge.store_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".plume")
                .join("knowledge.json")
        })
    }
}

fn override_with<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
