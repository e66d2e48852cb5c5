//! TOML configuration.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working configuration. [`load_config`] parses and validates a file;
//! [`Config::apply_overrides`] layers the embedding environment variables on
//! top once at startup.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::DistanceMetric;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/rag.sqlite")
}

/// Vector store schema settings. Fixed for the lifetime of a database.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            dims: default_dims(),
            metric: DistanceMetric::default(),
        }
    }
}

fn default_table() -> String {
    "documents".to_string()
}
fn default_dims() -> usize {
    1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: Option<String>,
    #[serde(default)]
    pub prefix_query: String,
    #[serde(default)]
    pub prefix_embedding: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            prefix_query: String::new(),
            prefix_embedding: String::new(),
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_model() -> Option<String> {
    Some("multilingual-e5-large".to_string())
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_max_tokens() -> usize {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> i64 {
    5
}

impl Config {
    /// Apply `EMBEDDING_*` overrides using `lookup` to resolve variables.
    ///
    /// Production passes `|k| std::env::var(k).ok()`; tests pass a map.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = Some(model);
        }
        if let Some(prefix) = lookup("EMBEDDING_PREFIX_QUERY") {
            self.embedding.prefix_query = prefix;
        }
        if let Some(prefix) = lookup("EMBEDDING_PREFIX_EMBEDDING") {
            self.embedding.prefix_embedding = prefix;
        }
        if let Some(dims) = lookup("EMBEDDING_DIM") {
            self.store.dims = dims
                .trim()
                .parse()
                .with_context(|| format!("EMBEDDING_DIM is not a positive integer: {:?}", dims))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.dims == 0 {
            bail!("store.dims must be > 0");
        }
        if !is_identifier(&self.store.table) {
            bail!(
                "store.table must be a plain identifier ([A-Za-z_][A-Za-z0-9_]*), got '{}'",
                self.store.table
            );
        }

        if self.chunking.max_tokens == 0 {
            bail!("chunking.max_tokens must be > 0");
        }

        if self.search.default_limit < 1 {
            bail!("search.default_limit must be >= 1");
        }

        if self.embedding.is_enabled() && self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "local" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be disabled, local, openai, or ollama.",
                other
            ),
        }

        if self.embedding.is_enabled()
            && self.embedding.model.as_deref().map_or(true, |m| m.trim().is_empty())
        {
            bail!(
                "embedding.model must be specified when provider is '{}'",
                self.embedding.provider
            );
        }

        Ok(())
    }
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`. Table names are interpolated into SQL.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
