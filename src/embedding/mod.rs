//! Embedding providers and the prefix-aware [`Embedder`].
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]**: returns errors; used when embeddings are not configured.
//! - **[`OpenAIProvider`]**: calls the OpenAI embeddings API with batching, retry, and backoff.
//! - **[`OllamaProvider`]**: calls a local Ollama instance's `/api/embed` endpoint.
//! - **`LocalProvider`**: runs models in-process via fastembed; no network calls after model download.
//!
//! [`Embedder`] wraps a provider with the two operations the rest of the
//! crate uses, [`Embedder::embed_for_storage`] and [`Embedder::embed_for_query`].
//! Each prepends its configured prefix (for example `"passage: "` and
//! `"query: "` for E5 models) unless the text already starts with it.
//!
//! Also provides the BLOB codec used by the vector store:
//! - [`vec_to_blob`]: encode a `Vec<f32>` as little-endian bytes
//! - [`blob_to_vec`]: decode a BLOB back into a `Vec<f32>`
//!
//! # Retry Strategy
//!
//! The OpenAI and Ollama providers use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, EmbeddingConfig};

/// A text encoder producing fixed-length vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"multilingual-e5-large"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1024`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

// ============ Embedder ============

/// Provider plus the query/storage prefixes.
pub struct Embedder {
    provider: Box<dyn EmbeddingProvider>,
    prefix_query: String,
    prefix_embedding: String,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Box<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            prefix_query: String::new(),
            prefix_embedding: String::new(),
            batch_size: 64,
        }
    }

    pub fn with_prefixes(
        mut self,
        prefix_query: impl Into<String>,
        prefix_embedding: impl Into<String>,
    ) -> Self {
        self.prefix_query = prefix_query.into();
        self.prefix_embedding = prefix_embedding.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn dims(&self) -> usize {
        self.provider.dims()
    }

    /// Embed a document chunk for storage. Blank text yields an empty vector.
    pub async fn embed_for_storage(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text, &self.prefix_embedding).await
    }

    /// Embed a search query. Blank text yields an empty vector.
    pub async fn embed_for_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text, &self.prefix_query).await
    }

    /// Embed many chunks for storage, `batch_size` texts per provider call.
    ///
    /// Blank entries map to empty vectors and are not sent to the provider.
    pub async fn embed_batch_for_storage(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = vec![Vec::new(); texts.len()];
        let pending: Vec<(usize, String)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, add_prefix(t, &self.prefix_embedding)))
            .collect();

        if pending.len() < texts.len() {
            warn!(
                skipped = texts.len() - pending.len(),
                "Skipping embedding for empty text"
            );
        }

        for batch in pending.chunks(self.batch_size) {
            let inputs: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
            let vectors = self.provider.embed_texts(&inputs).await?;
            if vectors.len() != inputs.len() {
                bail!(
                    "Embedding provider returned {} vectors for {} inputs",
                    vectors.len(),
                    inputs.len()
                );
            }
            for ((index, _), vector) in batch.iter().zip(vectors) {
                out[*index] = vector;
            }
        }

        debug!(
            texts = texts.len(),
            model = self.provider.model_name(),
            "embedded batch"
        );
        Ok(out)
    }

    async fn embed_one(&self, text: &str, prefix: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            warn!("Skipping embedding for empty text");
            return Ok(Vec::new());
        }

        let input = add_prefix(text, prefix);
        let results = self.provider.embed_texts(&[input]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Empty embedding response"))
    }
}

/// Prepend `prefix` unless it is empty or `text` already starts with it.
///
/// The comparison ignores case and surrounding whitespace of the prefix.
pub fn add_prefix(text: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return text.to_string();
    }
    let marker = prefix.trim().to_lowercase();
    if text.to_lowercase().starts_with(&marker) {
        text.to_string()
    } else {
        format!("{}{}", prefix, text)
    }
}

// ============ Disabled Provider ============

/// A no-op embedding provider that always returns errors.
///
/// Used when `embedding.provider = "disabled"`. The server still starts and
/// answers protocol requests; tools that need embeddings report a tool error.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ HTTP retry ============

fn http_client(config: &EmbeddingConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Send a request built by `build`, retrying 429/5xx and network errors.
async fn send_with_retry<F>(
    label: &str,
    max_retries: u32,
    build: F,
) -> Result<serde_json::Value>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            debug!(label, attempt, delay_secs = delay.as_secs(), "retrying embedding request");
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                let body_text = response.text().await.unwrap_or_default();
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(anyhow!("{} API error {}: {}", label, status, body_text));
                    continue;
                }

                bail!("{} API error {}: {}", label, status, body_text);
            }
            Err(e) => {
                last_err = Some(anyhow!("{} request failed: {}", label, e));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("{} embedding failed after retries", label)))
}

fn json_to_vector(value: &serde_json::Value) -> Option<Vec<f32>> {
    value
        .as_array()
        .map(|items| items.iter().map(|v| v.as_f64().unwrap_or(0.0) as f32).collect())
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Calls `POST /v1/embeddings` with the configured model. Requires the
/// `OPENAI_API_KEY` environment variable.
pub struct OpenAIProvider {
    model: String,
    dims: usize,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: &EmbeddingConfig, dims: usize) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("embedding.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            dims,
            api_key,
            max_retries: config.max_retries,
            client: http_client(config)?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let json = send_with_retry("OpenAI", self.max_retries, || {
            self.client
                .post("https://api.openai.com/v1/embeddings")
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        parse_openai_response(&json)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let vector = item
            .get("embedding")
            .and_then(json_to_vector)
            .ok_or_else(|| anyhow!("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map_or(position, |i| i as usize);
        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Calls `POST /api/embed` on the configured URL (default `http://localhost:11434`).
pub struct OllamaProvider {
    model: String,
    dims: usize,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig, dims: usize) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("embedding.model required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(Self {
            model,
            dims,
            url: url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client: http_client(config)?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let endpoint = format!("{}/api/embed", self.url);

        let json = send_with_retry("Ollama", self.max_retries, || {
            self.client.post(&endpoint).json(&body)
        })
        .await
        .map_err(|e| anyhow!("{} (is Ollama running at {}?)", e, self.url))?;

        parse_ollama_response(&json)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing embeddings array"))?;

    embeddings
        .iter()
        .map(|e| {
            json_to_vector(e)
                .ok_or_else(|| anyhow!("Invalid Ollama response: embedding is not an array"))
        })
        .collect()
}

// ============ Local Provider (fastembed) ============

/// Canonical local model name: Hugging Face owner stripped, lowercased.
///
/// `"intfloat/multilingual-e5-large"` → `"multilingual-e5-large"`.
pub fn normalize_model_name(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).trim().to_ascii_lowercase()
}

/// Output dimension of a supported local model.
pub fn local_model_dims(name: &str) -> Option<usize> {
    match normalize_model_name(name).as_str() {
        "all-minilm-l6-v2" => Some(384),
        "bge-small-en-v1.5" => Some(384),
        "bge-base-en-v1.5" => Some(768),
        "bge-large-en-v1.5" => Some(1024),
        "nomic-embed-text-v1" | "nomic-embed-text-v1.5" => Some(768),
        "multilingual-e5-small" => Some(384),
        "multilingual-e5-base" => Some(768),
        "multilingual-e5-large" => Some(1024),
        _ => None,
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
fn fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    use fastembed::EmbeddingModel;

    match normalize_model_name(name).as_str() {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1" => Ok(EmbeddingModel::NomicEmbedTextV1),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        "multilingual-e5-base" => Ok(EmbeddingModel::MultilingualE5Base),
        "multilingual-e5-large" => Ok(EmbeddingModel::MultilingualE5Large),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
             nomic-embed-text-v1, nomic-embed-text-v1.5, \
             multilingual-e5-small, multilingual-e5-base, multilingual-e5-large",
            other
        ),
    }
}

/// In-process embedding via fastembed.
///
/// The model is downloaded from Hugging Face on first use, loaded once and
/// kept for the life of the provider.
#[cfg(feature = "local-embeddings-fastembed")]
pub struct LocalProvider {
    model_name: String,
    model: fastembed::EmbeddingModel,
    dims: usize,
    batch_size: usize,
    loaded: std::sync::Arc<std::sync::Mutex<Option<fastembed::TextEmbedding>>>,
}

#[cfg(feature = "local-embeddings-fastembed")]
impl LocalProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| "multilingual-e5-large".to_string());
        let model = fastembed_model(&model_name)?;
        let dims = local_model_dims(&model_name)
            .ok_or_else(|| anyhow!("No known dimension for local model '{}'", model_name))?;

        Ok(Self {
            model_name,
            model,
            dims,
            batch_size: config.batch_size,
            loaded: Default::default(),
        })
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
#[async_trait]
impl EmbeddingProvider for LocalProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let loaded = self.loaded.clone();
        let model = self.model.clone();
        let batch_size = self.batch_size;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut guard = loaded
                .lock()
                .map_err(|_| anyhow!("Local embedding model lock poisoned"))?;

            if guard.is_none() {
                let instance = fastembed::TextEmbedding::try_new(
                    fastembed::InitOptions::new(model).with_show_download_progress(false),
                )
                .map_err(|e| anyhow!("Failed to initialize local embedding model: {}", e))?;
                *guard = Some(instance);
            }

            let instance = guard
                .as_mut()
                .ok_or_else(|| anyhow!("Local embedding model not loaded"))?;
            instance
                .embed(texts, Some(batch_size))
                .map_err(|e| anyhow!("Local embedding failed: {}", e))
        })
        .await?
    }
}

/// Create the [`EmbeddingProvider`] named by `config.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"openai"` | [`OpenAIProvider`] |
/// | `"ollama"` | [`OllamaProvider`] |
/// | `"local"` | `LocalProvider` (requires `local-embeddings-fastembed`) |
///
/// Remote providers cannot report their output width up front, so they are
/// declared with `dims`; the local provider knows its own.
pub fn create_provider(config: &EmbeddingConfig, dims: usize) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" => Ok(Box::new(OpenAIProvider::new(config, dims)?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(config, dims)?)),
        #[cfg(feature = "local-embeddings-fastembed")]
        "local" => Ok(Box::new(LocalProvider::new(config)?)),
        #[cfg(not(feature = "local-embeddings-fastembed"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings-fastembed"),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

/// Build the [`Embedder`] for a loaded configuration.
///
/// Fails when an enabled provider's dimension disagrees with `store.dims`.
pub fn create_embedder(config: &Config) -> Result<Embedder> {
    let provider = create_provider(&config.embedding, config.store.dims)?;

    if config.embedding.is_enabled() && provider.dims() != config.store.dims {
        bail!(
            "Embedding model '{}' produces {}-dimensional vectors but store.dims is {}",
            provider.model_name(),
            provider.dims(),
            config.store.dims
        );
    }

    Ok(Embedder::new(provider)
        .with_prefixes(
            config.embedding.prefix_query.clone(),
            config.embedding.prefix_embedding.clone(),
        )
        .with_batch_size(config.embedding.batch_size))
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// This is the layout `sqlite-vec` reads for `float[N]` columns.
///
/// ```rust
/// use mcp_rag::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every input and returns `[len, 1.0]` per text.
    struct RecordingProvider {
        seen: Arc<Mutex<Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        fn model_name(&self) -> &str {
            "recording"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.seen.lock().unwrap().push(texts.to_vec());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    fn recording() -> (Embedder, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = RecordingProvider { seen: seen.clone() };
        (Embedder::new(Box::new(provider)), seen)
    }

    #[test]
    fn test_add_prefix() {
        assert_eq!(add_prefix("hello", ""), "hello");
        assert_eq!(add_prefix("hello", "query: "), "query: hello");
        assert_eq!(add_prefix("query: hello", "query: "), "query: hello");
        assert_eq!(add_prefix("QUERY: hello", "query: "), "QUERY: hello");
        assert_eq!(add_prefix("query:hello", "query: "), "query:hello");
        assert_eq!(add_prefix("hello", "   "), "hello");
    }

    #[tokio::test]
    async fn test_prefixes_applied_per_purpose() {
        let (embedder, seen) = recording();
        let embedder = embedder.with_prefixes("query: ", "passage: ");

        embedder.embed_for_query("rust").await.unwrap();
        embedder.embed_for_storage("rust").await.unwrap();
        embedder.embed_for_storage("passage: already").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], vec!["query: rust".to_string()]);
        assert_eq!(seen[1], vec!["passage: rust".to_string()]);
        assert_eq!(seen[2], vec!["passage: already".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_text_skips_provider() {
        let (embedder, seen) = recording();

        assert!(embedder.embed_for_query("").await.unwrap().is_empty());
        assert!(embedder.embed_for_storage("   ").await.unwrap().is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_splits_and_keeps_order() {
        let (embedder, seen) = recording();
        let embedder = embedder.with_batch_size(2);

        let texts: Vec<String> = ["a", "", "bbb", "cc", "dddd"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let vectors = embedder.embed_batch_for_storage(&texts).await.unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(vectors[0], vec![1.0, 1.0]);
        assert!(vectors[1].is_empty());
        assert_eq!(vectors[2], vec![3.0, 1.0]);
        assert_eq!(vectors[4], vec![4.0, 1.0]);

        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[1].len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_provider_errors() {
        let embedder = Embedder::new(Box::new(DisabledProvider));
        let err = embedder.embed_for_query("hello").await.unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_model_names() {
        assert_eq!(
            normalize_model_name("intfloat/multilingual-e5-large"),
            "multilingual-e5-large"
        );
        assert_eq!(local_model_dims("intfloat/multilingual-e5-large"), Some(1024));
        assert_eq!(local_model_dims("sentence-transformers/all-MiniLM-L6-v2"), Some(384));
        assert_eq!(local_model_dims("unknown-model"), None);
    }

    #[test]
    fn test_create_embedder_disabled() {
        let mut config = Config::default();
        config.embedding.provider = "disabled".to_string();
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.model_name(), "disabled");
    }

    #[test]
    fn test_parse_openai_response_orders_by_index() {
        let json = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.5, 0.5]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_openai_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.5, 0.5]]);
    }

    #[test]
    fn test_parse_ollama_response() {
        let json = serde_json::json!({"embeddings": [[1.0, 2.0], [3.0, 4.0]]});
        assert_eq!(parse_ollama_response(&json).unwrap().len(), 2);
        assert!(parse_ollama_response(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }
}
