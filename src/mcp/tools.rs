//! Built-in tools backed by the vector store.
//!
//! | Tool | Arguments | Output |
//! |------|-----------|--------|
//! | `search` | `query`, `limit?`, `filters?` | `{results: [{id, content, metadata, distance, similarity}]}` |
//! | `add_document` | `content`, `metadata?` | `{id}` |
//! | `delete_document` | `id` | `{id, deleted}` |
//! | `count_documents` | none | `{count}` |
//!
//! Every tool answers with a single text block of pretty-printed JSON.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::protocol::Content;
use super::registry::{Tool, ToolRegistry};
use crate::embedding::Embedder;
use crate::models::{Metadata, NewDocument};
use crate::store::VectorStore;

/// Shared state handed to every built-in tool.
pub struct ToolContext {
    pub store: Arc<VectorStore>,
    pub embedder: Arc<Embedder>,
    pub default_limit: i64,
}

impl ToolContext {
    pub fn new(store: Arc<VectorStore>, embedder: Arc<Embedder>, default_limit: i64) -> Self {
        Self {
            store,
            embedder,
            default_limit,
        }
    }
}

/// Register `search`, `add_document`, `delete_document` and `count_documents`.
pub fn register_builtin_tools(registry: &mut ToolRegistry, ctx: Arc<ToolContext>) {
    registry.register(Box::new(SearchTool::new(ctx.clone())));
    registry.register(Box::new(AddDocumentTool::new(ctx.clone())));
    registry.register(Box::new(DeleteDocumentTool::new(ctx.clone())));
    registry.register(Box::new(CountDocumentsTool::new(ctx)));
}

fn optional_object(arguments: &Value, key: &str) -> Result<Option<Metadata>> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => bail!("{} must be an object", key),
    }
}

// ============ search ============

pub struct SearchTool {
    ctx: Arc<ToolContext>,
}

impl SearchTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Semantic search over the indexed documents. Returns the closest matches with their metadata and distance."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Natural-language search query" },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results",
                    "minimum": 1,
                    "default": self.ctx.default_limit
                },
                "filters": {
                    "type": "object",
                    "description": "Exact-match metadata filters, e.g. {\"file_name\": \"README.md\"}",
                    "additionalProperties": { "type": ["string", "number", "boolean", "null"] }
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, arguments: Value) -> Result<Vec<Content>> {
        let query = arguments["query"].as_str().unwrap_or("");
        if query.trim().is_empty() {
            bail!("query must not be empty");
        }

        let limit = match arguments.get("limit") {
            None | Some(Value::Null) => self.ctx.default_limit,
            Some(v) => v
                .as_i64()
                .context("limit must be an integer")?,
        };
        let filters = optional_object(&arguments, "filters")?;

        let embedding = self
            .ctx
            .embedder
            .embed_for_query(query)
            .await
            .context("Failed to embed query")?;
        let hits = self
            .ctx
            .store
            .search(&embedding, limit, filters.as_ref())
            .await?;

        let metric = self.ctx.store.metric();
        let results: Vec<Value> = hits
            .into_iter()
            .map(|hit| {
                json!({
                    "id": hit.document.id,
                    "content": hit.document.content,
                    "metadata": hit.document.metadata,
                    "distance": hit.distance,
                    "similarity": metric.similarity(hit.distance),
                })
            })
            .collect();

        Ok(vec![Content::json(&json!({ "results": results }))])
    }
}

// ============ add_document ============

pub struct AddDocumentTool {
    ctx: Arc<ToolContext>,
}

impl AddDocumentTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for AddDocumentTool {
    fn name(&self) -> &str {
        "add_document"
    }

    fn description(&self) -> &str {
        "Embed a piece of text and add it to the index"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string", "description": "Text to index" },
                "metadata": {
                    "type": "object",
                    "description": "Scalar metadata stored with the document",
                    "additionalProperties": { "type": ["string", "number", "boolean", "null"] }
                }
            },
            "required": ["content"]
        })
    }

    async fn call(&self, arguments: Value) -> Result<Vec<Content>> {
        let content = arguments["content"].as_str().unwrap_or("");
        if content.trim().is_empty() {
            bail!("content must not be empty");
        }
        let metadata = optional_object(&arguments, "metadata")?.unwrap_or_default();

        let embedding = self
            .ctx
            .embedder
            .embed_for_storage(content)
            .await
            .context("Failed to embed content")?;
        let id = self
            .ctx
            .store
            .insert(&NewDocument::new(content, embedding).with_metadata(metadata))
            .await?;

        Ok(vec![Content::json(&json!({ "id": id }))])
    }
}

// ============ delete_document ============

pub struct DeleteDocumentTool {
    ctx: Arc<ToolContext>,
}

impl DeleteDocumentTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for DeleteDocumentTool {
    fn name(&self) -> &str {
        "delete_document"
    }

    fn description(&self) -> &str {
        "Delete a document by id. Deleting an unknown id is a no-op."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer", "description": "Document id" }
            },
            "required": ["id"]
        })
    }

    async fn call(&self, arguments: Value) -> Result<Vec<Content>> {
        let id = arguments["id"].as_i64().context("id must be an integer")?;
        let deleted = self.ctx.store.delete(id).await?;
        Ok(vec![Content::json(&json!({ "id": id, "deleted": deleted }))])
    }
}

// ============ count_documents ============

pub struct CountDocumentsTool {
    ctx: Arc<ToolContext>,
}

impl CountDocumentsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for CountDocumentsTool {
    fn name(&self) -> &str {
        "count_documents"
    }

    fn description(&self) -> &str {
        "Number of documents in the index"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _arguments: Value) -> Result<Vec<Content>> {
        let count = self.ctx.store.count().await?;
        Ok(vec![Content::json(&json!({ "count": count }))])
    }
}
