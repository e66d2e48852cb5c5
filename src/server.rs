//! Stdio MCP server.
//!
//! Opens the store, builds the embedder and registers the built-in tools,
//! then serves JSON-RPC over stdin/stdout until the client closes stdin.
//! All logging goes to stderr.
//!
//! # Client Integration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "rag": {
//!       "command": "mcp-rag",
//!       "args": ["--config", "/path/to/rag.toml", "serve"]
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::mcp::{register_builtin_tools, Dispatcher, SourceResources, ToolContext, ToolRegistry};
use crate::migrate;
use crate::store::VectorStore;

/// Dispatcher with the built-in tools and indexed sources as resources.
pub fn build_dispatcher(
    store: Arc<VectorStore>,
    embedder: Arc<Embedder>,
    default_limit: i64,
) -> Dispatcher {
    let ctx = Arc::new(ToolContext::new(store.clone(), embedder, default_limit));

    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, ctx);

    Dispatcher::new(registry).with_resources(Box::new(SourceResources::new(store)))
}

pub async fn run_server(config: &Config) -> Result<()> {
    let store = Arc::new(migrate::open_store(config).await?);
    let embedder = Arc::new(create_embedder(config)?);

    info!(
        db = %config.db.path.display(),
        table = %store.table(),
        dims = store.dims(),
        model = embedder.model_name(),
        "vector store ready"
    );

    let dispatcher = build_dispatcher(store.clone(), embedder, config.search.default_limit);
    dispatcher.serve_stdio().await?;

    store.pool().close().await;
    Ok(())
}
