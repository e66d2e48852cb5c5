//! `mcp-rag search`: semantic search from the command line.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::migrate;

pub async fn run_search(config: &Config, query: &str, limit: Option<i64>) -> Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!("query must not be empty");
    }

    let store = migrate::open_store(config).await?;
    let embedder = create_embedder(config)?;

    let embedding = embedder
        .embed_for_query(query)
        .await
        .context("Failed to embed query")?;
    let hits = store
        .search(&embedding, limit.unwrap_or(config.search.default_limit), None)
        .await?;

    if hits.is_empty() {
        println!("No results.");
        store.pool().close().await;
        return Ok(());
    }

    let metric = store.metric();
    for (i, hit) in hits.iter().enumerate() {
        let source = hit
            .document
            .metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("-");
        println!(
            "{}. [{:.4}] id {}  (distance {:.4})",
            i + 1,
            metric.similarity(hit.distance),
            hit.document.id,
            hit.distance
        );
        println!("    source: {}", source);
        println!("    {}", snippet(&hit.document.content, 200));
        println!();
    }

    store.pool().close().await;
    Ok(())
}

/// First `max_chars` characters on one line.
fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
