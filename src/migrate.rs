//! Schema setup.
//!
//! The vector store owns its own DDL; this module opens the configured
//! database and makes sure the schema is in place before any command runs.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::db;
use crate::store::VectorStore;

/// Connect to the configured database and initialize the store schema.
pub async fn open_store(config: &Config) -> Result<VectorStore> {
    let pool = db::connect(config)
        .await
        .with_context(|| format!("Failed to open database {}", config.db.path.display()))?;

    let store = VectorStore::from_config(pool, &config.store)?;
    store
        .initialize_schema()
        .await
        .context("Failed to initialize vector store schema")?;

    Ok(store)
}

pub async fn run_migrations(config: &Config) -> Result<()> {
    let store = open_store(config).await?;

    println!("Database initialized successfully.");
    println!("  path:   {}", config.db.path.display());
    println!("  table:  {}", store.table());
    println!("  index:  {}", store.index_name());
    println!("  dims:   {}", store.dims());
    println!("  metric: {}", store.metric());

    store.pool().close().await;
    Ok(())
}
