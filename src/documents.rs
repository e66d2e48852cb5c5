//! `mcp-rag count | delete | clear`.

use anyhow::Result;

use crate::config::Config;
use crate::migrate;

pub async fn run_count(config: &Config) -> Result<()> {
    let store = migrate::open_store(config).await?;
    let count = store.count().await?;
    let sources = store.sources().await?;

    println!("documents: {}", count);
    println!("sources:   {}", sources.len());

    store.pool().close().await;
    Ok(())
}

pub async fn run_delete(config: &Config, id: i64) -> Result<()> {
    let store = migrate::open_store(config).await?;

    if store.delete(id).await? {
        println!("Deleted document {}.", id);
    } else {
        println!("No document with id {}.", id);
    }

    store.pool().close().await;
    Ok(())
}

pub async fn run_clear(config: &Config) -> Result<()> {
    let store = migrate::open_store(config).await?;
    let deleted = store.delete_all().await?;

    println!("Deleted {} documents.", deleted);

    store.pool().close().await;
    Ok(())
}
