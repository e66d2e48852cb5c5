//! # mcp-rag CLI
//!
//! The `mcp-rag` binary serves semantic search to AI agents over a stdio MCP
//! channel and manages the document index behind it.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mcp-rag init` | Create the database and vector store schema |
//! | `mcp-rag serve` | Run the MCP server on stdin/stdout |
//! | `mcp-rag index <dir>` | Chunk, embed and store the text files under a directory |
//! | `mcp-rag search "<query>"` | Semantic search from the terminal |
//! | `mcp-rag count` | Number of stored documents |
//! | `mcp-rag delete <id>` | Delete one document |
//! | `mcp-rag clear` | Delete every document |
//!
//! ## Examples
//!
//! ```bash
//! mcp-rag --config ./rag.toml init
//! mcp-rag --config ./rag.toml index ./docs
//! mcp-rag --config ./rag.toml search "how do I rotate credentials" --limit 3
//! EMBEDDING_PREFIX_QUERY="query: " mcp-rag --config ./rag.toml serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mcp_rag::{config, documents, ingest, migrate, search, server};

/// Semantic document search for AI agents over MCP.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Without it, built-in defaults are used. `EMBEDDING_MODEL`,
/// `EMBEDDING_PREFIX_QUERY`, `EMBEDDING_PREFIX_EMBEDDING` and `EMBEDDING_DIM`
/// override the file.
#[derive(Parser)]
#[command(
    name = "mcp-rag",
    about = "Semantic document search exposed to AI agents over a stdio MCP channel",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database, the document table and its vec0 index.
    /// Safe to run repeatedly.
    Init,

    /// Run the MCP server over stdin/stdout.
    Serve,

    /// Index the text files under a directory.
    ///
    /// Files already indexed are replaced.
    Index {
        /// Directory to walk.
        dir: PathBuf,
    },

    /// Search indexed documents.
    Search {
        /// Natural-language query.
        query: String,

        /// Maximum number of results (defaults to `search.default_limit`).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print the number of stored documents.
    Count,

    /// Delete a document by id.
    Delete {
        /// Document id.
        id: i64,
    },

    /// Delete every document.
    Clear,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::Config::default(),
    };
    cfg.apply_overrides(|key| std::env::var(key).ok())?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Index { dir } => {
            ingest::run_index(&cfg, &dir).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Count => {
            documents::run_count(&cfg).await?;
        }
        Commands::Delete { id } => {
            documents::run_delete(&cfg, id).await?;
        }
        Commands::Clear => {
            documents::run_clear(&cfg).await?;
        }
    }

    Ok(())
}
