//! # mcp-rag
//!
//! Semantic search over a local document collection, exposed to an AI agent
//! as MCP tools over a line-delimited JSON-RPC channel on stdio.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Directory  │──▶│ Chunk+Embed  │──▶│ SQLite + vec0 │
//! │   (index)   │   │  (Embedder)  │   │ (VectorStore) │
//! └─────────────┘   └──────────────┘   └───────┬───────┘
//!                                              │
//!                   ┌──────────────┐   ┌───────┴───────┐
//!      stdin ──────▶│  Dispatcher  │──▶│ ToolRegistry  │
//!      stdout ◀─────│  (JSON-RPC)  │   │ search, ...   │
//!                   └──────────────┘   └───────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`db`] | SQLite pool with `sqlite-vec` registered |
//! | [`store`] | Vector store schema, insert, KNN search, delete |
//! | [`models`] | Document types |
//! | [`embedding`] | Embedding providers and the prefix-aware [`embedding::Embedder`] |
//! | [`chunk`] | Paragraph chunker |
//! | [`ingest`] | Directory indexing |
//! | [`mcp`] | JSON-RPC protocol, tool registry, dispatcher, built-in tools |
//! | [`server`] | Stdio server wiring |
//! | [`migrate`] | Store setup used by every command |
//! | [`search`] | CLI search |
//! | [`documents`] | CLI count / delete / clear |

pub mod chunk;
pub mod config;
pub mod db;
pub mod documents;
pub mod embedding;
pub mod ingest;
pub mod mcp;
pub mod migrate;
pub mod models;
pub mod search;
pub mod server;
pub mod store;
