//! End-to-end tests of the built-in tools: dispatcher → tool → embedder → store.
//!
//! Uses a deterministic keyword provider instead of a real model so results
//! are predictable.

use anyhow::Result;
use async_trait::async_trait;
use mcp_rag::config::Config;
use mcp_rag::db;
use mcp_rag::embedding::{DisabledProvider, Embedder, EmbeddingProvider};
use mcp_rag::ingest::index_directory;
use mcp_rag::mcp::Dispatcher;
use mcp_rag::server::build_dispatcher;
use mcp_rag::store::{DistanceMetric, VectorStore};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const KEYWORDS: [&str; 4] = ["rust", "python", "docker", "database"];

/// One dimension per keyword plus a constant so no vector is all zeros.
struct KeywordProvider;

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn model_name(&self) -> &str {
        "keywords"
    }

    fn dims(&self) -> usize {
        KEYWORDS.len() + 1
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut v: Vec<f32> = KEYWORDS
                    .iter()
                    .map(|k| lower.matches(k).count() as f32)
                    .collect();
                v.push(0.1);
                v
            })
            .collect())
    }
}

async fn open_store(tmp: &TempDir) -> Arc<VectorStore> {
    let pool = db::connect_path(&tmp.path().join("rag.sqlite")).await.unwrap();
    let store = VectorStore::new(pool, "documents", KEYWORDS.len() + 1, DistanceMetric::Cosine).unwrap();
    store.initialize_schema().await.unwrap();
    Arc::new(store)
}

fn keyword_embedder() -> Arc<Embedder> {
    Arc::new(Embedder::new(Box::new(KeywordProvider)).with_prefixes("query: ", "passage: "))
}

async fn call_tool(d: &Dispatcher, id: i64, name: &str, arguments: Value) -> Value {
    let line = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    let response = d.handle(&line.to_string()).await.expect("response");
    let response = serde_json::to_value(response).unwrap();
    assert!(response.get("error").is_none(), "protocol error: {}", response);
    response["result"].clone()
}

fn tool_json(result: &Value) -> Value {
    assert_eq!(result["isError"], false, "tool error: {}", result);
    serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
}

async fn seeded() -> (TempDir, Arc<VectorStore>, Dispatcher) {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let d = build_dispatcher(store.clone(), keyword_embedder(), 5);

    for (content, topic) in [
        ("Rust ownership and the borrow checker. Rust is fast.", "lang"),
        ("Python notebooks for data science", "lang"),
        ("Docker images and container registries", "ops"),
        ("Running a database inside Docker", "ops"),
    ] {
        let result = call_tool(
            &d,
            1,
            "add_document",
            json!({"content": content, "metadata": {"topic": topic}}),
        )
        .await;
        assert!(tool_json(&result)["id"].as_i64().is_some());
    }

    (tmp, store, d)
}

#[tokio::test]
async fn test_builtin_tools_listed() {
    let (_tmp, _store, d) = seeded().await;
    let resp = d
        .handle(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .await
        .unwrap();
    let names: Vec<String> = resp.result.unwrap()["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["search", "add_document", "delete_document", "count_documents"]
    );
}

#[tokio::test]
async fn test_search_ranks_closest_first() {
    let (_tmp, _store, d) = seeded().await;

    let result = call_tool(&d, 2, "search", json!({"query": "rust"})).await;
    let body = tool_json(&result);
    let results = body["results"].as_array().unwrap();

    assert_eq!(results.len(), 4);
    assert!(results[0]["content"].as_str().unwrap().starts_with("Rust"));
    assert_eq!(results[0]["metadata"]["topic"], "lang");

    let distances: Vec<f64> = results.iter().map(|r| r["distance"].as_f64().unwrap()).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    let first = &results[0];
    let similarity = first["similarity"].as_f64().unwrap();
    assert!((similarity - (1.0 - first["distance"].as_f64().unwrap())).abs() < 1e-9);
}

#[tokio::test]
async fn test_search_limit_and_filters() {
    let (_tmp, _store, d) = seeded().await;

    let body = tool_json(&call_tool(&d, 3, "search", json!({"query": "docker", "limit": 1})).await);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    let body = tool_json(
        &call_tool(
            &d,
            4,
            "search",
            json!({"query": "docker", "filters": {"topic": "lang"}}),
        )
        .await,
    );
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["metadata"]["topic"] == "lang"));
}

#[tokio::test]
async fn test_search_argument_errors_are_tool_errors() {
    let (_tmp, _store, d) = seeded().await;

    let result = call_tool(&d, 5, "search", json!({"query": "   "})).await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["content"][0]["text"], "query must not be empty");

    let result = call_tool(&d, 6, "search", json!({"query": "rust", "limit": 0})).await;
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"].as_str().unwrap().contains("positive"));

    let result = call_tool(&d, 7, "search", json!({"query": "rust", "filters": {"tags": ["a"]}})).await;
    assert_eq!(result["isError"], true);

    let result = call_tool(&d, 8, "search", json!({"query": "rust", "filters": "topic"})).await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["content"][0]["text"], "filters must be an object");
}

#[tokio::test]
async fn test_count_and_delete() {
    let (_tmp, store, d) = seeded().await;

    let body = tool_json(&call_tool(&d, 9, "count_documents", json!({})).await);
    assert_eq!(body["count"], 4);

    let id = store.search(&[0.0, 0.0, 1.0, 0.0, 0.1], 1, None).await.unwrap()[0]
        .document
        .id;
    let body = tool_json(&call_tool(&d, 10, "delete_document", json!({"id": id})).await);
    assert_eq!(body["deleted"], true);
    let body = tool_json(&call_tool(&d, 11, "delete_document", json!({"id": id})).await);
    assert_eq!(body["deleted"], false);

    let body = tool_json(&call_tool(&d, 12, "count_documents", json!({})).await);
    assert_eq!(body["count"], 3);

    let result = call_tool(&d, 13, "delete_document", json!({"id": "seven"})).await;
    assert_eq!(result["isError"], true);
}

#[tokio::test]
async fn test_disabled_provider_reports_tool_error() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let d = build_dispatcher(store, Arc::new(Embedder::new(Box::new(DisabledProvider))), 5);

    let result = call_tool(&d, 1, "search", json!({"query": "rust"})).await;
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Failed to embed query"), "{}", text);
    assert!(text.contains("disabled"), "{}", text);
}

#[tokio::test]
async fn test_index_directory_and_resources() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("rust.md"),
        "# Rust\n\nRust programs are built with cargo.\n\nRust has no garbage collector.",
    )
    .unwrap();
    fs::write(docs.join("ops.txt"), "Docker and a database in production.").unwrap();
    fs::write(docs.join("empty.md"), "\n\n").unwrap();
    fs::write(docs.join("ignored.rs"), "fn main() {}").unwrap();

    let store = open_store(&tmp).await;
    let embedder = keyword_embedder();
    let config = Config::default();

    let stats = index_directory(&store, &embedder, &config, &docs).await.unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.chunks as i64, store.count().await.unwrap());

    // Re-indexing replaces instead of duplicating.
    let again = index_directory(&store, &embedder, &config, &docs).await.unwrap();
    assert_eq!(again, stats);
    assert_eq!(stats.chunks as i64, store.count().await.unwrap());

    let d = build_dispatcher(store.clone(), embedder, 5);
    let resp = d
        .handle(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#)
        .await
        .unwrap();
    let result = resp.result.unwrap();
    let resources = result["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 2);
    let names: Vec<&str> = resources.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"rust.md"));
    assert!(names.contains(&"ops.txt"));
    assert!(resources.iter().all(|r| r["uri"].as_str().unwrap().starts_with("file://")));

    let body = tool_json(&call_tool(&d, 2, "search", json!({"query": "rust cargo", "limit": 1})).await);
    let hit = &body["results"][0];
    assert_eq!(hit["metadata"]["file_name"], "rust.md");
    assert_eq!(hit["metadata"]["chunk_index"], 0);
    assert_eq!(hit["metadata"]["hash"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_reindex_drops_rows_of_emptied_files() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("notes.md"), "Rust notes.\n\nMore rust notes.").unwrap();
    fs::write(docs.join("binary.txt"), "Docker notes.").unwrap();

    let store = open_store(&tmp).await;
    let embedder = keyword_embedder();
    let config = Config::default();

    let stats = index_directory(&store, &embedder, &config, &docs).await.unwrap();
    assert_eq!(stats.files, 2);
    assert!(store.count().await.unwrap() >= 2);

    fs::write(docs.join("notes.md"), "").unwrap();
    fs::write(docs.join("binary.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    let stats = index_directory(&store, &embedder, &config, &docs).await.unwrap();
    assert_eq!(stats.files, 0);
    assert_eq!(stats.skipped, 2);
    assert_eq!(store.count().await.unwrap(), 0);
    assert!(store.sources().await.unwrap().is_empty());
}
