//! Directory ingestion: walk → read → chunk → embed → store.
//!
//! Files are selected with `[ingest]` include/exclude globs matched against
//! the path relative to the root. `.git`, `target` and `node_modules` are
//! always excluded. Each file is identified by its absolute path, stored as
//! `metadata.source`; re-indexing a file replaces all of its previous rows.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::config::{Config, IngestConfig};
use crate::embedding::{create_embedder, Embedder};
use crate::migrate;
use crate::models::{Metadata, NewDocument};
use crate::store::VectorStore;

/// A file selected for ingestion.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative_path: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub files: usize,
    pub chunks: usize,
    pub skipped: usize,
}

/// List the files under `root` matching the ingest globs, sorted by path.
pub fn scan_directory(root: &Path, config: &IngestConfig) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        bail!("Directory does not exist: {}", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;

    let include_set = build_globset(&config.include_globs)?;

    let mut excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    excludes.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(config.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(SourceFile {
            path: path.to_path_buf(),
            relative_path: rel_str,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

/// `mcp-rag index <dir>`.
pub async fn run_index(config: &Config, root: &Path) -> Result<()> {
    let store = migrate::open_store(config).await?;
    let embedder = create_embedder(config)?;

    let stats = index_directory(&store, &embedder, config, root).await?;

    println!("index {}", root.display());
    println!("  files indexed: {}", stats.files);
    println!("  chunks written: {}", stats.chunks);
    println!("  files skipped: {}", stats.skipped);
    println!("ok");

    store.pool().close().await;
    Ok(())
}

/// Index every matching file under `root` into `store`.
pub async fn index_directory(
    store: &VectorStore,
    embedder: &Embedder,
    config: &Config,
    root: &Path,
) -> Result<IndexStats> {
    let files = scan_directory(root, &config.ingest)?;
    info!(root = %root.display(), files = files.len(), "indexing directory");

    let mut stats = IndexStats::default();
    for file in &files {
        let written = index_file(store, embedder, config, file).await?;
        if written == 0 {
            stats.skipped += 1;
        } else {
            stats.files += 1;
            stats.chunks += written;
        }
    }

    info!(
        files = stats.files,
        chunks = stats.chunks,
        skipped = stats.skipped,
        "indexing complete"
    );
    Ok(stats)
}

/// Replace the stored chunks of one file. Returns the number written.
///
/// Files that are now empty or unreadable lose any previously indexed rows.
async fn index_file(
    store: &VectorStore,
    embedder: &Embedder,
    config: &Config,
    file: &SourceFile,
) -> Result<usize> {
    let source = file.path.to_string_lossy().to_string();

    let body = match std::fs::read_to_string(&file.path) {
        Ok(body) => body,
        Err(e) => {
            let removed = store.delete_by_source(&source).await?;
            warn!(path = %file.path.display(), error = %e, removed, "Skipping unreadable file");
            return Ok(0);
        }
    };

    let chunks = chunk_text(&body, config.chunking.max_tokens);
    if chunks.is_empty() {
        let removed = store.delete_by_source(&source).await?;
        warn!(path = %file.path.display(), removed, "Skipping empty file");
        return Ok(0);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder
        .embed_batch_for_storage(&texts)
        .await
        .with_context(|| format!("Failed to embed {}", file.relative_path))?;

    let file_name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let chunk_count = chunks.len();

    let docs: Vec<NewDocument> = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, embedding)| {
            let mut metadata = Metadata::new();
            metadata.insert("source".into(), json!(source));
            metadata.insert("file_name".into(), json!(file_name));
            metadata.insert("chunk_index".into(), json!(chunk.index));
            metadata.insert("chunk_count".into(), json!(chunk_count));
            metadata.insert("hash".into(), json!(chunk.hash));
            NewDocument::new(chunk.text, embedding).with_metadata(metadata)
        })
        .collect();

    let removed = store.delete_by_source(&source).await?;
    store.insert_batch(&docs).await?;

    info!(
        source = %file.relative_path,
        chunks = chunk_count,
        replaced = removed,
        "indexed file"
    );
    Ok(chunk_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_applies_globs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("docs/guide.md"), "# Guide").unwrap();
        fs::write(root.join("notes.txt"), "notes").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("node_modules/pkg/README.md"), "vendored").unwrap();
        fs::write(root.join("docs/draft.md"), "draft").unwrap();

        let config = IngestConfig {
            exclude_globs: vec!["**/draft.md".to_string()],
            ..IngestConfig::default()
        };
        let files = scan_directory(root, &config).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();

        assert_eq!(names, vec!["docs/guide.md", "notes.txt"]);
        assert!(files.iter().all(|f| f.path.is_absolute()));
    }

    #[test]
    fn test_scan_missing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(scan_directory(&missing, &IngestConfig::default()).is_err());
    }
}
