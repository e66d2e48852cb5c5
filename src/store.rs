//! Vector store backed by SQLite and the `sqlite-vec` extension.
//!
//! Each store owns two objects in the database:
//!
//! | Object | Purpose |
//! |--------|---------|
//! | `<table>` | Relational document rows: content, metadata JSON, raw embedding |
//! | `<table>_vec` | `vec0` virtual table indexing the embeddings for KNN search |
//!
//! plus a small `<table>_meta` key/value table recording the dimension and
//! distance metric the schema was created with. The dimension is fixed for the
//! lifetime of the schema: it is checked in Rust before every write, enforced
//! by a `CHECK` on the embedding column, and baked into the `vec0` column type.
//!
//! # Search
//!
//! Unfiltered searches go through the `vec0` KNN index to find the distance
//! of the `k`-th neighbour, then re-rank every row at or inside that distance,
//! since `vec0` picks arbitrarily among rows tied at the cutoff. Searches with
//! metadata filters run an exact distance scan over the matching rows, since
//! the index cannot apply the filter before truncating to `k`. Both paths
//! order by `(distance, seq)`, where `seq` is a per-row insertion sequence,
//! so equal distances come back oldest first even when callers supply ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{is_identifier, StoreConfig};
use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::models::{Document, Metadata, NewDocument, SearchHit};

/// Upper bound applied to every search `limit`.
pub const MAX_SEARCH_LIMIT: i64 = 1000;

/// Slack added to the KNN cutoff so float noise between `vec0` and the
/// scalar distance functions cannot drop a tied row.
const CUTOFF_EPSILON: f64 = 1e-6;

/// Distance function used by the similarity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2 => "l2",
        }
    }

    fn distance_fn(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "vec_distance_cosine",
            DistanceMetric::L2 => "vec_distance_l2",
        }
    }

    /// Map a distance onto a "higher is closer" score for display.
    pub fn similarity(&self, distance: f64) -> f64 {
        match self {
            DistanceMetric::Cosine => 1.0 - distance,
            DistanceMetric::L2 => 1.0 / (1.0 + distance),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector dimension must be > 0")]
    ZeroDimension,

    #[error("search limit must be a positive integer, got {0}")]
    InvalidLimit(i64),

    #[error("invalid metadata key '{0}': values must be a string, number, boolean or null")]
    InvalidMetadata(String),

    #[error("invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("sqlite-vec extension is not available: {0}")]
    ExtensionUnavailable(String),

    #[error("schema was created with {key}={found} but the store is configured with {key}={configured}; recreate the schema to change it")]
    SchemaMismatch {
        key: &'static str,
        found: String,
        configured: String,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Document store with a fixed-dimension similarity index.
pub struct VectorStore {
    pool: SqlitePool,
    table: String,
    index: String,
    meta: String,
    dims: usize,
    metric: DistanceMetric,
}

impl VectorStore {
    /// Create a store over `pool`. Does not touch the database; call
    /// [`initialize_schema`](Self::initialize_schema) before use.
    pub fn new(pool: SqlitePool, table: &str, dims: usize, metric: DistanceMetric) -> Result<Self> {
        if !is_identifier(table) {
            return Err(StoreError::InvalidTableName(table.to_string()));
        }
        if dims == 0 {
            return Err(StoreError::ZeroDimension);
        }

        Ok(Self {
            pool,
            table: table.to_string(),
            index: format!("{}_vec", table),
            meta: format!("{}_meta", table),
            dims,
            metric,
        })
    }

    pub fn from_config(pool: SqlitePool, config: &StoreConfig) -> Result<Self> {
        Self::new(pool, &config.table, config.dims, config.metric)
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Ensure the extension is loaded and all schema objects exist.
    ///
    /// Safe to call on every start. Fails with [`StoreError::SchemaMismatch`]
    /// when an existing schema was created with a different dimension or metric.
    pub async fn initialize_schema(&self) -> Result<()> {
        let version: String = sqlx::query_scalar("SELECT vec_version()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::ExtensionUnavailable(e.to_string()))?;

        let create_meta = format!(
            "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            self.meta
        );
        sqlx::query(&create_meta).execute(&self.pool).await?;

        self.check_recorded("dims", &self.dims.to_string()).await?;
        self.check_recorded("metric", self.metric.as_str()).await?;

        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                metadata_json TEXT NOT NULL DEFAULT '{{}}',
                embedding BLOB NOT NULL CHECK (length(embedding) = {}),
                created_at INTEGER NOT NULL,
                seq INTEGER NOT NULL
            )
            "#,
            self.table,
            self.dims * 4
        );
        sqlx::query(&create_table).execute(&self.pool).await?;

        let create_seq_index = format!(
            "CREATE INDEX IF NOT EXISTS {table}_seq ON {table} (seq)",
            table = self.table
        );
        sqlx::query(&create_seq_index).execute(&self.pool).await?;

        let create_index = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING vec0(embedding float[{}] distance_metric={})",
            self.index, self.dims, self.metric
        );
        sqlx::query(&create_index).execute(&self.pool).await?;

        let record = format!(
            "INSERT OR IGNORE INTO {} (key, value) VALUES ('dims', ?), ('metric', ?)",
            self.meta
        );
        sqlx::query(&record)
            .bind(self.dims.to_string())
            .bind(self.metric.as_str())
            .execute(&self.pool)
            .await?;

        info!(
            table = %self.table,
            dims = self.dims,
            metric = %self.metric,
            sqlite_vec = %version,
            "vector store schema ready"
        );
        Ok(())
    }

    async fn check_recorded(&self, key: &'static str, configured: &str) -> Result<()> {
        let sql = format!("SELECT value FROM {} WHERE key = ?", self.meta);
        let found: Option<String> = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match found {
            Some(found) if found != configured => Err(StoreError::SchemaMismatch {
                key,
                found,
                configured: configured.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Insert one document, returning its id.
    pub async fn insert(&self, doc: &NewDocument) -> Result<i64> {
        self.validate(doc)?;

        let mut tx = self.pool.begin().await?;
        let id = self.insert_row(&mut tx, doc).await?;
        tx.commit().await?;

        debug!(id, table = %self.table, "inserted document");
        Ok(id)
    }

    /// Insert several documents in one transaction. All-or-nothing.
    pub async fn insert_batch(&self, docs: &[NewDocument]) -> Result<Vec<i64>> {
        for doc in docs {
            self.validate(doc)?;
        }

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            ids.push(self.insert_row(&mut tx, doc).await?);
        }
        tx.commit().await?;

        debug!(count = ids.len(), table = %self.table, "inserted documents");
        Ok(ids)
    }

    fn validate(&self, doc: &NewDocument) -> Result<()> {
        self.check_dims(doc.embedding.len())?;
        validate_metadata(&doc.metadata)
    }

    async fn insert_row(&self, conn: &mut SqliteConnection, doc: &NewDocument) -> Result<i64> {
        let blob = vec_to_blob(&doc.embedding);
        let metadata_json = Value::Object(doc.metadata.clone()).to_string();
        let now = chrono::Utc::now().timestamp();

        // seq is always above every live row, whatever id the caller picked.
        let insert_doc = format!(
            r#"
            INSERT INTO {table} (id, content, metadata_json, embedding, created_at, seq)
            VALUES (?, ?, ?, ?, ?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM {table}))
            "#,
            table = self.table
        );
        let result = sqlx::query(&insert_doc)
            .bind(doc.id)
            .bind(&doc.content)
            .bind(&metadata_json)
            .bind(&blob)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        let id = result.last_insert_rowid();

        let insert_vec = format!("INSERT INTO {} (rowid, embedding) VALUES (?, ?)", self.index);
        sqlx::query(&insert_vec)
            .bind(id)
            .bind(&blob)
            .execute(&mut *conn)
            .await?;

        Ok(id)
    }

    /// Return up to `limit` documents nearest to `query`, closest first.
    ///
    /// `filters` restricts the search to documents whose metadata equals
    /// every given key/value pair.
    pub async fn search(
        &self,
        query: &[f32],
        limit: i64,
        filters: Option<&Metadata>,
    ) -> Result<Vec<SearchHit>> {
        if limit < 1 {
            return Err(StoreError::InvalidLimit(limit));
        }
        let limit = limit.min(MAX_SEARCH_LIMIT);
        self.check_dims(query.len())?;

        let blob = vec_to_blob(query);
        let rows = match filters.filter(|f| !f.is_empty()) {
            None => self.knn_rows(&blob, limit).await?,
            Some(filters) => self.filtered_rows(&blob, limit, filters).await?,
        };

        let hits = rows
            .iter()
            .map(|row| {
                Ok(SearchHit {
                    document: document_from_row(row)?,
                    distance: row.try_get("distance")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(limit, returned = hits.len(), "vector search");
        Ok(hits)
    }

    async fn knn_rows(&self, blob: &[u8], limit: i64) -> Result<Vec<SqliteRow>> {
        let sql = format!(
            r#"
            WITH knn AS (
                SELECT distance
                FROM {index}
                WHERE embedding MATCH ? AND k = ?
            ),
            scored AS (
                SELECT d.id, d.content, d.metadata_json, d.embedding, d.created_at, d.seq,
                       {distance}(d.embedding, ?) AS distance
                FROM {table} d
            )
            SELECT id, content, metadata_json, embedding, created_at, distance
            FROM scored
            WHERE distance <= (SELECT MAX(distance) FROM knn) + ?
            ORDER BY distance ASC, seq ASC
            LIMIT ?
            "#,
            index = self.index,
            table = self.table,
            distance = self.metric.distance_fn(),
        );

        Ok(sqlx::query(&sql)
            .bind(blob)
            .bind(limit)
            .bind(blob)
            .bind(CUTOFF_EPSILON)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn filtered_rows(
        &self,
        blob: &[u8],
        limit: i64,
        filters: &Metadata,
    ) -> Result<Vec<SqliteRow>> {
        validate_metadata(filters)?;

        let mut clauses = Vec::with_capacity(filters.len());
        let mut paths = Vec::with_capacity(filters.len());
        for (key, value) in filters {
            if key.contains('"') {
                return Err(StoreError::InvalidMetadata(key.clone()));
            }
            paths.push(format!("$.\"{}\"", key));
            clauses.push(if value.is_null() {
                "json_extract(d.metadata_json, ?) IS NULL"
            } else {
                "json_extract(d.metadata_json, ?) = ?"
            });
        }

        let sql = format!(
            r#"
            SELECT d.id, d.content, d.metadata_json, d.embedding, d.created_at,
                   {distance}(d.embedding, ?) AS distance
            FROM {table} d
            WHERE {clauses}
            ORDER BY distance ASC, d.seq ASC
            LIMIT ?
            "#,
            distance = self.metric.distance_fn(),
            table = self.table,
            clauses = clauses.join(" AND "),
        );

        let mut query = sqlx::query(&sql).bind(blob);
        for (path, value) in paths.into_iter().zip(filters.values()) {
            query = query.bind(path);
            query = match value {
                Value::String(s) => query.bind(s.clone()),
                Value::Bool(b) => query.bind(i64::from(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => query.bind(i),
                    None => query.bind(n.as_f64()),
                },
                _ => query,
            };
        }

        Ok(query.bind(limit).fetch_all(&self.pool).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Document>> {
        let sql = format!(
            "SELECT id, content, metadata_json, embedding, created_at FROM {} WHERE id = ?",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    /// Delete one document. Deleting a missing id is a no-op returning `false`.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = self.delete_row(&mut tx, id).await?;
        tx.commit().await?;

        debug!(id, deleted, "delete document");
        Ok(deleted)
    }

    async fn delete_row(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let delete_vec = format!("DELETE FROM {} WHERE rowid = ?", self.index);
        sqlx::query(&delete_vec).bind(id).execute(&mut *conn).await?;

        let delete_doc = format!("DELETE FROM {} WHERE id = ?", self.table);
        let result = sqlx::query(&delete_doc)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every document whose `metadata.source` equals `source`.
    pub async fn delete_by_source(&self, source: &str) -> Result<u64> {
        let select = format!(
            "SELECT id FROM {} WHERE json_extract(metadata_json, '$.source') = ?",
            self.table
        );

        let mut tx = self.pool.begin().await?;
        let ids: Vec<i64> = sqlx::query_scalar(&select)
            .bind(source)
            .fetch_all(&mut *tx)
            .await?;

        let mut deleted = 0u64;
        for id in ids {
            if self.delete_row(&mut tx, id).await? {
                deleted += 1;
            }
        }
        tx.commit().await?;

        debug!(source, deleted, "delete documents by source");
        Ok(deleted)
    }

    /// Remove every document. The schema itself is left in place.
    pub async fn delete_all(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let delete_vec = format!("DELETE FROM {}", self.index);
        sqlx::query(&delete_vec).execute(&mut *tx).await?;

        let delete_docs = format!("DELETE FROM {}", self.table);
        let result = sqlx::query(&delete_docs).execute(&mut *tx).await?;

        tx.commit().await?;

        info!(table = %self.table, deleted = result.rows_affected(), "cleared documents");
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    /// Distinct string `metadata.source` values, sorted.
    pub async fn sources(&self) -> Result<Vec<String>> {
        let sql = format!(
            r#"
            SELECT DISTINCT json_extract(metadata_json, '$.source') AS source
            FROM {}
            WHERE json_type(metadata_json, '$.source') = 'text'
            ORDER BY source
            "#,
            self.table
        );
        Ok(sqlx::query_scalar(&sql).fetch_all(&self.pool).await?)
    }

    fn check_dims(&self, actual: usize) -> Result<()> {
        if actual != self.dims {
            return Err(StoreError::DimensionMismatch {
                expected: self.dims,
                actual,
            });
        }
        Ok(())
    }
}

/// Metadata values must be scalars.
pub fn validate_metadata(metadata: &Metadata) -> Result<()> {
    for (key, value) in metadata {
        if value.is_array() || value.is_object() {
            return Err(StoreError::InvalidMetadata(key.clone()));
        }
    }
    Ok(())
}

fn document_from_row(row: &SqliteRow) -> Result<Document> {
    let metadata_json: String = row.try_get("metadata_json")?;
    let metadata = match serde_json::from_str::<Value>(&metadata_json) {
        Ok(Value::Object(map)) => map,
        _ => Metadata::new(),
    };
    let blob: Vec<u8> = row.try_get("embedding")?;

    Ok(Document {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        embedding: blob_to_vec(&blob),
        metadata,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_parse_and_similarity() {
        let m: DistanceMetric = serde_json::from_value(json!("l2")).unwrap();
        assert_eq!(m, DistanceMetric::L2);
        assert_eq!(DistanceMetric::default(), DistanceMetric::Cosine);
        assert!((DistanceMetric::Cosine.similarity(0.25) - 0.75).abs() < 1e-9);
        assert!((DistanceMetric::L2.similarity(0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_metadata() {
        let ok = json!({"source": "a.md", "chunk_index": 2, "draft": false, "score": 0.5, "x": null});
        assert!(validate_metadata(ok.as_object().unwrap()).is_ok());

        let nested = json!({"tags": ["a", "b"]});
        assert!(matches!(
            validate_metadata(nested.as_object().unwrap()),
            Err(StoreError::InvalidMetadata(key)) if key == "tags"
        ));
    }

    #[test]
    fn test_error_messages() {
        let e = StoreError::DimensionMismatch {
            expected: 512,
            actual: 3,
        };
        assert_eq!(
            e.to_string(),
            "embedding dimension mismatch: expected 512, got 3"
        );
        assert!(StoreError::InvalidLimit(0).to_string().contains("positive"));
    }
}
