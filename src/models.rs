//! Core data models.
//!
//! A [`Document`] is one stored unit of searchable text together with its
//! embedding. Ingestion produces one document per chunk of a source file.

use serde::Serialize;
use serde_json::{Map, Value};

/// Open string → scalar mapping attached to each document.
pub type Metadata = Map<String, Value>;

/// A document to be inserted. `id` is assigned by the store when `None`.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub id: Option<i64>,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

impl NewDocument {
    pub fn new(content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: None,
            content: content.into(),
            embedding,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A stored document.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub content: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    pub created_at: i64,
}

/// A document returned from similarity search with its distance to the query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub distance: f64,
}
