//! Resource providers for `resources/list` and `resources/templates/list`.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::protocol::{Resource, ResourceTemplate};
use crate::store::VectorStore;

#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn resources(&self) -> Result<Vec<Resource>>;

    async fn templates(&self) -> Result<Vec<ResourceTemplate>> {
        Ok(Vec::new())
    }
}

/// Fixed lists. The default is empty.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    pub resources: Vec<Resource>,
    pub templates: Vec<ResourceTemplate>,
}

#[async_trait]
impl ResourceProvider for StaticResources {
    async fn resources(&self) -> Result<Vec<Resource>> {
        Ok(self.resources.clone())
    }

    async fn templates(&self) -> Result<Vec<ResourceTemplate>> {
        Ok(self.templates.clone())
    }
}

/// Lists every indexed source file as a `file://` resource.
pub struct SourceResources {
    store: Arc<VectorStore>,
}

impl SourceResources {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceProvider for SourceResources {
    async fn resources(&self) -> Result<Vec<Resource>> {
        let sources = self.store.sources().await?;
        Ok(sources.iter().map(|s| source_resource(s)).collect())
    }
}

fn source_resource(source: &str) -> Resource {
    let path = Path::new(source);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string());
    let mime_type = match path.extension().and_then(|e| e.to_str()) {
        Some("md") | Some("markdown") => "text/markdown",
        _ => "text/plain",
    };

    Resource {
        uri: format!("file://{}", source),
        name,
        description: Some(format!("Indexed source {}", source)),
        mime_type: Some(mime_type.to_string()),
    }
}
