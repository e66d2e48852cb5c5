//! Name-keyed tool registry.
//!
//! A tool's descriptor and handler are one unit: registering a name that is
//! already present replaces both and keeps the original position in
//! `tools/list` order.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::protocol::{Content, ToolDescriptor};

/// A tool exposed over `tools/call`.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use mcp_rag::mcp::{Content, Tool};
///
/// pub struct EchoTool;
///
/// #[async_trait]
/// impl Tool for EchoTool {
///     fn name(&self) -> &str { "echo" }
///     fn description(&self) -> &str { "Echo the `x` argument" }
///
///     fn input_schema(&self) -> Value {
///         json!({
///             "type": "object",
///             "properties": { "x": { "type": "string" } },
///             "required": ["x"]
///         })
///     }
///
///     async fn call(&self, arguments: Value) -> Result<Vec<Content>> {
///         Ok(vec![Content::text(arguments["x"].as_str().unwrap_or_default())])
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used in `tools/call`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for `arguments`: `type: "object"` with `properties`
    /// and optionally `required`.
    fn input_schema(&self) -> Value;

    /// Run the tool. `arguments` is passed through exactly as received.
    async fn call(&self, arguments: Value) -> Result<Vec<Content>>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

type ToolFn = dyn Fn(Value) -> Result<Vec<Content>> + Send + Sync;

/// Closure-backed [`Tool`] for synchronous handlers.
pub struct FnTool {
    descriptor: ToolDescriptor,
    handler: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: &str, description: &str, input_schema: Value, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Vec<Content>> + Send + Sync + 'static,
    {
        Self {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
            },
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn input_schema(&self) -> Value {
        self.descriptor.input_schema.clone()
    }

    async fn call(&self, arguments: Value) -> Result<Vec<Content>> {
        (self.handler)(arguments)
    }
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Tool(anyhow::Error),
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, returning the one it replaced, if any.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Option<Box<dyn Tool>> {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => Some(std::mem::replace(&mut self.tools[index], tool)),
            None => {
                self.tools.push(tool);
                None
            }
        }
    }

    pub fn register_fn<F>(
        &mut self,
        name: &str,
        description: &str,
        input_schema: Value,
        handler: F,
    ) -> Option<Box<dyn Tool>>
    where
        F: Fn(Value) -> Result<Vec<Content>> + Send + Sync + 'static,
    {
        self.register(Box::new(FnTool::new(name, description, input_schema, handler)))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Look up `name` and run it. Handler errors are returned untouched.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Vec<Content>, InvokeError> {
        let tool = self
            .find(name)
            .ok_or_else(|| InvokeError::UnknownTool(name.to_string()))?;
        tool.call(arguments).await.map_err(InvokeError::Tool)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constant(text: &'static str) -> impl Fn(Value) -> Result<Vec<Content>> + Send + Sync {
        move |_| Ok(vec![Content::text(text)])
    }

    #[tokio::test]
    async fn test_register_and_invoke() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        registry.register_fn("a", "first", json!({"type": "object"}), constant("A"));

        let content = registry.invoke("a", json!({})).await.unwrap();
        assert_eq!(content, vec![Content::text("A")]);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_reregister_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register_fn("a", "first", json!({"type": "object"}), constant("A1"));
        registry.register_fn("b", "second", json!({"type": "object"}), constant("B"));
        let replaced = registry.register_fn(
            "a",
            "first, again",
            json!({"type": "object", "properties": {}}),
            constant("A2"),
        );

        assert_eq!(replaced.map(|t| t.description().to_string()).as_deref(), Some("first"));
        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b"]);

        let descriptor = registry.find("a").unwrap().descriptor();
        assert_eq!(descriptor.description, "first, again");
        assert_eq!(descriptor.input_schema, json!({"type": "object", "properties": {}}));
        assert_eq!(
            registry.invoke("a", json!({})).await.unwrap(),
            vec![Content::text("A2")]
        );
    }

    #[tokio::test]
    async fn test_invoke_errors() {
        let mut registry = ToolRegistry::new();
        registry.register_fn("fail", "always fails", json!({"type": "object"}), |_| {
            anyhow::bail!("handler exploded")
        });

        match registry.invoke("missing", json!({})).await {
            Err(InvokeError::UnknownTool(name)) => assert_eq!(name, "missing"),
            other => panic!("expected UnknownTool, got {:?}", other.map(|_| ())),
        }
        match registry.invoke("fail", json!({})).await {
            Err(InvokeError::Tool(e)) => assert_eq!(e.to_string(), "handler exploded"),
            other => panic!("expected Tool error, got {:?}", other.map(|_| ())),
        }
    }
}
