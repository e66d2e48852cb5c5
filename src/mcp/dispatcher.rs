//! Line-oriented JSON-RPC dispatcher.
//!
//! Reads one request per line, routes it and writes at most one response
//! per line. Requests are handled strictly one at a time.
//!
//! | Method | Handler |
//! |--------|---------|
//! | `initialize` | capability/version descriptor |
//! | `ping` | `{}` |
//! | `notifications/*` | logged; `{}` only when the request carried an id |
//! | `tools/list` | registry descriptors in registration order |
//! | `tools/call` | [`ToolRegistry::invoke`] |
//! | `resources/list` | [`ResourceProvider::resources`] |
//! | `resources/templates/list` | [`ResourceProvider::templates`] |
//!
//! A request without an id never produces output. Tool failures are reported
//! inside a successful envelope as `isError: true`; only malformed requests,
//! unknown methods or tools, bad `tools/call` params and resource provider
//! failures become protocol errors.

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::protocol::{
    CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ToolsCallParams, ToolsListResult, JSONRPC_VERSION,
};
use super::registry::{InvokeError, ToolRegistry};
use super::resources::{ResourceProvider, StaticResources};

pub struct Dispatcher {
    registry: ToolRegistry,
    resources: Box<dyn ResourceProvider>,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            resources: Box::new(StaticResources::default()),
        }
    }

    pub fn with_resources(mut self, provider: Box<dyn ResourceProvider>) -> Self {
        self.resources = provider;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.registry
    }

    /// Handle one raw input line.
    ///
    /// Blank lines and lines that are not JSON produce nothing. JSON that is
    /// not a valid request produces a parse error when an id can be recovered.
    pub async fn handle(&self, raw: &str) -> Option<JsonRpcResponse> {
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "dropping line that is not JSON");
                return None;
            }
        };

        let id = value.get("id").filter(|id| !id.is_null()).cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                return id.map(|id| {
                    JsonRpcResponse::error(id, JsonRpcError::parse_error(format!("Parse error: {}", e)))
                });
            }
        };

        self.handle_request(request).await
    }

    /// Handle an already-parsed request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.request_id().cloned();
        debug!(method = %request.method, id = ?id, "received request");

        if request.jsonrpc != JSONRPC_VERSION {
            warn!(jsonrpc = %request.jsonrpc, "unsupported jsonrpc version");
            return id.map(|id| {
                JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!(
                        "Invalid request: jsonrpc must be \"{}\"",
                        JSONRPC_VERSION
                    )),
                )
            });
        }

        if request.method.starts_with("notifications/") {
            info!(method = %request.method, "notification");
            return id.map(|id| JsonRpcResponse::success(id, json!({})));
        }

        let outcome = self.dispatch(&request).await;

        let Some(id) = id else {
            debug!(method = %request.method, "request without id; response suppressed");
            return None;
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => {
                let client = request
                    .params
                    .get("clientInfo")
                    .and_then(|c| c.get("name"))
                    .and_then(|n| n.as_str())
                    .unwrap_or("unknown");
                info!(client, "client initializing");
                to_result(&InitializeResult::default())
            }

            "ping" => Ok(json!({})),

            "tools/list" => to_result(&ToolsListResult {
                tools: self.registry.list(),
            }),

            "tools/call" => self.call_tool(&request.params).await,

            "resources/list" => {
                let resources = self
                    .resources
                    .resources()
                    .await
                    .map_err(|e| JsonRpcError::internal_error(format!("{:#}", e)))?;
                Ok(json!({ "resources": to_result(&resources)? }))
            }

            "resources/templates/list" => {
                let templates = self
                    .resources
                    .templates()
                    .await
                    .map_err(|e| JsonRpcError::internal_error(format!("{:#}", e)))?;
                Ok(json!({ "templates": to_result(&templates)? }))
            }

            other => {
                warn!(method = %other, "unknown method");
                Err(JsonRpcError::method_not_found(other))
            }
        }
    }

    async fn call_tool(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let params: ToolsCallParams = serde_json::from_value(params.clone())
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))?;

        debug!(tool = %params.name, "calling tool");

        let result = match self.registry.invoke(&params.name, params.arguments).await {
            Ok(content) => CallToolResult::success(content),
            Err(InvokeError::UnknownTool(name)) => {
                warn!(tool = %name, "unknown tool");
                return Err(JsonRpcError::tool_not_found(&name));
            }
            Err(InvokeError::Tool(e)) => {
                let message = format!("{:#}", e);
                warn!(tool = %params.name, error = %message, "tool failed");
                CallToolResult::error(message)
            }
        };

        to_result(&result)
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    ///
    /// A read error ends the loop; a write error is returned.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(tools = self.registry.len(), "MCP server starting");

        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "failed to read input");
                    break;
                }
            };

            if let Some(response) = self.handle(&line).await {
                write_response(&mut writer, &response).await?;
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// [`serve`](Self::serve) over the process's stdin and stdout.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(response)?;
    debug!(response = %line, "sending response");
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
