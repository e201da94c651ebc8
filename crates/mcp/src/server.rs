//! MCP server loop over line-delimited JSON-RPC.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, Tool, codes,
};

/// Maximum accepted message size (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// What the server exposes: a tool list and a way to call a tool.
///
/// Tool failures are reported inside the [`CallToolResult`] with
/// `is_error` set, never as protocol errors.
pub trait ToolService: Send + Sync {
    fn tools(&self) -> Vec<Tool>;

    fn call(&self, name: &str, arguments: Value) -> impl Future<Output = CallToolResult> + Send;
}

/// Serves one client, one message at a time.
pub struct McpServer<S> {
    info: ServerInfo,
    service: S,
}

impl<S: ToolService> McpServer<S> {
    pub fn new(info: ServerInfo, service: S) -> Self {
        Self { info, service }
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve line-delimited JSON-RPC until `reader` reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(name = %self.info.name, version = %self.info.version, "mcp server ready");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let json = serde_json::to_string(&response)?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        info!("mcp client closed the stream");
        Ok(())
    }

    /// Handle one raw message. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        if line.len() > MAX_MESSAGE_SIZE {
            warn!(size = line.len(), max = MAX_MESSAGE_SIZE, "message too large");
            return Some(JsonRpcResponse::error(
                None,
                JsonRpcError::new(codes::INVALID_REQUEST, "message too large"),
            ));
        }
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::new(codes::PARSE_ERROR, format!("parse error: {e}")),
                ))
            }
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "mcp request");

        let Some(id) = request.id else {
            // initialized, cancelled: nothing to answer.
            debug!(method = %request.method, "notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = parse_params(request.params).unwrap_or_default();
                JsonRpcResponse::result(
                    id,
                    InitializeResult {
                        protocol_version: params
                            .protocol_version
                            .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
                        capabilities: ServerCapabilities::default(),
                        server_info: self.info.clone(),
                    },
                )
            }
            "ping" => JsonRpcResponse::result(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::result(
                id,
                ListToolsResult {
                    tools: self.service.tools(),
                },
            ),
            "tools/call" => match parse_params::<CallToolParams>(request.params) {
                Ok(params) => {
                    let arguments = params.arguments.unwrap_or(Value::Object(Default::default()));
                    let result = self.service.call(&params.name, arguments).await;
                    JsonRpcResponse::result(id, result)
                }
                Err(e) => JsonRpcResponse::error(Some(id), e),
            },
            other => JsonRpcResponse::error(
                Some(id),
                JsonRpcError::new(codes::METHOD_NOT_FOUND, format!("method not found: {other}")),
            ),
        };
        Some(response)
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> std::result::Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| JsonRpcError::new(codes::INVALID_PARAMS, format!("invalid params: {e}")))
}
