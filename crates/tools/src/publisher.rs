//! Capability publisher: the tool registry as the assistant sees it.

use std::sync::Arc;
use std::time::Instant;

use bridge::BridgeClient;
use envelope::{Envelope, ErrorEnvelope, ErrorKind, Params};
use serde_json::Value;
use tracing::{info, warn};

use crate::registry::ToolRegistry;
use crate::schema::{ParamSpec, input_schema};
use crate::tool::Tool;

/// Renders registered tools for discovery and routes invocations by name.
#[derive(Clone)]
pub struct CapabilityPublisher {
    registry: Arc<ToolRegistry>,
    bridge: BridgeClient,
}

impl CapabilityPublisher {
    pub fn new(registry: ToolRegistry, bridge: BridgeClient) -> Self {
        Self {
            registry: Arc::new(registry),
            bridge,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn bridge(&self) -> &BridgeClient {
        &self.bridge
    }

    /// Every registered tool exactly once, sorted by name.
    pub fn capabilities(&self) -> Vec<mcp::Tool> {
        self.registry
            .iter()
            .map(|tool| mcp::Tool {
                name: tool.name().to_string(),
                description: Some(tool.description().to_string()),
                input_schema: input_schema(tool.params()),
            })
            .collect()
    }

    /// Invoke a tool by name. Always answers with an envelope.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Envelope {
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = name, "unknown tool");
            return ErrorEnvelope::new(ErrorKind::UnknownTool, format!("Unknown tool: {name}"))
                .endpoint(name)
                .field("tool", name)
                .build();
        };

        let args = match bind_arguments(tool.params(), arguments) {
            Ok(args) => args,
            Err(problems) => {
                warn!(tool = name, ?problems, "invalid arguments");
                return ErrorEnvelope::new(
                    ErrorKind::InvalidArguments,
                    format!("Invalid arguments for {name}: {}", problems.join("; ")),
                )
                .endpoint(tool.endpoint())
                .field("tool", name)
                .field("problems", problems)
                .build();
            }
        };

        let started = Instant::now();
        let envelope = tool.invoke(&self.bridge, args).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if envelope.is_success() {
            info!(tool = name, endpoint = tool.endpoint(), elapsed_ms, "tool call done");
        } else {
            let error_type = envelope.error_type().map(|k| k.to_string()).unwrap_or_default();
            warn!(tool = name, endpoint = tool.endpoint(), elapsed_ms, %error_type, "tool call failed");
        }
        envelope
    }
}

impl mcp::ToolService for CapabilityPublisher {
    fn tools(&self) -> Vec<mcp::Tool> {
        self.capabilities()
    }

    async fn call(&self, name: &str, arguments: Value) -> mcp::CallToolResult {
        let envelope = self.invoke(name, arguments).await;
        let is_error = !envelope.is_success();
        let text = serde_json::to_string_pretty(&envelope)
            .unwrap_or_else(|e| format!("{{\"success\": false, \"error\": \"{e}\"}}"));
        mcp::CallToolResult::text(text, is_error)
    }
}

/// Check `arguments` against `params`, filling in defaults.
///
/// Returns every problem found rather than stopping at the first.
pub fn bind_arguments(params: &[ParamSpec], arguments: Value) -> Result<Params, Vec<String>> {
    let mut given = match arguments {
        Value::Object(map) => map,
        Value::Null => Params::new(),
        other => return Err(vec![format!("arguments must be an object, got {other}")]),
    };

    let mut problems = Vec::new();
    let mut bound = Params::new();
    for spec in params {
        match given.remove(spec.name) {
            Some(value) if !value.is_null() => {
                if spec.ty.accepts(&value) {
                    bound.insert(spec.name.to_string(), value);
                } else {
                    problems.push(format!(
                        "'{}' must be a {}, got {value}",
                        spec.name,
                        spec.ty.as_str()
                    ));
                }
            }
            _ => match &spec.default {
                Some(default) => {
                    bound.insert(spec.name.to_string(), default.clone());
                }
                None => problems.push(format!("missing required argument '{}'", spec.name)),
            },
        }
    }
    for unknown in given.keys() {
        problems.push(format!("unexpected argument '{unknown}'"));
    }

    if problems.is_empty() {
        Ok(bound)
    } else {
        Err(problems)
    }
}
