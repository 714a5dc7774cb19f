use crate::errors::{AppError, AppResult};
use crate::harness::line_frames::{Frame, LineFrames};
use crate::tools::ToolRegistry;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;
use uuid::Uuid;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "oseon-mcp";
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// MCP over newline-delimited JSON-RPC 2.0. Requests are handled one at a time.
pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handles one raw frame. `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message).await,
            Err(error) => {
                tracing::warn!(error = %error, "unparsable json-rpc frame");
                Some(error_response(Value::Null, PARSE_ERROR, &format!("Parse error: {}", error)))
            }
        }
    }

    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let Value::Object(request) = message else {
            return Some(error_response(Value::Null, INVALID_REQUEST, "Invalid Request"));
        };
        let id = request.get("id").cloned();
        let is_notification = id.is_none();
        let id = id.unwrap_or(Value::Null);

        if request.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return Some(error_response(id, INVALID_REQUEST, "Invalid Request: jsonrpc must be \"2.0\""));
        }
        let Some(method) = request.get("method").and_then(Value::as_str) else {
            return Some(error_response(id, INVALID_REQUEST, "Invalid Request: missing method"));
        };
        let params = request.get("params").cloned().unwrap_or(Value::Null);

        if is_notification {
            tracing::debug!(method, "notification received");
            return None;
        }

        let outcome = match method {
            "initialize" => Ok(initialize_result(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list()),
            "tools/call" => self.tools_call(&params).await,
            other => {
                tracing::warn!(method = other, "unknown method");
                return Some(error_response(id, METHOD_NOT_FOUND, &format!("Method not found: {}", other)));
            }
        };

        Some(match outcome {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(AppError::InvalidArguments(message)) => error_response(id, INVALID_PARAMS, &message),
            Err(error) => error_response(id, INTERNAL_ERROR, &error.to_string()),
        })
    }

    fn tools_list(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .definitions()
            .iter()
            .map(|tool| tool.to_json())
            .collect();
        json!({ "tools": tools })
    }

    async fn tools_call(&self, params: &Value) -> AppResult<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidArguments("tools/call requires a tool name".to_string()))?;
        let arguments = params.get("arguments").cloned();

        let call_id = Uuid::new_v4();
        let span = tracing::info_span!("tool_call", call_id = %call_id, tool = name);
        async move {
            tracing::info!("tool call started");
            let started = std::time::Instant::now();
            let outcome = self.registry.call(name, arguments).await?;
            tracing::info!(
                is_error = outcome.is_error,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "tool call finished"
            );
            Ok::<Value, AppError>(outcome.to_json())
        }
        .instrument(span)
        .await
    }

    /// Serves requests from `reader` until it closes, writing one response line per request.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> AppResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = LineFrames::new(Some(MAX_FRAME_BYTES));
        let mut chunk = vec![0_u8; 8192];
        tracing::info!(server = SERVER_NAME, protocol = PROTOCOL_VERSION, "mcp server listening on stdio");

        loop {
            let size = reader.read(&mut chunk).await?;
            if size == 0 {
                break;
            }
            for frame in frames.push(&chunk[..size]) {
                self.respond(frame, &mut writer).await?;
            }
        }
        if let Some(frame) = frames.finish() {
            self.respond(frame, &mut writer).await?;
        }

        tracing::info!("stdin closed, mcp server stopping");
        Ok(())
    }

    async fn respond<W: AsyncWrite + Unpin>(&self, frame: Frame, writer: &mut W) -> AppResult<()> {
        let response = match frame {
            Frame::Line(line) => self.handle_line(&line).await,
            Frame::Oversized(bytes) => {
                tracing::warn!(bytes, limit = MAX_FRAME_BYTES, "dropped oversized frame");
                Some(error_response(
                    Value::Null,
                    INVALID_REQUEST,
                    &format!("Request of {} bytes exceeds the {} byte limit", bytes, MAX_FRAME_BYTES),
                ))
            }
        };
        if let Some(response) = response {
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
        Ok(())
    }
}

fn initialize_result(params: &Value) -> Value {
    let protocol = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        "instructions": "Read-only access to TRUMPF Oseon customer and production orders.",
    })
}

pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}
