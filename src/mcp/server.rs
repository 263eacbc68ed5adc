use crate::app::App;
use crate::constants::mcp::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::errors::{ErrorCode, McpError, ToolError, ToolErrorKind};
use crate::mcp::catalog::{list_tools, validate_tool_args};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::services::settings::Settings;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

fn map_tool_error(tool: &str, error: &ToolError) -> McpError {
    let mut lines = vec![
        "SimError".to_string(),
        format!("tool: {}", tool),
        format!("kind: {:?}", error.kind).to_lowercase(),
        format!("code: {}", error.code),
        format!("retryable: {}", error.retryable),
        format!("message: {}", error.message),
    ];
    if let Some(hint) = &error.hint {
        lines.push(format!("hint: {}", hint));
    }
    let message = lines.join("\n");

    let code = match error.kind {
        ToolErrorKind::InvalidParams => ErrorCode::InvalidParams,
        ToolErrorKind::Timeout => ErrorCode::RequestTimeout,
        ToolErrorKind::Denied if error.code == "SESSION_REQUIRED" => ErrorCode::SessionRequired,
        ToolErrorKind::Remote => ErrorCode::RemoteRejected,
        ToolErrorKind::Denied | ToolErrorKind::NotFound => ErrorCode::InvalidRequest,
        ToolErrorKind::Retryable | ToolErrorKind::Internal => ErrorCode::InternalError,
    };
    McpError::new(code, message)
}

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools() })
    }

    pub async fn handle_tools_call(&self, name: &str, raw_args: Value) -> Result<Value, McpError> {
        let args = match raw_args {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => raw_args,
            _ => {
                return Err(McpError::new(
                    ErrorCode::InvalidParams,
                    "arguments: expected an object",
                ))
            }
        };
        validate_tool_args(name, &args)?;

        let envelope = self
            .app
            .tool_executor
            .execute(name, args)
            .await
            .map_err(|err| map_tool_error(name, &err))?;

        let text = serde_json::to_string(&envelope)
            .map_err(|err| McpError::new(ErrorCode::InternalError, err.to_string()))?;
        Ok(serde_json::json!({
            "content": [ { "type": "text", "text": text } ]
        }))
    }

    /// Handles one decoded line. Returns `None` when no reply is due.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error",
                ))
            }
        };
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request",
                ))
            }
        };
        if request.jsonrpc != "2.0" {
            return request.id.map(|id| {
                JsonRpcResponse::failure(id, ErrorCode::InvalidRequest.as_i32(), "Invalid request")
            });
        }
        if request.method.starts_with("notifications/") || request.is_notification() {
            return None;
        }
        let id = request.id.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list()),
            "tools/call" => {
                let params = request.params.as_object().cloned().unwrap_or_default();
                let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
                if name.is_empty() {
                    JsonRpcResponse::failure(id, ErrorCode::InvalidParams.as_i32(), "Missing tool name")
                } else {
                    let args = params.get("arguments").cloned().unwrap_or(Value::Null);
                    match self.handle_tools_call(name, args).await {
                        Ok(result) => JsonRpcResponse::success(id, result),
                        Err(err) => JsonRpcResponse::from_error(id, err),
                    }
                }
            }
            _ => JsonRpcResponse::failure(id, ErrorCode::MethodNotFound.as_i32(), "Method not found"),
        };
        Some(response)
    }

    /// Serves line-delimited JSON-RPC until the reader reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(trimmed).await {
                let payload = serde_json::to_string(&response)
                    .map_err(|err| ToolError::internal(err.to_string()))?;
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        self.app.logger.info("stdin closed", None);
        Ok(())
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

pub async fn run_stdio(settings: Settings) -> Result<(), ToolError> {
    let server = McpServer::new(App::initialize(settings)?);
    server.run_stdio().await
}
