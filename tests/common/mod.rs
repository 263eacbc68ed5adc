#![allow(dead_code)]

use once_cell::sync::Lazy;
use serde_json::Value;
use sim_mcp::app::App;
use sim_mcp::errors::McpError;
use sim_mcp::mcp::server::McpServer;
use sim_mcp::services::logger::LogLevel;
use sim_mcp::services::settings::Settings;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn settings_for(base_url: &str) -> Settings {
    Settings::default()
        .with_base_url(base_url)
        .expect("base url")
        .with_request_timeout_ms(2_000)
        .expect("timeout")
        .with_log_level(LogLevel::Error)
}

pub fn server_for(base_url: &str) -> McpServer {
    McpServer::new(App::initialize(settings_for(base_url)).expect("app"))
}

/// Runs `tools/call` and decodes the text content back into the result envelope.
pub async fn call_tool(server: &McpServer, name: &str, args: Value) -> Result<Value, McpError> {
    let result = server.handle_tools_call(name, args).await?;
    let text = result["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string();
    Ok(serde_json::from_str(&text).expect("envelope json"))
}

pub fn platform_ok(data: Value) -> Value {
    serde_json::json!({ "code": 200, "msg": "ok", "success": true, "data": data })
}
