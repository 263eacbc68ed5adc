use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::sim_client::SimClient;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Login,
    Logout,
    Status,
}

impl SessionAction {
    pub const ALL: [SessionAction; 3] = [
        SessionAction::Login,
        SessionAction::Logout,
        SessionAction::Status,
    ];

    pub fn tool_name(self) -> &'static str {
        match self {
            SessionAction::Login => "login",
            SessionAction::Logout => "logout",
            SessionAction::Status => "session_status",
        }
    }
}

fn required_text<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::invalid_params(format!("login: missing required field '{}'", key)))
}

/// Handles the tools that manage the shared session itself.
#[derive(Clone)]
pub struct SessionManager {
    logger: Logger,
    client: Arc<SimClient>,
    action: SessionAction,
}

impl SessionManager {
    pub fn new(logger: Logger, client: Arc<SimClient>, action: SessionAction) -> Self {
        Self {
            logger: logger.child("session"),
            client,
            action,
        }
    }

    async fn login(&self, args: &Value) -> Result<Value, ToolError> {
        let username = required_text(args, "username")?.trim();
        let password = required_text(args, "password")?;
        self.client
            .login(username, password)
            .await
            .into_tool_result()
    }

    fn logout(&self) -> Value {
        match self.client.logout() {
            Some(identity) => serde_json::json!({
                "logged_out": true,
                "identity": identity,
            }),
            None => serde_json::json!({
                "logged_out": false,
                "message": "No active session.",
            }),
        }
    }

    fn status(&self) -> Value {
        match self.client.store().session() {
            Some(session) => serde_json::json!({
                "authenticated": true,
                "identity": session.identity,
                "issued_at": session.issued_at.to_rfc3339(),
            }),
            None => serde_json::json!({
                "authenticated": false,
                "hint": "Call the 'login' tool to start a session.",
            }),
        }
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for SessionManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug(self.action.tool_name(), None);
        match self.action {
            SessionAction::Login => self.login(&args).await,
            SessionAction::Logout => Ok(self.logout()),
            SessionAction::Status => Ok(self.status()),
        }
    }
}
