use crate::errors::ToolError;
use reqwest::Method;
use serde_json::Value;

/// One outbound business call, built from tool arguments and discarded
/// after the request is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OperationDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Result of executing one operation against the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    /// The session is missing or was rejected; the caller must log in again.
    AuthRequired,
    /// Nothing reached the platform or the reply was unreadable. No state changed.
    TransportError { message: String, timed_out: bool },
    RemoteError(i64, String),
}

impl Outcome {
    pub fn transport(message: impl Into<String>) -> Self {
        Outcome::TransportError {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Outcome::TransportError {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::AuthRequired => "auth_required",
            Outcome::TransportError { .. } => "transport_error",
            Outcome::RemoteError(..) => "remote_error",
        }
    }

    /// Translates the outcome into what a tool handler returns.
    pub fn into_tool_result(self) -> Result<Value, ToolError> {
        match self {
            Outcome::Success(payload) => Ok(payload),
            Outcome::AuthRequired => Err(ToolError::session_required(
                "Not logged in, or the platform session has expired.",
            )),
            Outcome::TransportError {
                message,
                timed_out: true,
            } => Err(ToolError::timeout(message)
                .with_hint("The platform did not answer in time; retry or raise SIM_TIMEOUT_MS.")),
            Outcome::TransportError { message, .. } => Err(ToolError::retryable(message)
                .with_hint("Check connectivity to SIM_BASE_URL and retry.")),
            Outcome::RemoteError(code, message) => {
                let err = ToolError::remote(code, message);
                if code == 404 {
                    Err(err.with_hint("The requested resource does not exist on the platform."))
                } else {
                    Err(err)
                }
            }
        }
    }
}
