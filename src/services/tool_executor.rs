use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::limits::LOG_STRING_MAX;
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::redact::redact_object;
use crate::utils::suggest::suggest;

use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

/// Routes a tool call to its registered handler and wraps the result.
#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

pub(crate) struct ToolCallMeta {
    pub started_at: i64,
    pub trace_id: String,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    fn strip_args_for_handler(args: &Value) -> Value {
        let mut cleaned = args.clone();
        if let Value::Object(map) = &mut cleaned {
            map.remove("trace_id");
        }
        cleaned
    }

    fn summarize_result(result: &Value) -> Value {
        match result {
            Value::Array(arr) => serde_json::json!({"type": "array", "length": arr.len()}),
            Value::Object(obj) => {
                let keys: Vec<String> = obj.keys().take(10).cloned().collect();
                serde_json::json!({"type": "object", "keys": keys, "key_count": obj.len()})
            }
            Value::Null => serde_json::json!({"type": "null"}),
            _ => serde_json::json!({"type": "scalar"}),
        }
    }

    pub(crate) fn wrap_result(&self, tool: &str, result: Value, meta: ToolCallMeta) -> Value {
        serde_json::json!({
            "ok": true,
            "result": result,
            "meta": {
                "tool": tool,
                "trace_id": meta.trace_id,
                "duration_ms": chrono::Utc::now().timestamp_millis() - meta.started_at,
            },
        })
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let started_at = chrono::Utc::now().timestamp_millis();
        let Some(handler) = self.handlers.get(tool) else {
            let candidates: Vec<String> = self.handlers.keys().cloned().collect();
            let suggestions = suggest(tool, &candidates, 5);
            let hint = if suggestions.is_empty() {
                "Call tools/list to see the available tools".to_string()
            } else {
                format!("Did you mean: {}", suggestions.join(", "))
            };
            return Err(ToolError::not_found(format!("Unknown tool: {}", tool)).with_hint(hint));
        };

        let trace_id = args
            .get("trace_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        self.logger.debug(
            tool,
            Some(&serde_json::json!({
                "trace_id": trace_id,
                "args": redact_object(&args, LOG_STRING_MAX),
            })),
        );

        let result = handler.handle(Self::strip_args_for_handler(&args)).await;
        let duration_ms = chrono::Utc::now().timestamp_millis() - started_at;
        match result {
            Ok(value) => {
                self.logger.debug(
                    "tool call completed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": trace_id,
                        "duration_ms": duration_ms,
                        "result": Self::summarize_result(&value),
                    })),
                );
                Ok(self.wrap_result(
                    tool,
                    value,
                    ToolCallMeta {
                        started_at,
                        trace_id,
                    },
                ))
            }
            Err(err) => {
                self.logger.info(
                    "tool call failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": trace_id,
                        "duration_ms": duration_ms,
                        "code": err.code,
                    })),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::logger::LogLevel;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(&self, args: Value) -> Result<Value, ToolError> {
            Ok(args)
        }
    }

    struct Refuse;

    #[async_trait]
    impl ToolHandler for Refuse {
        async fn handle(&self, _args: Value) -> Result<Value, ToolError> {
            Err(ToolError::session_required("Not logged in"))
        }
    }

    fn executor() -> ToolExecutor {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("echo".to_string(), Arc::new(Echo));
        handlers.insert("get_case_details".to_string(), Arc::new(Refuse));
        ToolExecutor::new(Logger::new("test", LogLevel::Error), handlers)
    }

    #[tokio::test]
    async fn wraps_result_with_meta_and_strips_trace_id() {
        let payload = executor()
            .execute("echo", serde_json::json!({"x": 1, "trace_id": "t-1"}))
            .await
            .expect("ok");
        assert_eq!(payload["ok"], true);
        assert_eq!(payload["result"], serde_json::json!({"x": 1}));
        assert_eq!(payload["meta"]["tool"], "echo");
        assert_eq!(payload["meta"]["trace_id"], "t-1");
    }

    #[tokio::test]
    async fn unknown_tool_suggests_close_names() {
        let err = executor()
            .execute("get_case_detail", serde_json::json!({}))
            .await
            .expect_err("unknown");
        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.hint.unwrap_or_default().contains("get_case_details"));
    }

    #[tokio::test]
    async fn handler_errors_pass_through() {
        let err = executor()
            .execute("get_case_details", serde_json::json!({"case_id": 1}))
            .await
            .expect_err("refused");
        assert_eq!(err.code, "SESSION_REQUIRED");
    }

    #[test]
    fn tool_names_are_sorted() {
        assert_eq!(executor().tool_names(), vec!["echo", "get_case_details"]);
    }
}
