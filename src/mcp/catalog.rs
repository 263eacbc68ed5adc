use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .filter_map(|tool| {
            JSONSchema::compile(&tool.input_schema)
                .ok()
                .map(|schema| (tool.name.clone(), schema))
        })
        .collect()
});

/// Accepted by every tool but handled by the server, not the platform.
const TOOL_SEMANTIC_FIELDS: &[&str] = &["trace_id"];

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let (Some(tool), Some(schema)) = (tool_by_name(tool_name), TOOL_VALIDATORS.get(tool_name))
    else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let lines: Vec<String> = errors
            .take(10)
            .map(|err| {
                let path = err.instance_path.to_string();
                let at = if path.is_empty() { "(root)".to_string() } else { path };
                describe_violation(&at, &err.kind, &tool.input_schema)
            })
            .collect();
        let mut message = vec![format!("Invalid arguments for {}", tool_name)];
        message.extend(lines.into_iter().map(|line| format!("- {}", line)));
        return Err(McpError::new(ErrorCode::InvalidParams, message.join("\n")));
    }
    Ok(())
}

fn describe_violation(at: &str, kind: &ValidationErrorKind, schema: &Value) -> String {
    match kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            let known: Vec<String> = schema
                .get("properties")
                .and_then(|v| v.as_object())
                .map(|props| props.keys().cloned().collect())
                .unwrap_or_default();
            unexpected
                .iter()
                .map(|field| {
                    let hints = suggest(field, &known, 3);
                    if hints.is_empty() {
                        format!("{}: unknown field '{}'", at, field)
                    } else {
                        format!(
                            "{}: unknown field '{}' (did you mean: {})",
                            at,
                            field,
                            hints.join(", ")
                        )
                    }
                })
                .collect::<Vec<_>>()
                .join("; ")
        }
        ValidationErrorKind::Required { property } => format!(
            "{}: missing required field '{}'",
            at,
            property.as_str().unwrap_or(&property.to_string())
        ),
        ValidationErrorKind::Type { kind } => format!("{}: expected {}", at, type_label(kind)),
        ValidationErrorKind::Enum { options } => format!("{}: expected one of {}", at, options),
        other => format!("{}: {:?}", at, other),
    }
}

fn type_label(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => (*types)
            .into_iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

pub fn strip_tool_semantic_fields(schema: &Value) -> Value {
    let mut out = schema.clone();
    if let Some(props) = out.get_mut("properties").and_then(|v| v.as_object_mut()) {
        for key in TOOL_SEMANTIC_FIELDS {
            props.remove(*key);
        }
    }
    out
}

/// The catalog as advertised through `tools/list`.
pub fn list_tools() -> Vec<ToolDef> {
    TOOL_CATALOG
        .iter()
        .map(|tool| ToolDef {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: strip_tool_semantic_fields(&tool.input_schema),
        })
        .collect()
}
