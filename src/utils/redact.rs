use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "token",
    "access_token",
    "accesstoken",
    "authorization",
    "secret",
    "cookie",
    "set-cookie",
];

static INLINE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("jwt redaction regex"),
            INLINE_REDACTION,
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{8,})").expect("bearer redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(
                r#"(?i)\b(password|passwd|token|access[_-]?token|authorization)\b("?\s*[:=]\s*"?)([^\s"',}]+)"#,
            )
            .expect("key-value redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    SENSITIVE_KEYS.contains(&normalized.as_str())
        || normalized.contains("password")
        || normalized.ends_with("token")
}

/// Masks credentials embedded in free text and caps its length.
pub fn redact_text(value: &str, max_length: usize) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    if out.len() > max_length {
        return format!("{}...", truncate_utf8_prefix(&out, max_length));
    }
    out
}

pub fn redact_object(value: &Value, max_length: usize) -> Value {
    match value {
        Value::String(text) => Value::String(redact_text(text, max_length)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_object(item, max_length))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map {
                if is_sensitive_key(key) && !entry.is_null() {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                } else {
                    out.insert(key.clone(), redact_object(entry, max_length));
                }
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}
