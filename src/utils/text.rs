/// Cuts `value` to at most `max_bytes` without splitting a UTF-8 character.
pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Shortens a response body for inclusion in an error message.
pub fn preview_body(body: &str, max_bytes: usize) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= max_bytes {
        return trimmed.to_string();
    }
    format!(
        "{}... (truncated, {} total bytes)",
        truncate_utf8_prefix(trimmed, max_bytes),
        trimmed.len()
    )
}

#[cfg(test)]
mod tests {
    use super::{preview_body, truncate_utf8_prefix};

    #[test]
    fn truncate_utf8_prefix_keeps_short_values() {
        assert_eq!(truncate_utf8_prefix("case", 10), "case");
    }

    #[test]
    fn truncate_utf8_prefix_does_not_split_multibyte_chars() {
        // "仿真" is 6 bytes; cutting at 4 must back off to the first char.
        assert_eq!(truncate_utf8_prefix("仿真", 4), "仿");
    }

    #[test]
    fn preview_body_reports_total_length_when_truncated() {
        let body = "x".repeat(20);
        let preview = preview_body(&body, 5);
        assert_eq!(preview, "xxxxx... (truncated, 20 total bytes)");
    }
}
