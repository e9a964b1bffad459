//! Small string helpers for error messages and syntax rendering.

use serde_json::Value;

/// Longest value rendering an error message will carry.
const PREVIEW_MAX: usize = 100;

/// Render a value for an error message, truncated to 100 characters.
pub(crate) fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= PREVIEW_MAX {
        return text;
    }
    let truncated: String = text.chars().take(PREVIEW_MAX).collect();
    format!("{truncated}...")
}

/// Prefix every nonempty line of `text` with `prefix`.
pub(crate) fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
