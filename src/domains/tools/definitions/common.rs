//! Result helpers shared by all tools.

use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};
use tracing::warn;

/// Create an error result with a formatted message.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Create a success result with text content.
pub fn success_result(content: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(content)])
}

/// Create a success result carrying the raw downstream response alongside
/// its pretty-printed form.
pub fn structured_result(summary: &str, data: Value) -> CallToolResult {
    let pretty = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
    let mut result = success_result(format!("{summary}:\n\n{pretty}"));
    result.structured_content = Some(structured_content(data));
    result
}

/// Structured content must be a JSON object; anything else is wrapped
/// under `data`.
pub fn structured_content(data: Value) -> Value {
    match data {
        Value::Object(_) => data,
        other => json!({ "data": other }),
    }
}
