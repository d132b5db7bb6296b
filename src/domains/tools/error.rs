//! Tool-specific error types.

use serde_json::{Value, json};
use thiserror::Error;

use crate::core::session::{ContextField, MISSING_CONTEXT_CODE, context::join_fields};

/// Errors that can occur while dispatching a tool call.
///
/// Failures of the downstream database are not represented here: tools
/// report those inside their own `CallToolResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The arguments do not satisfy the tool's input shape.
    #[error("Invalid arguments: {}", .0.join("; "))]
    InvalidArguments(Vec<String>),

    /// The connection context is missing required fields.
    #[error("Missing required parameter(s): {}", join_fields(.0))]
    IncompleteContext(Vec<ContextField>),

    /// Two tools were registered under the same name.
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// JSON-RPC error code used when this error is returned to a client.
    pub fn code(&self) -> i32 {
        match self {
            Self::NotFound(_) | Self::InvalidArguments(_) => -32602,
            Self::IncompleteContext(_) => MISSING_CONTEXT_CODE,
            Self::DuplicateTool(_) | Self::Internal(_) => -32603,
        }
    }

    /// Client-facing message. Internal details are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            Self::DuplicateTool(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Structured error data for the JSON-RPC `error.data` member.
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::InvalidArguments(violations) => Some(json!({ "violations": violations })),
            Self::IncompleteContext(missing) => Some(json!({ "missing": missing })),
            _ => None,
        }
    }
}
