//! Session and handshake error types.

use thiserror::Error;

use super::context::{ContextField, join_fields};

/// JSON-RPC code for a missing, unknown or misplaced session identifier.
pub const SESSION_ERROR_CODE: i32 = -32000;

/// JSON-RPC code for unresolved connection-context fields.
pub const MISSING_CONTEXT_CODE: i32 = -32001;

/// Errors raised by the handshake before any dispatch happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session id where one is required, or an id the registry does not
    /// know.
    #[error("Bad Request: No valid session ID provided")]
    InvalidSession,

    /// An `initialize` request that already carries a session id.
    #[error("Bad Request: Session already initialized")]
    AlreadyInitialized,

    /// Required connection fields could not be resolved.
    #[error("Missing required parameter(s): {}", join_fields(.0))]
    MissingContext(Vec<ContextField>),
}

impl SessionError {
    /// The JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidSession | Self::AlreadyInitialized => SESSION_ERROR_CODE,
            Self::MissingContext(_) => MISSING_CONTEXT_CODE,
        }
    }
}
