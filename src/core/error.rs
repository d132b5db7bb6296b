//! Error types and handling for the MCP server.
//!
//! Each layer keeps its own error enum; this module unifies them for code
//! that spans layers, such as server construction and the binary.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Error originating from session handling.
    #[error("Session error: {0}")]
    Session(#[from] super::session::SessionError),

    /// Error originating from a transport.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ToolError;

    #[test]
    fn layer_errors_convert() {
        let err: Error = ToolError::DuplicateTool("echoText".into()).into();
        assert_eq!(err.to_string(), "Tool error: Duplicate tool name: echoText");

        let err: Error = super::super::session::SessionError::InvalidSession.into();
        assert!(matches!(err, Error::Session(_)));

        let err: Error = super::super::transport::TransportError::init("no stdin").into();
        assert_eq!(
            err.to_string(),
            "Transport error: Server initialization error: no stdin"
        );
    }
}
