//! Transport error types.

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

/// Failures that stop a transport from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The MCP handshake over the transport never completed.
    #[error("Server initialization error: {0}")]
    Init(String),

    /// The transport stopped with an error after it was up.
    #[error("{transport} transport failed: {message}")]
    Serve {
        transport: &'static str,
        message: String,
    },
}

impl TransportError {
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }

    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    pub fn serve(transport: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Serve {
            transport,
            message: err.to_string(),
        }
    }
}
