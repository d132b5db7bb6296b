//! STDIO transport implementation.
//!
//! There is exactly one client and no session handshake: every tool call
//! runs against the configured Fluree defaults.

use rmcp::ServiceExt;
use tracing::{info, warn};

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        let missing = server.handshake().defaults().missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "Default context incomplete; tool calls will be rejected");
        }
        info!("Ready - communicating via stdin/stdout");

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::serve("STDIO", e))?;

        info!("STDIO transport finished");
        Ok(())
    }
}
