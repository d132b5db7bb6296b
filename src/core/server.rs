//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] owns the three long-lived pieces every transport shares:
//! the configuration, the immutable tool registry and the session
//! handshake (which owns the session registry). The HTTP transport drives
//! the handshake per request; STDIO has a single implicit client whose
//! context is the configured defaults. Both end up in
//! [`ToolRegistry::dispatch`].

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::config::Config;
use super::error::Result;
use super::session::{ConnectionContext, Handshake, SessionRegistry};
use crate::domains::tools::{ToolError, ToolRegistry, definitions::FlureeClient};

/// Instructions returned to clients on `initialize`.
pub const SERVER_INSTRUCTIONS: &str = "Fluree MCP server. Tools query and transact against the \
     Fluree ledger selected by the session's endpoint, namespace and dataset.";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Static tool table.
    tools: Arc<ToolRegistry>,

    /// Session lifecycle and context resolution.
    handshake: Handshake,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    ///
    /// Fails if the tool table cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let client = FlureeClient::new(config.fluree.request_timeout());
        let tools = ToolRegistry::with_default_tools(client)?;
        Ok(Self::with_tools(config, tools))
    }

    /// Create a server around an already built tool table.
    pub fn with_tools(config: Config, tools: ToolRegistry) -> Self {
        let handshake = Handshake::new(SessionRegistry::new(), config.fluree.defaults.clone());
        Self {
            config: Arc::new(config),
            tools: Arc::new(tools),
            handshake,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub fn sessions(&self) -> &SessionRegistry {
        self.handshake.registry()
    }

    /// Dispatch a tool call against an already resolved context.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
        context: &ConnectionContext,
    ) -> std::result::Result<CallToolResult, ToolError> {
        self.tools.dispatch(name, arguments, context).await
    }
}

/// Convert a dispatch failure into an rmcp protocol error.
pub fn to_mcp_error(err: ToolError) -> McpError {
    McpError::new(ErrorCode(err.code()), err.client_message(), err.data())
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.tools.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let defaults = self.handshake.defaults();
        self.tools
            .dispatch(&request.name, request.arguments, defaults)
            .await
            .map_err(to_mcp_error)
    }
}
