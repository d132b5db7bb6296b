//! Fluree MCP Server Library
//!
//! An MCP (Model Context Protocol) server that proxies tool calls to a
//! Fluree database. Each client session is bound to one Fluree target
//! (`endpoint`, `namespace`, `dataset`), resolved when the session opens
//! and refreshed by later requests.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, sessions, the server handler and transports
//!   - **session**: context resolution, session registry and the handshake
//!   - **transport**: STDIO (rmcp) and session-aware HTTP (axum)
//! - **domains**
//!   - **tools**: tool registry, dispatch pipeline and the Fluree tools
//!
//! # Example
//!
//! ```rust,no_run
//! use fluree_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
