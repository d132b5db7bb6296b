//! Transport layer for the MCP server.
//!
//! - **STDIO**: standard input/output via rmcp, one implicit client - feature: `stdio`
//! - **HTTP**: session-aware JSON-RPC over HTTP with an SSE stream - feature: `http`
//!
//! Both transports delegate tool calls to the same registry.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
