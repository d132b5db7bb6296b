//! Core module containing shared infrastructure components.
//!
//! Configuration, error handling, sessions and connection context, the
//! server handler and the transports.

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
