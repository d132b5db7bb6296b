//! Tools domain module.
//!
//! Tools are the operations MCP clients call against a Fluree target.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `handlers.rs` - `ToolDefinition` trait and the type-erasing adapter
//! - `validation.rs` - Argument bounds that serde cannot express
//! - `registry.rs` - Immutable tool table and the dispatch pipeline
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a params struct and a
//!    `ToolDefinition` impl
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it in `ToolRegistry::with_default_tools`
//!
//! Both transports pick it up from the registry.

pub mod definitions;
mod error;
mod handlers;
mod registry;
pub mod validation;

pub use error::ToolError;
pub use handlers::{PreparedCall, ToolAdapter, ToolDefinition, ToolHandler};
pub use registry::{ToolDescriptor, ToolRegistry, ToolRegistryBuilder};
