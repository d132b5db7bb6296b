//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod common;
pub mod echo;
pub mod fluree;

pub use echo::{EchoParams, EchoTool};
pub use fluree::{
    FlureeBlockRangeTool, FlureeBlockTool, FlureeClient, FlureeHistoryTool, FlureeMultiQueryTool,
    FlureeNetworkStatusTool, FlureeNewKeysTool, FlureeQueryTool, FlureeTransactTool,
};
