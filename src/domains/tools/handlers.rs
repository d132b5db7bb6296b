//! Tool handler adapter.
//!
//! Tools are written against [`ToolDefinition`]: typed params and an
//! `execute` that receives the resolved [`BackendTarget`]. They know nothing
//! about sessions. [`ToolAdapter`] erases the params type behind
//! [`ToolHandler`] so the registry can store every tool in one table, and
//! injects the target when the call finally runs.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{CallToolResult, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::validation::{Validate, parse_params};
use crate::core::session::BackendTarget;

/// A tool call whose arguments already passed validation, waiting for its
/// target.
pub type PreparedCall = Box<dyn FnOnce(BackendTarget) -> BoxFuture<'static, CallToolResult> + Send>;

/// Type-erased handler stored in the registry.
pub trait ToolHandler: Send + Sync {
    /// Tool metadata (name, description, input schema).
    fn tool(&self) -> Tool;

    /// Validate `arguments` and bind them into a ready-to-run call.
    fn prepare(&self, arguments: Map<String, Value>) -> Result<PreparedCall, Vec<String>>;
}

/// Implemented by every concrete tool.
#[async_trait]
pub trait ToolDefinition: Send + Sync + 'static {
    /// Tool name as registered in MCP.
    const NAME: &'static str;

    /// Human-readable title.
    const TITLE: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    /// Declared input shape.
    type Params: DeserializeOwned + JsonSchema + Validate + Send + 'static;

    /// Run the tool against `target`.
    ///
    /// Downstream failures are reported in the returned result, never as a
    /// protocol error.
    async fn execute(&self, params: Self::Params, target: &BackendTarget) -> CallToolResult;

    /// Create a Tool model for this tool (metadata).
    fn to_tool() -> Tool
    where
        Self: Sized,
    {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<Self::Params>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: Some(Self::TITLE.to_string()),
        }
    }
}

/// Bridges a [`ToolDefinition`] to the registry's [`ToolHandler`].
pub struct ToolAdapter<T> {
    tool: Arc<T>,
}

impl<T: ToolDefinition> ToolAdapter<T> {
    pub fn new(tool: T) -> Self {
        Self {
            tool: Arc::new(tool),
        }
    }
}

impl<T: ToolDefinition> ToolHandler for ToolAdapter<T> {
    fn tool(&self) -> Tool {
        T::to_tool()
    }

    fn prepare(&self, arguments: Map<String, Value>) -> Result<PreparedCall, Vec<String>> {
        let params = parse_params::<T::Params>(arguments)?;
        let tool = Arc::clone(&self.tool);
        Ok(Box::new(move |target: BackendTarget| {
            async move { tool.execute(params, &target).await }.boxed()
        }))
    }
}
