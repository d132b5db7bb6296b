//! Echo tool.
//!
//! Returns its input unchanged. Useful for checking that a session is wired
//! up end to end without touching the database.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::common::success_result;
use crate::core::session::BackendTarget;
use crate::domains::tools::handlers::ToolDefinition;
use crate::domains::tools::validation::Validate;

/// Parameters for the echo tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EchoParams {
    /// The message to echo back.
    pub message: String,
}

impl Validate for EchoParams {}

/// Echo tool implementation.
#[derive(Debug, Clone, Default)]
pub struct EchoTool;

#[async_trait]
impl ToolDefinition for EchoTool {
    const NAME: &'static str = "echoText";
    const TITLE: &'static str = "Echo Tool";
    const DESCRIPTION: &'static str = "Echoes back the provided message";

    type Params = EchoParams;

    async fn execute(&self, params: EchoParams, _target: &BackendTarget) -> CallToolResult {
        info!("Echo tool called");
        success_result(format!("Tool echo: {}", params.message))
    }
}
