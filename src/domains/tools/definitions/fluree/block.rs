//! Block query tool.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{FlureeClient, downstream_result};
use crate::core::session::BackendTarget;
use crate::domains::tools::handlers::ToolDefinition;
use crate::domains::tools::validation::{Validate, Violations};

/// Parameters for the block query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlureeBlockParams {
    /// Block number to fetch (default: 5).
    #[schemars(range(min = 1))]
    #[serde(default = "default_block")]
    pub block: i64,
}

fn default_block() -> i64 {
    5
}

impl Validate for FlureeBlockParams {
    fn validate(&self, v: &mut Violations) {
        v.min("block", self.block, 1);
    }
}

/// Fetches one block of the session's ledger.
#[derive(Debug, Clone)]
pub struct FlureeBlockTool {
    client: FlureeClient,
}

impl FlureeBlockTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolDefinition for FlureeBlockTool {
    const NAME: &'static str = "flureeBlockQueryTool";
    const TITLE: &'static str = "Fluree Block Query Tool";
    const DESCRIPTION: &'static str = "Queries a specific block in Fluree database.";

    type Params = FlureeBlockParams;

    async fn execute(&self, params: FlureeBlockParams, target: &BackendTarget) -> CallToolResult {
        info!("Fetching block {}", params.block);
        let body = json!({ "block": params.block });
        let outcome = self.client.post(&target.ledger_url("block"), Some(&body)).await;
        downstream_result(&format!("Fluree Block Query Result for Block {}", params.block), outcome)
    }
}
