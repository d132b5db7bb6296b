//! Block range tool.

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

/// Parameters for the block range tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlureeBlockRangeParams {
    /// First block (default: 1).
    #[schemars(range(min = 1))]
    #[serde(default = "default_start")]
    pub start: i64,

    /// Last block, inclusive (default: 2).
    #[schemars(range(min = 1))]
    #[serde(default = "default_end")]
    pub end: i64,
}

fn default_start() -> i64 {
    1
}

fn default_end() -> i64 {
    2
}

impl Validate for FlureeBlockRangeParams {
    fn validate(&self, v: &mut Violations) {
        v.min("start", self.start, 1);
        v.min("end", self.end, 1);
        if self.end < self.start {
            v.push(format!("end must be >= start (got {} < {})", self.end, self.start));
        }
    }
}

/// Fetches block stats and transactions for a range of blocks.
#[derive(Debug, Clone)]
pub struct FlureeBlockRangeTool {
    client: FlureeClient,
}

impl FlureeBlockRangeTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolDefinition for FlureeBlockRangeTool {
    const NAME: &'static str = "flureeBlockRangeWithTxnTool";
    const TITLE: &'static str = "Fluree Block Range with Transactions Tool";
    const DESCRIPTION: &'static str =
        "Fetches block stats and transactions for a specified range of blocks in Fluree.";

    type Params = FlureeBlockRangeParams;

    async fn execute(
        &self,
        params: FlureeBlockRangeParams,
        target: &BackendTarget,
    ) -> CallToolResult {
        info!("Fetching blocks {} to {}", params.start, params.end);
        let body = json!({ "start": params.start, "end": params.end });
        let outcome = self
            .client
            .post(&target.ledger_url("block-range-with-txn"), Some(&body))
            .await;
        downstream_result(
            &format!(
                "Block range stats and transactions for blocks {} to {}",
                params.start, params.end
            ),
            outcome,
        )
    }
}
