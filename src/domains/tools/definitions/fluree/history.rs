//! Subject history tool.

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

/// Parameters for the history tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlureeHistoryParams {
    /// Subject identity, e.g. `["person/handle", "zsmith"]`.
    #[serde(default = "default_history")]
    pub history: Vec<String>,

    /// Block to read history at (default: 4).
    #[schemars(range(min = 1))]
    #[serde(default = "default_block")]
    pub block: i64,
}

fn default_history() -> Vec<String> {
    vec!["person/handle".to_string(), "zsmith".to_string()]
}

fn default_block() -> i64 {
    4
}

impl Validate for FlureeHistoryParams {
    fn validate(&self, v: &mut Violations) {
        v.non_empty("history", self.history.len());
        v.min("block", self.block, 1);
    }
}

/// Queries the history of one subject.
#[derive(Debug, Clone)]
pub struct FlureeHistoryTool {
    client: FlureeClient,
}

impl FlureeHistoryTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolDefinition for FlureeHistoryTool {
    const NAME: &'static str = "flureeHistoryQueryTool";
    const TITLE: &'static str = "Fluree History Query Tool";
    const DESCRIPTION: &'static str =
        "Queries the history of a specific entity from the Fluree database.";

    type Params = FlureeHistoryParams;

    async fn execute(&self, params: FlureeHistoryParams, target: &BackendTarget) -> CallToolResult {
        let subject = params.history.join(", ");
        info!("Fetching history of {} at block {}", subject, params.block);
        let body = json!({ "history": params.history, "block": params.block });
        let outcome = self.client.post(&target.ledger_url("history"), Some(&body)).await;
        downstream_result(
            &format!("Fluree History Query Result for {subject} at Block {}", params.block),
            outcome,
        )
    }
}
