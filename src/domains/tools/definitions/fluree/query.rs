//! FlureeQL query tool.

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

/// Parameters for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlureeQueryParams {
    /// Predicates to select (default: `["*"]`).
    #[serde(default = "default_select")]
    pub select_fields: Vec<String>,

    /// Collection to select from (default: `_collection`).
    #[serde(default = "default_collection")]
    pub from_collection: String,
}

fn default_select() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_collection() -> String {
    "_collection".to_string()
}

impl Validate for FlureeQueryParams {
    fn validate(&self, v: &mut Violations) {
        v.non_empty("selectFields", self.select_fields.len());
        v.non_empty("fromCollection", self.from_collection.trim().len());
    }
}

/// Runs a basic FlureeQL select against the session's ledger.
#[derive(Debug, Clone)]
pub struct FlureeQueryTool {
    client: FlureeClient,
}

impl FlureeQueryTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolDefinition for FlureeQueryTool {
    const NAME: &'static str = "flureeQueryTool";
    const TITLE: &'static str = "Fluree Query Tool";
    const DESCRIPTION: &'static str =
        "Queries Fluree database to select collections or other data using FlureeQL syntax.";

    type Params = FlureeQueryParams;

    async fn execute(&self, params: FlureeQueryParams, target: &BackendTarget) -> CallToolResult {
        info!("Querying {}/{}", target.namespace, target.dataset);
        let body = json!({
            "select": params.select_fields,
            "from": params.from_collection,
        });
        let outcome = self.client.post(&target.ledger_url("query"), Some(&body)).await;
        downstream_result("Fluree Query Result", outcome)
    }
}
