//! Multi-query tool.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{FlureeClient, downstream_result};
use crate::core::session::BackendTarget;
use crate::domains::tools::definitions::common::error_result;
use crate::domains::tools::handlers::ToolDefinition;
use crate::domains::tools::validation::{Validate, Violations};

/// One named query inside a multi-query request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NamedQuery {
    #[serde(default = "default_select")]
    pub select: Vec<String>,

    #[serde(default = "default_from")]
    pub from: String,
}

/// Parameters for the multi-query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlureeMultiQueryParams {
    /// Queries keyed by the name their result is returned under.
    #[serde(default = "default_queries")]
    pub queries: BTreeMap<String, NamedQuery>,
}

fn default_select() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_from() -> String {
    "_collection".to_string()
}

fn default_queries() -> BTreeMap<String, NamedQuery> {
    BTreeMap::from([
        (
            "query1".to_string(),
            NamedQuery { select: default_select(), from: "_collection".to_string() },
        ),
        (
            "query2".to_string(),
            NamedQuery { select: default_select(), from: "_predicate".to_string() },
        ),
    ])
}

impl Validate for FlureeMultiQueryParams {
    fn validate(&self, v: &mut Violations) {
        v.non_empty("queries", self.queries.len());
        for (name, query) in &self.queries {
            v.non_empty(&format!("queries.{name}.select"), query.select.len());
            v.non_empty(&format!("queries.{name}.from"), query.from.trim().len());
        }
    }
}

/// Sends several FlureeQL queries in a single request.
#[derive(Debug, Clone)]
pub struct FlureeMultiQueryTool {
    client: FlureeClient,
}

impl FlureeMultiQueryTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolDefinition for FlureeMultiQueryTool {
    const NAME: &'static str = "flureeMultiQueryTool";
    const TITLE: &'static str = "Fluree Multi-Query Tool";
    const DESCRIPTION: &'static str =
        "Sends multiple FlureeQL queries in a single request to the multi-query endpoint.";

    type Params = FlureeMultiQueryParams;

    async fn execute(
        &self,
        params: FlureeMultiQueryParams,
        target: &BackendTarget,
    ) -> CallToolResult {
        info!("Running {} queries", params.queries.len());
        let body = match serde_json::to_value(&params.queries) {
            Ok(body) => body,
            Err(e) => return error_result(&format!("Invalid queries: {e}")),
        };
        let outcome = self.client.post(&target.ledger_url("multi-query"), Some(&body)).await;
        downstream_result("Fluree Multi-Query Result", outcome)
    }
}
