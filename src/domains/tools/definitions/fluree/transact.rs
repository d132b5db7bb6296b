//! Transaction tool: creates uniquely named test collections.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use super::FlureeClient;
use crate::core::session::BackendTarget;
use crate::domains::tools::definitions::common::{error_result, structured_result};
use crate::domains::tools::handlers::ToolDefinition;
use crate::domains::tools::validation::{Validate, Violations};

const MAX_COUNT: i64 = 50;

/// Parameters for the transact tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlureeTransactParams {
    /// Number of collections to create (1-50, default: 1).
    #[schemars(range(min = 1, max = 50))]
    #[serde(default = "default_count")]
    pub count: i64,
}

fn default_count() -> i64 {
    1
}

impl Validate for FlureeTransactParams {
    fn validate(&self, v: &mut Violations) {
        v.range("count", self.count, 1, MAX_COUNT);
    }
}

/// Creates `count` randomly named collections, one transaction each.
#[derive(Debug, Clone)]
pub struct FlureeTransactTool {
    client: FlureeClient,
}

impl FlureeTransactTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }

    /// Transaction body for the collection created at `index`.
    pub fn collection_transaction(index: i64) -> Value {
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        json!([{
            "_id": "_collection",
            "name": format!("test_{suffix}_{index}"),
        }])
    }
}

#[async_trait]
impl ToolDefinition for FlureeTransactTool {
    const NAME: &'static str = "flureeTransact";
    const TITLE: &'static str = "Fluree Transaction Tool";
    const DESCRIPTION: &'static str = "Creates multiple random collections in Fluree DB.";

    type Params = FlureeTransactParams;

    async fn execute(
        &self,
        params: FlureeTransactParams,
        target: &BackendTarget,
    ) -> CallToolResult {
        let url = target.ledger_url("transact");
        info!("Creating {} collection(s) via {}", params.count, url);

        let mut results = Vec::with_capacity(params.count as usize);
        let mut failures = 0;
        for index in 1..=params.count {
            let tx = Self::collection_transaction(index);
            match self.client.post(&url, Some(&tx)).await {
                Ok(data) => results.push(json!({ "success": true, "index": index, "data": data })),
                Err(e) => {
                    warn!("Transaction {} failed: {}", index, e);
                    failures += 1;
                    results.push(json!({
                        "success": false,
                        "index": index,
                        "error": e.to_string()
                    }));
                }
            }
        }

        if failures == params.count {
            let detail = serde_json::to_string_pretty(&results).unwrap_or_default();
            return error_result(&format!("All {failures} transaction(s) failed:\n\n{detail}"));
        }
        let created = params.count - failures;
        structured_result(&format!("{created} collection(s) created"), Value::Array(results))
    }
}
