//! Network status tool.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::{FlureeClient, downstream_result};
use crate::core::session::BackendTarget;
use crate::domains::tools::handlers::ToolDefinition;
use crate::domains::tools::validation::Validate;

/// The network status tool takes no parameters.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

impl Validate for NoParams {}

/// Reports raft state, servers, ledgers and queued transactions.
#[derive(Debug, Clone)]
pub struct FlureeNetworkStatusTool {
    client: FlureeClient,
}

impl FlureeNetworkStatusTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolDefinition for FlureeNetworkStatusTool {
    const NAME: &'static str = "flureeNetworkStatus";
    const TITLE: &'static str = "Fluree Network Status Tool";
    const DESCRIPTION: &'static str =
        "Retrieves the current status of the Fluree network including raft state, list of servers, ledgers, and queued transactions.";

    type Params = NoParams;

    async fn execute(&self, _params: NoParams, target: &BackendTarget) -> CallToolResult {
        info!("Fetching network status from {}", target.endpoint);
        let outcome = self.client.post(&target.server_url("nw-state"), None).await;
        downstream_result("Fluree Network Status", outcome)
    }
}
