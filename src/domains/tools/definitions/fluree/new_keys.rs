//! Key generation tool.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::FlureeClient;
use crate::core::session::BackendTarget;
use crate::domains::tools::definitions::common::{error_result, structured_content, success_result};
use crate::domains::tools::handlers::ToolDefinition;
use crate::domains::tools::validation::Validate;

/// HTTP method used to call `new-keys`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyRequestMethod {
    Get,
    #[default]
    Post,
}

/// Parameters for the key generation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlureeNewKeysParams {
    /// `GET` or `POST` (default: `POST`).
    #[serde(default)]
    pub method: KeyRequestMethod,
}

impl Validate for FlureeNewKeysParams {}

/// Fetches a new public key, private key and auth id from Fluree.
#[derive(Debug, Clone)]
pub struct FlureeNewKeysTool {
    client: FlureeClient,
}

impl FlureeNewKeysTool {
    pub fn new(client: FlureeClient) -> Self {
        Self { client }
    }

    fn describe_keys(data: &Value) -> String {
        let field = |name: &str| data.get(name).and_then(Value::as_str).unwrap_or("<missing>");
        format!(
            "Successfully fetched keys from Fluree: {}\nPrivate Key: {}\nAuth-ID: {}",
            field("public"),
            field("private"),
            field("account-id"),
        )
    }
}

#[async_trait]
impl ToolDefinition for FlureeNewKeysTool {
    const NAME: &'static str = "flureeNewKeysTool";
    const TITLE: &'static str = "Fluree New Keys Tool";
    const DESCRIPTION: &'static str =
        "Fetches a new public key, private key, and auth-id from Fluree.";

    type Params = FlureeNewKeysParams;

    async fn execute(&self, params: FlureeNewKeysParams, target: &BackendTarget) -> CallToolResult {
        let url = target.server_url("new-keys");
        info!("Requesting new keys with {:?}", params.method);
        let outcome = match params.method {
            KeyRequestMethod::Get => self.client.get(&url).await,
            KeyRequestMethod::Post => self.client.post(&url, Some(&json!({}))).await,
        };
        match outcome {
            Ok(data) => {
                let mut result = success_result(Self::describe_keys(&data));
                result.structured_content = Some(structured_content(data));
                result
            }
            Err(e) => error_result(&format!("Failed to fetch keys: {e}")),
        }
    }
}
