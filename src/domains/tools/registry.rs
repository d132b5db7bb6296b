//! Tool Registry - central registration and dispatch for all tools.
//!
//! The registry is built once at startup and is immutable afterwards.
//! Every call goes through the same pipeline, in this order:
//!
//! 1. look the tool up by name;
//! 2. validate the arguments against its input shape (defaults applied);
//! 3. require a complete connection context;
//! 4. run the handler exactly once and relay its result.
//!
//! A request that fails a gate never reaches the later ones.

use std::collections::HashMap;

use rmcp::model::{CallToolResult, Tool};
use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};

use super::definitions::{
    EchoTool, FlureeBlockRangeTool, FlureeBlockTool, FlureeClient, FlureeHistoryTool,
    FlureeMultiQueryTool, FlureeNetworkStatusTool, FlureeNewKeysTool, FlureeQueryTool,
    FlureeTransactTool,
};
use super::error::ToolError;
use super::handlers::{ToolAdapter, ToolDefinition, ToolHandler};
use crate::core::session::ConnectionContext;

// ============================================================================
// Tool Descriptor
// ============================================================================

/// A registered tool: metadata plus its type-erased handler.
pub struct ToolDescriptor {
    tool: Tool,
    handler: Box<dyn ToolHandler>,
}

impl ToolDescriptor {
    fn new<T: ToolDefinition>(definition: T) -> Self {
        let handler = ToolAdapter::new(definition);
        Self {
            tool: handler.tool(),
            handler: Box::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.tool.name
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Builder collecting tool registrations before the registry is frozen.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistryBuilder {
    /// Register a tool. Fails if a tool with the same name is already
    /// registered.
    pub fn register<T: ToolDefinition>(mut self, definition: T) -> Result<Self, ToolError> {
        if self.descriptors.iter().any(|d| d.name() == T::NAME) {
            return Err(ToolError::DuplicateTool(T::NAME.to_string()));
        }
        self.descriptors.push(ToolDescriptor::new(definition));
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        let index = self
            .descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();
        ToolRegistry {
            descriptors: self.descriptors,
            index,
        }
    }
}

/// Immutable table of every tool the server exposes.
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// The registry with every built-in tool, sharing one Fluree client.
    pub fn with_default_tools(client: FlureeClient) -> Result<Self, ToolError> {
        let registry = Self::builder()
            .register(EchoTool)?
            .register(FlureeQueryTool::new(client.clone()))?
            .register(FlureeTransactTool::new(client.clone()))?
            .register(FlureeNetworkStatusTool::new(client.clone()))?
            .register(FlureeBlockTool::new(client.clone()))?
            .register(FlureeHistoryTool::new(client.clone()))?
            .register(FlureeMultiQueryTool::new(client.clone()))?
            .register(FlureeNewKeysTool::new(client.clone()))?
            .register(FlureeBlockRangeTool::new(client))?
            .build();
        info!("Registered {} tools", registry.len());
        Ok(registry)
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.descriptors.iter().map(ToolDescriptor::name).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn list_tools(&self) -> Vec<Tool> {
        self.descriptors.iter().map(|d| d.tool.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Dispatch a tool call against `context`.
    ///
    /// The handler runs on its own task; the caller holds no lock while it
    /// waits. A panicking handler is reported as an internal error.
    #[instrument(skip(self, arguments, context))]
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
        context: &ConnectionContext,
    ) -> Result<CallToolResult, ToolError> {
        let Some(descriptor) = self.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::not_found(name));
        };

        let call = descriptor
            .handler
            .prepare(arguments.unwrap_or_default())
            .map_err(|violations| {
                warn!(?violations, "Invalid arguments for {}", name);
                ToolError::InvalidArguments(violations)
            })?;

        let target = context.complete().map_err(|missing| {
            warn!(?missing, "Incomplete connection context for {}", name);
            ToolError::IncompleteContext(missing)
        })?;

        info!("Calling tool {} on {}/{}", name, target.namespace, target.dataset);
        tokio::spawn(call(target)).await.map_err(|e| {
            error!("Tool {} aborted: {}", name, e);
            ToolError::internal(format!("tool {name} aborted"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{BackendTarget, ContextField};
    use crate::domains::tools::validation::{Validate, Violations};
    use async_trait::async_trait;
    use rmcp::model::RawContent;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn complete() -> ConnectionContext {
        ConnectionContext::new(Some("http://db:8090"), Some("acme"), Some("main"))
    }

    fn args(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    fn text(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(t) => &t.text,
            _ => panic!("expected text content"),
        }
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct CountedParams {
        n: i64,
    }

    impl Validate for CountedParams {
        fn validate(&self, v: &mut Violations) {
            v.min("n", self.n, 0);
        }
    }

    struct CountingTool {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ToolDefinition for CountingTool {
        const NAME: &'static str = "counting";
        const TITLE: &'static str = "Counting";
        const DESCRIPTION: &'static str = "Counts invocations";
        type Params = CountedParams;

        async fn execute(&self, params: CountedParams, target: &BackendTarget) -> CallToolResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            CallToolResult::success(vec![rmcp::model::Content::text(format!(
                "{} on {}",
                params.n, target.dataset
            ))])
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl ToolDefinition for PanickingTool {
        const NAME: &'static str = "panicking";
        const TITLE: &'static str = "Panicking";
        const DESCRIPTION: &'static str = "Always panics";
        type Params = CountedParams;

        async fn execute(&self, _params: CountedParams, _target: &BackendTarget) -> CallToolResult {
            panic!("handler bug");
        }
    }

    fn counting_registry() -> (ToolRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ToolRegistry::builder()
            .register(CountingTool { calls: calls.clone() })
            .unwrap()
            .build();
        (registry, calls)
    }

    #[test]
    fn default_registry_has_unique_names() {
        let registry = ToolRegistry::with_default_tools(FlureeClient::default()).unwrap();
        let names = registry.tool_names();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&"echoText"));
        assert!(names.contains(&"flureeQueryTool"));
        assert!(names.contains(&"flureeTransact"));
        assert!(names.contains(&"flureeNetworkStatus"));
        assert!(names.contains(&"flureeBlockRangeWithTxnTool"));
        assert_eq!(registry.list_tools().len(), 9);
    }

    #[test]
    fn duplicate_registration_fails() {
        let err = ToolRegistry::builder()
            .register(EchoTool)
            .and_then(|b| b.register(EchoTool))
            .err()
            .unwrap();
        assert_eq!(err, ToolError::DuplicateTool("echoText".into()));
    }

    #[tokio::test]
    async fn echo_with_complete_context() {
        let registry = ToolRegistry::with_default_tools(FlureeClient::default()).unwrap();
        let result = registry
            .dispatch("echoText", args(json!({"message": "hi"})), &complete())
            .await
            .unwrap();
        assert_eq!(text(&result), "Tool echo: hi");
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_first() {
        let (registry, calls) = counting_registry();
        let err = registry
            .dispatch("nope", args(json!({"n": "bad"})), &ConnectionContext::default())
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::NotFound("nope".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_arguments_are_rejected_before_context() {
        let (registry, calls) = counting_registry();
        let err = registry
            .dispatch("counting", args(json!({"n": -1})), &ConnectionContext::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::InvalidArguments(vec!["n must be >= 0 (got -1)".into()])
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incomplete_context_is_rejected_before_handler() {
        let (registry, calls) = counting_registry();
        let partial = ConnectionContext::new(Some("http://db:8090"), None::<String>, Some("main"));
        let err = registry
            .dispatch("counting", args(json!({"n": 1})), &partial)
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::IncompleteContext(vec![ContextField::Namespace]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_request_runs_handler_once() {
        let (registry, calls) = counting_registry();
        let result = registry
            .dispatch("counting", args(json!({"n": 7})), &complete())
            .await
            .unwrap();
        assert_eq!(text(&result), "7 on main");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_error() {
        let registry = ToolRegistry::builder().register(PanickingTool).unwrap().build();
        let err = registry
            .dispatch("panicking", args(json!({"n": 1})), &complete())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Internal(_)));
        assert_eq!(err.client_message(), "Internal server error");
    }
}
