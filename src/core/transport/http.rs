//! HTTP transport implementation.
//!
//! JSON-RPC over POST, with the session handshake applied to every message.
//! The session id travels in the `mcp-session-id` header both ways.
//!
//! - `POST {rpc_path}`: one JSON-RPC message (batches are rejected)
//! - `GET {rpc_path}`: SSE stream of server-initiated messages for a session
//! - `DELETE {rpc_path}`: terminate a session
//! - `GET /health`, `GET /`: status and server info

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, Uri};
use rmcp::model::{CallToolRequestParam, ListToolsResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::sync::broadcast::error::RecvError;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, instrument, warn};

use super::{TransportConfig, TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::server::SERVER_INSTRUCTIONS;
use crate::core::session::{Established, IncomingRequest, SessionError, TransportMetadata};
use crate::domains::tools::ToolError;

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Protocol version announced on `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// A request without an id expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    fn id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    fn params_object(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref().and_then(Value::as_object)
    }
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// The request id, or `null` when it could not be determined.
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    pub fn error_with_data(
        id: Value,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Malformed JSON. The id is unknown.
    pub fn parse_error() -> Self {
        Self::error(Value::Null, -32700, "Parse error")
    }

    /// Method not found error.
    pub fn method_not_found(id: Value) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Value, msg: impl Into<String>) -> Self {
        Self::error(id, -32600, msg)
    }

    /// Invalid params error.
    pub fn invalid_params(id: Value, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error. Details stay in the log.
    pub fn internal_error(id: Value) -> Self {
        Self::error(id, -32603, "Internal server error")
    }

    pub fn from_session_error(id: Value, err: &SessionError) -> Self {
        let data = match err {
            SessionError::MissingContext(missing) => Some(json!({ "missing": missing })),
            _ => None,
        };
        Self::error_with_data(id, err.code(), err.to_string(), data)
    }

    pub fn from_tool_error(id: Value, err: &ToolError) -> Self {
        Self::error_with_data(id, err.code(), err.client_message(), err.data())
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance (owns the session registry).
    server: McpServer,
    rpc_path: Arc<str>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Create from TransportConfig (extracts HTTP config).
    pub fn from_transport_config(config: &TransportConfig) -> Option<Self> {
        match config {
            TransportConfig::Http(http_config) => Some(Self::new(http_config.clone())),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the router. Exposed so the routes can be driven without a
    /// listener.
    pub fn router(&self, server: McpServer) -> Router {
        let state = AppState {
            server,
            rpc_path: Arc::from(self.config.rpc_path.as_str()),
        };

        let mut app = Router::new()
            .route(
                &self.config.rpc_path,
                get(handle_stream).post(handle_rpc).delete(handle_terminate),
            )
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([http::HeaderName::from_static(SESSION_HEADER)]);
            app = app.layer(cors);
        }

        app
    }

    /// Run the HTTP transport until ctrl-c, then close every session.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let sessions = server.sessions().clone();
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Stream:   GET {}", self.config.rpc_path);
        info!("  → Close:    DELETE {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TransportError::serve("HTTP", e))?;

        sessions.shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "rpc": &*state.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "sessionHeader": SESSION_HEADER,
        "documentation": format!(
            "POST an initialize request to {} with endpoint, namespace and dataset \
             headers, then send the returned {} header on every request",
            state.rpc_path, SESSION_HEADER
        )
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "sessions": state.server.sessions().len().await
    }))
}

// ============================================================================
// Request metadata
// ============================================================================

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn transport_metadata(headers: &HeaderMap, uri: &Uri) -> TransportMetadata {
    let mut metadata = TransportMetadata::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            metadata.insert_header(name.as_str(), value);
        }
    }
    match uri.query() {
        Some(query) => metadata.with_query_string(query),
        None => metadata,
    }
}

fn rpc_response(status: StatusCode, session: Option<&str>, body: JsonRpcResponse) -> Response {
    let mut response = (status, Json(body)).into_response();
    attach_session(&mut response, session);
    response
}

fn attach_session(response: &mut Response, session: Option<&str>) {
    if let Some(value) = session.and_then(|id| HeaderValue::from_str(id).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
}

fn session_rejection(id: Value, err: &SessionError) -> Response {
    rpc_response(
        StatusCode::BAD_REQUEST,
        None,
        JsonRpcResponse::from_session_error(id, err),
    )
}

// ============================================================================
// POST: JSON-RPC messages
// ============================================================================

/// Handle one JSON-RPC message.
#[instrument(skip_all, fields(method, session))]
async fn handle_rpc(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Malformed JSON-RPC payload: {}", e);
            return rpc_response(StatusCode::BAD_REQUEST, None, JsonRpcResponse::parse_error());
        }
    };

    if payload.is_array() {
        return rpc_response(
            StatusCode::BAD_REQUEST,
            None,
            JsonRpcResponse::invalid_request(Value::Null, "Batch requests are not supported"),
        );
    }

    let fallback_id = payload.get("id").cloned().unwrap_or(Value::Null);
    let request = match serde_json::from_value::<JsonRpcRequest>(payload) {
        Ok(request) if request.jsonrpc == "2.0" => request,
        _ => {
            return rpc_response(
                StatusCode::BAD_REQUEST,
                None,
                JsonRpcResponse::invalid_request(fallback_id, "Invalid Request"),
            );
        }
    };

    tracing::Span::current().record("method", request.method.as_str());
    info!("Received JSON-RPC request: {}", request.method);

    let metadata = transport_metadata(&headers, &uri);
    let incoming = IncomingRequest {
        session_id: session_id(&headers),
        method: &request.method,
        params: request.params_object(),
        metadata: &metadata,
    };
    let established = match state.server.handshake().establish(&incoming).await {
        Ok(established) => established,
        Err(err) => return session_rejection(request.id(), &err),
    };
    tracing::Span::current().record("session", established.session_id.as_str());

    if request.is_notification() {
        handle_notification(&request);
        let mut response = StatusCode::ACCEPTED.into_response();
        attach_session(&mut response, Some(&established.session_id));
        return response;
    }

    let body = process_request(&state, &established, request).await;
    rpc_response(StatusCode::OK, Some(&established.session_id), body)
}

/// Process an admitted JSON-RPC request and return the response.
async fn process_request(
    state: &AppState,
    session: &Established,
    request: JsonRpcRequest,
) -> JsonRpcResponse {
    match request.method.as_str() {
        "initialize" => handle_initialize(state, request),
        "ping" => JsonRpcResponse::success(request.id(), json!({})),
        "tools/list" => handle_tools_list(state, request),
        "tools/call" => handle_tools_call(state, session, request).await,
        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id())
        }
    }
}

fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    let result = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version()
        },
        "instructions": SERVER_INSTRUCTIONS
    });

    JsonRpcResponse::success(request.id(), result)
}

fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/list request");

    let result = ListToolsResult {
        tools: state.server.tools().list_tools(),
        next_cursor: None,
        meta: None,
    };
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(request.id(), value),
        Err(e) => {
            warn!("Failed to serialize tool list: {}", e);
            JsonRpcResponse::internal_error(request.id())
        }
    }
}

async fn handle_tools_call(
    state: &AppState,
    session: &Established,
    request: JsonRpcRequest,
) -> JsonRpcResponse {
    info!("Processing tools/call request");
    let id = request.id();

    let Some(params) = request.params else {
        return JsonRpcResponse::invalid_params(id, "Missing params");
    };
    let call = match serde_json::from_value::<CallToolRequestParam>(params) {
        Ok(call) => call,
        Err(e) => return JsonRpcResponse::invalid_params(id, format!("Invalid params: {e}")),
    };

    let outcome = state
        .server
        .call_tool(&call.name, call.arguments, &session.context)
        .await;

    let result = match outcome {
        Ok(result) => result,
        Err(err) => return JsonRpcResponse::from_tool_error(id, &err),
    };

    notify_tool_completed(state, session, &call.name, result.is_error.unwrap_or(false)).await;

    match serde_json::to_value(&result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            warn!("Failed to serialize tool result: {}", e);
            JsonRpcResponse::internal_error(id)
        }
    }
}

/// Tell any open stream on the session that a tool call finished.
async fn notify_tool_completed(state: &AppState, session: &Established, tool: &str, failed: bool) {
    let message = json!({
        "jsonrpc": "2.0",
        "method": "notifications/message",
        "params": {
            "level": if failed { "warning" } else { "info" },
            "logger": "tools",
            "data": { "tool": tool, "isError": failed }
        }
    });
    let delivered = state.server.sessions().publish(&session.session_id, message).await;
    if let Some(receivers) = delivered.filter(|n| *n > 0) {
        debug!("Notified {} stream(s)", receivers);
    }
}

fn handle_notification(request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => info!("Client sent initialized notification"),
        method => debug!("Received notification: {}", method),
    }
}

// ============================================================================
// GET: server-initiated stream
// ============================================================================

/// Open an SSE stream for an active session.
async fn handle_stream(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match state.server.handshake().require_session(session_id(&headers)).await {
        Ok(session) => session,
        Err(err) => return session_rejection(Value::Null, &err),
    };
    let Some(receiver) = state.server.sessions().subscribe(&session.id).await else {
        return session_rejection(Value::Null, &SessionError::InvalidSession);
    };
    info!(session_id = %session.id, "Stream opened");

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(message) => {
                    let event = Event::default()
                        .event("message")
                        .json_data(&message)
                        .unwrap_or_else(|_| Event::default().comment("unencodable message"));
                    return Some((Ok::<_, Infallible>(event), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Stream lagged, dropped {} message(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
        .into_response();
    attach_session(&mut response, Some(&session.id));
    response
}

// ============================================================================
// DELETE: termination
// ============================================================================

async fn handle_terminate(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.server.handshake().terminate(session_id(&headers)).await {
        Ok(closed) => {
            info!(closed, "Session termination requested");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => session_rejection(Value::Null, &err),
    }
}
