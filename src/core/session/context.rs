//! Connection context resolution.
//!
//! Every tool call runs against one Fluree target, identified by the triple
//! `endpoint` / `namespace` / `dataset`. The values can arrive through
//! several channels and are layered field by field: transport headers, then
//! query parameters, then the request body's `params` object, then the value
//! a session already resolved earlier, then the process-wide defaults.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One of the three fields that make up a connection context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextField {
    Endpoint,
    Namespace,
    Dataset,
}

impl ContextField {
    /// All fields, in reporting order.
    pub const ALL: [ContextField; 3] = [Self::Endpoint, Self::Namespace, Self::Dataset];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Endpoint => "endpoint",
            Self::Namespace => "namespace",
            Self::Dataset => "dataset",
        }
    }

    /// Header names accepted for this field (lowercase). Fluree's own
    /// vocabulary (`dburl`, `network`, `ledger`) is accepted as an alias.
    pub fn header_names(&self) -> &'static [&'static str] {
        match self {
            Self::Endpoint => &["endpoint", "dburl"],
            Self::Namespace => &["namespace", "network"],
            Self::Dataset => &["dataset", "ledger"],
        }
    }

    /// Keys accepted in the query string and in the body `params` object.
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            Self::Endpoint => &["endpoint", "dbUrl"],
            Self::Namespace => &["namespace", "network"],
            Self::Dataset => &["dataset", "ledger"],
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join field names for error messages (`"namespace, dataset"`).
pub fn join_fields(fields: &[ContextField]) -> String {
    fields
        .iter()
        .map(ContextField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A possibly incomplete connection context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionContext {
    pub endpoint: Option<String>,
    pub namespace: Option<String>,
    pub dataset: Option<String>,
}

impl ConnectionContext {
    /// Build a context, treating empty strings as unset.
    pub fn new(
        endpoint: Option<impl Into<String>>,
        namespace: Option<impl Into<String>>,
        dataset: Option<impl Into<String>>,
    ) -> Self {
        Self {
            endpoint: endpoint.and_then(|v| normalize(v.into())),
            namespace: namespace.and_then(|v| normalize(v.into())),
            dataset: dataset.and_then(|v| normalize(v.into())),
        }
    }

    pub fn get(&self, field: ContextField) -> Option<&str> {
        match field {
            ContextField::Endpoint => self.endpoint.as_deref(),
            ContextField::Namespace => self.namespace.as_deref(),
            ContextField::Dataset => self.dataset.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: ContextField) -> &mut Option<String> {
        match field {
            ContextField::Endpoint => &mut self.endpoint,
            ContextField::Namespace => &mut self.namespace,
            ContextField::Dataset => &mut self.dataset,
        }
    }

    pub fn is_empty(&self) -> bool {
        ContextField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Fields that are still unset, in reporting order.
    pub fn missing_fields(&self) -> Vec<ContextField> {
        ContextField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Field-wise: keep this context's value when set, otherwise take
    /// `lower`'s.
    pub fn or(mut self, lower: &ConnectionContext) -> Self {
        for field in ContextField::ALL {
            let slot = self.slot_mut(field);
            if slot.is_none() {
                *slot = lower.get(field).map(str::to_string);
            }
        }
        self
    }

    /// Overwrite fields with the non-empty values of `update`. Unset fields
    /// in `update` never clear a value.
    pub fn merge(&mut self, update: &ConnectionContext) {
        for field in ContextField::ALL {
            if let Some(value) = update.get(field) {
                *self.slot_mut(field) = Some(value.to_string());
            }
        }
    }

    /// Extract the values supplied by a single request, before any session
    /// or default fallback.
    pub fn from_request(metadata: &TransportMetadata, params: Option<&Map<String, Value>>) -> Self {
        let mut ctx = Self::default();
        for field in ContextField::ALL {
            *ctx.slot_mut(field) = metadata
                .header_value(field)
                .or_else(|| metadata.query_value(field))
                .or_else(|| params.and_then(|p| body_value(p, field)));
        }
        ctx
    }

    /// Convert into a complete target, or report which fields are missing.
    pub fn complete(&self) -> Result<BackendTarget, Vec<ContextField>> {
        match (&self.endpoint, &self.namespace, &self.dataset) {
            (Some(endpoint), Some(namespace), Some(dataset)) => Ok(BackendTarget {
                endpoint: endpoint.clone(),
                namespace: namespace.clone(),
                dataset: dataset.clone(),
            }),
            _ => Err(self.missing_fields()),
        }
    }
}

/// A complete connection context, handed to tool handlers by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTarget {
    pub endpoint: String,
    pub namespace: String,
    pub dataset: String,
}

impl BackendTarget {
    /// URL of a ledger-scoped Fluree action, e.g. `{endpoint}/fdb/{ns}/{ds}/query`.
    pub fn ledger_url(&self, action: &str) -> String {
        format!(
            "{}/fdb/{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.namespace,
            self.dataset,
            action
        )
    }

    /// URL of a server-scoped Fluree action, e.g. `{endpoint}/fdb/nw-state`.
    pub fn server_url(&self, action: &str) -> String {
        format!("{}/fdb/{}", self.endpoint.trim_end_matches('/'), action)
    }
}

impl From<BackendTarget> for ConnectionContext {
    fn from(target: BackendTarget) -> Self {
        Self {
            endpoint: Some(target.endpoint),
            namespace: Some(target.namespace),
            dataset: Some(target.dataset),
        }
    }
}

/// Transport-level request metadata: headers and query parameters.
///
/// Header names are stored lowercase so lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct TransportMetadata {
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
}

impl TransportMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Parse a raw `a=1&b=2` query string. Malformed input yields no
    /// parameters rather than an error.
    pub fn with_query_string(mut self, raw: &str) -> Self {
        if let Ok(pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
            self.query.extend(pairs);
        }
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn header_value(&self, field: ContextField) -> Option<String> {
        field
            .header_names()
            .iter()
            .find_map(|name| self.headers.get(*name).cloned().and_then(normalize))
    }

    fn query_value(&self, field: ContextField) -> Option<String> {
        field
            .param_names()
            .iter()
            .find_map(|name| self.query.get(*name).cloned().and_then(normalize))
    }
}

fn body_value(params: &Map<String, Value>, field: ContextField) -> Option<String> {
    field
        .param_names()
        .iter()
        .find_map(|name| {
            params
                .get(*name)
                .and_then(Value::as_str)
                .and_then(|v| normalize(v.to_string()))
        })
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Outcome of resolving a request's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub context: ConnectionContext,
    /// Unset fields, in the order `endpoint, namespace, dataset`.
    pub missing: Vec<ContextField>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Resolve the connection context for one request.
///
/// Pure: first non-empty value wins per field, in the order header, query
/// parameter, body parameter, `previous`, `defaults`.
pub fn resolve(
    metadata: &TransportMetadata,
    params: Option<&Map<String, Value>>,
    previous: Option<&ConnectionContext>,
    defaults: &ConnectionContext,
) -> Resolution {
    let mut context = ConnectionContext::from_request(metadata, params);
    if let Some(previous) = previous {
        context = context.or(previous);
    }
    let context = context.or(defaults);
    let missing = context.missing_fields();
    Resolution { context, missing }
}
