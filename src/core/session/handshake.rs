//! Session handshake.
//!
//! Each incoming request is classified before anything is dispatched:
//!
//! - no session id and an `initialize` call: open a new session;
//! - a known session id: continue it, refreshing its context;
//! - anything else: reject, without touching the registry.
//!
//! States move `Initializing -> Active -> Closed`. An explicit termination
//! closes the session and removes it; the id is never accepted again.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use super::context::{ConnectionContext, TransportMetadata, resolve};
use super::error::SessionError;
use super::registry::{SessionRegistry, SessionSnapshot, SessionState, SessionTransport};

/// JSON-RPC method that opens a session.
pub const INITIALIZE_METHOD: &str = "initialize";

/// Whether a JSON-RPC method is the session-opening `initialize` call.
pub fn is_initialize(method: &str) -> bool {
    method == INITIALIZE_METHOD
}

/// The parts of a request the handshake looks at.
#[derive(Debug, Clone, Copy)]
pub struct IncomingRequest<'a> {
    pub session_id: Option<&'a str>,
    pub method: &'a str,
    pub params: Option<&'a Map<String, Value>>,
    pub metadata: &'a TransportMetadata,
}

/// How a request relates to the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind<'a> {
    NewSession,
    Continue(&'a str),
    Invalid(SessionError),
}

/// Classify a request by its session id and whether it is an `initialize`.
pub fn classify(session_id: Option<&str>, initialize: bool) -> RequestKind<'_> {
    match (session_id.filter(|id| !id.is_empty()), initialize) {
        (None, true) => RequestKind::NewSession,
        (Some(id), false) => RequestKind::Continue(id),
        (Some(_), true) => RequestKind::Invalid(SessionError::AlreadyInitialized),
        (None, false) => RequestKind::Invalid(SessionError::InvalidSession),
    }
}

/// A session the request may proceed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Established {
    pub session_id: String,
    pub context: ConnectionContext,
    /// `true` when this request created the session.
    pub created: bool,
}

/// Drives session creation, continuation and termination.
#[derive(Debug, Clone)]
pub struct Handshake {
    registry: SessionRegistry,
    defaults: Arc<ConnectionContext>,
}

impl Handshake {
    pub fn new(registry: SessionRegistry, defaults: ConnectionContext) -> Self {
        Self {
            registry,
            defaults: Arc::new(defaults),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn defaults(&self) -> &ConnectionContext {
        &self.defaults
    }

    /// Admit a request onto a new or existing session.
    #[instrument(skip_all, fields(method = request.method))]
    pub async fn establish(
        &self,
        request: &IncomingRequest<'_>,
    ) -> Result<Established, SessionError> {
        match classify(request.session_id, is_initialize(request.method)) {
            RequestKind::NewSession => self.open(request).await,
            RequestKind::Continue(id) => self.resume(id, request).await,
            RequestKind::Invalid(err) => {
                warn!("Rejected request: {}", err);
                Err(err)
            }
        }
    }

    async fn open(&self, request: &IncomingRequest<'_>) -> Result<Established, SessionError> {
        let resolution = resolve(request.metadata, request.params, None, &self.defaults);
        if !resolution.is_complete() {
            warn!(missing = ?resolution.missing, "Initialization rejected");
            return Err(SessionError::MissingContext(resolution.missing));
        }

        let session = self.registry.create(SessionTransport::new()).await;
        let active = self
            .registry
            .activate(&session.id, resolution.context)
            .await
            .ok_or(SessionError::InvalidSession)?;

        info!(session_id = %active.id, "New session initialized");
        Ok(Established {
            session_id: active.id,
            context: active.context,
            created: true,
        })
    }

    async fn resume(
        &self,
        id: &str,
        request: &IncomingRequest<'_>,
    ) -> Result<Established, SessionError> {
        match self.registry.get(id).await {
            Some(session) if session.state == SessionState::Active => {}
            _ => {
                warn!(session_id = %id, "Unknown session");
                return Err(SessionError::InvalidSession);
            }
        }

        let supplied = ConnectionContext::from_request(request.metadata, request.params);
        let context = self
            .registry
            .update_context(id, &supplied)
            .await
            .ok_or(SessionError::InvalidSession)?;

        if !supplied.is_empty() {
            debug!(session_id = %id, ?context, "Session context refreshed");
        }
        Ok(Established {
            session_id: id.to_string(),
            context,
            created: false,
        })
    }

    /// Look up the active session a non-POST request refers to.
    pub async fn require_session(
        &self,
        session_id: Option<&str>,
    ) -> Result<SessionSnapshot, SessionError> {
        let id = session_id
            .filter(|id| !id.is_empty())
            .ok_or(SessionError::InvalidSession)?;
        self.registry
            .get(id)
            .await
            .filter(|s| s.state == SessionState::Active)
            .ok_or(SessionError::InvalidSession)
    }

    /// Terminate a session.
    ///
    /// A missing id is rejected; an unknown id counts as already terminated.
    /// Returns whether a live session was closed.
    pub async fn terminate(&self, session_id: Option<&str>) -> Result<bool, SessionError> {
        let id = session_id
            .filter(|id| !id.is_empty())
            .ok_or(SessionError::InvalidSession)?;
        let closed = self.registry.close(id).await;
        if !closed {
            debug!(session_id = %id, "Termination for unknown session");
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::context::ContextField;
    use serde_json::json;

    fn handshake() -> Handshake {
        Handshake::new(SessionRegistry::new(), ConnectionContext::default())
    }

    fn full_headers() -> TransportMetadata {
        TransportMetadata::new()
            .with_header("endpoint", "http://db:8090")
            .with_header("namespace", "acme")
            .with_header("dataset", "main")
    }

    fn request<'a>(
        session_id: Option<&'a str>,
        method: &'a str,
        metadata: &'a TransportMetadata,
    ) -> IncomingRequest<'a> {
        IncomingRequest {
            session_id,
            method,
            params: None,
            metadata,
        }
    }

    #[test]
    fn classify_covers_all_cases() {
        assert_eq!(classify(None, true), RequestKind::NewSession);
        assert_eq!(classify(Some("abc"), false), RequestKind::Continue("abc"));
        assert_eq!(
            classify(Some("abc"), true),
            RequestKind::Invalid(SessionError::AlreadyInitialized)
        );
        assert_eq!(
            classify(None, false),
            RequestKind::Invalid(SessionError::InvalidSession)
        );
        assert_eq!(classify(Some(""), true), RequestKind::NewSession);
    }

    #[tokio::test]
    async fn init_with_headers_creates_session() {
        let hs = handshake();
        let meta = full_headers();

        let est = hs.establish(&request(None, "initialize", &meta)).await.unwrap();
        assert!(est.created);
        assert_eq!(
            est.context,
            ConnectionContext::new(Some("http://db:8090"), Some("acme"), Some("main"))
        );

        let stored = hs.registry().get(&est.session_id).await.unwrap();
        assert_eq!(stored.state, SessionState::Active);
        assert_eq!(stored.context, est.context);
    }

    #[tokio::test]
    async fn init_missing_dataset_is_rejected() {
        let hs = handshake();
        let meta = TransportMetadata::new()
            .with_header("endpoint", "http://db:8090")
            .with_header("namespace", "acme");

        let err = hs.establish(&request(None, "initialize", &meta)).await.unwrap_err();
        assert_eq!(err, SessionError::MissingContext(vec![ContextField::Dataset]));
        assert_eq!(err.code(), -32001);
        assert_eq!(hs.registry().len().await, 0);
    }

    #[tokio::test]
    async fn init_falls_back_to_body_and_defaults() {
        let hs = Handshake::new(
            SessionRegistry::new(),
            ConnectionContext::new(Some("http://default:8090"), None::<String>, None::<String>),
        );
        let meta = TransportMetadata::new();
        let params = json!({"network": "acme", "ledger": "main"});
        let req = IncomingRequest {
            session_id: None,
            method: "initialize",
            params: params.as_object(),
            metadata: &meta,
        };

        let est = hs.establish(&req).await.unwrap();
        assert_eq!(
            est.context,
            ConnectionContext::new(Some("http://default:8090"), Some("acme"), Some("main"))
        );
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let hs = handshake();
        let meta = full_headers();

        let err = hs.establish(&request(Some("xyz"), "tools/list", &meta)).await.unwrap_err();
        assert_eq!(err.code(), -32000);
        assert_eq!(hs.registry().len().await, 0);
    }

    #[tokio::test]
    async fn request_without_id_or_init_is_rejected() {
        let hs = handshake();
        let meta = full_headers();

        let err = hs.establish(&request(None, "tools/list", &meta)).await.unwrap_err();
        assert_eq!(err, SessionError::InvalidSession);
        assert!(hs.registry().is_empty().await);
    }

    #[tokio::test]
    async fn init_with_session_id_is_rejected() {
        let hs = handshake();
        let meta = full_headers();
        let est = hs.establish(&request(None, "initialize", &meta)).await.unwrap();

        let err = hs
            .establish(&request(Some(est.session_id.as_str()), "initialize", &meta))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyInitialized);
        assert_eq!(hs.registry().len().await, 1);
    }

    #[tokio::test]
    async fn continuation_refreshes_context() {
        let hs = handshake();
        let meta = TransportMetadata::new()
            .with_header("endpoint", "E1")
            .with_header("namespace", "N1")
            .with_header("dataset", "D1");
        let est = hs.establish(&request(None, "initialize", &meta)).await.unwrap();

        let update = TransportMetadata::new().with_header("namespace", "N2");
        let next = hs
            .establish(&request(Some(est.session_id.as_str()), "tools/call", &update))
            .await
            .unwrap();
        assert!(!next.created);
        assert_eq!(next.context, ConnectionContext::new(Some("E1"), Some("N2"), Some("D1")));

        let bare = TransportMetadata::new();
        let again = hs
            .establish(&request(Some(est.session_id.as_str()), "tools/list", &bare))
            .await
            .unwrap();
        assert_eq!(again.context, next.context);
    }

    #[tokio::test]
    async fn terminated_session_cannot_continue() {
        let hs = handshake();
        let meta = full_headers();
        let est = hs.establish(&request(None, "initialize", &meta)).await.unwrap();

        assert!(hs.terminate(Some(est.session_id.as_str())).await.unwrap());
        let err = hs
            .establish(&request(Some(est.session_id.as_str()), "tools/list", &meta))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32000);
    }

    #[tokio::test]
    async fn terminate_unknown_is_success_but_missing_id_is_not() {
        let hs = handshake();
        assert!(!hs.terminate(Some("never-issued")).await.unwrap());
        assert_eq!(hs.terminate(None).await, Err(SessionError::InvalidSession));
    }

    #[tokio::test]
    async fn require_session_checks_registry() {
        let hs = handshake();
        let meta = full_headers();
        let est = hs.establish(&request(None, "initialize", &meta)).await.unwrap();

        assert!(hs.require_session(Some(est.session_id.as_str())).await.is_ok());
        assert!(hs.require_session(Some("xyz")).await.is_err());
        assert!(hs.require_session(None).await.is_err());
    }
}
