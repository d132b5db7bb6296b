//! Session registry.
//!
//! The single piece of shared mutable state in the server: a map from
//! session id to [`Session`], guarded by an async `RwLock`. Every operation
//! takes the lock for a short, non-suspending critical section and hands out
//! cloned snapshots, so no caller ever holds the lock across a downstream
//! call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};
use uuid::Uuid;

use super::context::ConnectionContext;

const TRANSPORT_CAPACITY: usize = 64;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Initializing,
    Active,
    Closed,
}

/// Server-to-client channel owned by exactly one session.
///
/// Messages published here are delivered to the client's `GET` stream.
/// Dropping the transport ends every subscribed stream.
#[derive(Debug)]
pub struct SessionTransport {
    tx: broadcast::Sender<Value>,
}

impl SessionTransport {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(TRANSPORT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.tx.subscribe()
    }

    /// Send a message to every open stream; returns how many received it.
    pub fn send(&self, message: Value) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}

impl Default for SessionTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered session. Owned by the registry.
#[derive(Debug)]
struct Session {
    id: String,
    transport: SessionTransport,
    context: ConnectionContext,
    state: SessionState,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            context: self.context.clone(),
            state: self.state,
            created_at: self.created_at,
            last_seen: self.last_seen,
        }
    }
}

/// Point-in-time copy of a session's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub context: ConnectionContext,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Concurrent registry of live sessions.
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session in the `Initializing` state.
    ///
    /// The id is a random UUID v4; id generation and insertion happen under
    /// one write lock, so an id is never handed out twice.
    pub async fn create(&self, transport: SessionTransport) -> SessionSnapshot {
        let mut sessions = self.sessions.write().await;
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let now = Utc::now();
        let session = Session {
            id: id.clone(),
            transport,
            context: ConnectionContext::default(),
            state: SessionState::Initializing,
            created_at: now,
            last_seen: now,
        };
        let snapshot = session.snapshot();
        sessions.insert(id, session);
        debug!(session_id = %snapshot.id, "Session created");
        snapshot
    }

    /// Move an initializing session to `Active` with its resolved context.
    ///
    /// Returns `None` if the session is unknown or no longer initializing.
    pub async fn activate(&self, id: &str, context: ConnectionContext) -> Option<SessionSnapshot> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        if session.state != SessionState::Initializing {
            return None;
        }
        session.context = context;
        session.state = SessionState::Active;
        session.last_seen = Utc::now();
        info!(session_id = %id, "Session active");
        Some(session.snapshot())
    }

    pub async fn get(&self, id: &str) -> Option<SessionSnapshot> {
        self.sessions.read().await.get(id).map(Session::snapshot)
    }

    /// Merge the non-empty fields of `update` into the session's context.
    ///
    /// Returns the merged context, or `None` (and does nothing) if the
    /// session does not exist.
    pub async fn update_context(
        &self,
        id: &str,
        update: &ConnectionContext,
    ) -> Option<ConnectionContext> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        session.context.merge(update);
        session.last_seen = Utc::now();
        Some(session.context.clone())
    }

    /// Close a session: mark it closed, remove it and release its transport.
    ///
    /// Closing an unknown or already closed id is a no-op. Returns whether a
    /// session was actually removed.
    pub async fn close(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(mut session) => {
                session.state = SessionState::Closed;
                info!(
                    session_id = %session.id,
                    state = ?session.state,
                    "Session closed after {}s",
                    (Utc::now() - session.created_at).num_seconds()
                );
                drop(session);
                true
            }
            None => false,
        }
    }

    /// Close every session. Returns how many were closed.
    pub async fn shutdown(&self) -> usize {
        let drained: Vec<Session> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, session)| session).collect()
        };
        let count = drained.len();
        drop(drained);
        if count > 0 {
            info!("Closed {} session(s) on shutdown", count);
        }
        count
    }

    /// Subscribe to a session's server-to-client messages.
    pub async fn subscribe(&self, id: &str) -> Option<broadcast::Receiver<Value>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.transport.subscribe())
    }

    /// Publish a message on a session's transport.
    ///
    /// Returns the number of open streams that received it, or `None` for an
    /// unknown session.
    pub async fn publish(&self, id: &str, message: Value) -> Option<usize> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.transport.send(message))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ctx(e: &str, n: &str, d: &str) -> ConnectionContext {
        ConnectionContext::new(Some(e), Some(n), Some(d))
    }

    #[tokio::test]
    async fn concurrent_creates_yield_unique_ids() {
        let registry = SessionRegistry::new();
        let handles: Vec<_> = (0..200)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.create(SessionTransport::new()).await.id })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(registry.len().await, 200);
    }

    #[tokio::test]
    async fn create_starts_initializing_then_activates() {
        let registry = SessionRegistry::new();
        let session = registry.create(SessionTransport::new()).await;
        assert_eq!(session.state, SessionState::Initializing);
        assert!(Uuid::parse_str(&session.id).is_ok());

        let active = registry.activate(&session.id, ctx("E", "N", "D")).await.unwrap();
        assert_eq!(active.state, SessionState::Active);
        assert_eq!(active.context, ctx("E", "N", "D"));

        // A second activation is refused.
        assert!(registry.activate(&session.id, ctx("X", "Y", "Z")).await.is_none());
        assert_eq!(registry.get(&session.id).await.unwrap().context, ctx("E", "N", "D"));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let registry = SessionRegistry::new();
        let keep = registry.create(SessionTransport::new()).await;
        let gone = registry.create(SessionTransport::new()).await;

        assert!(registry.close(&gone.id).await);
        assert!(!registry.close(&gone.id).await);
        assert!(!registry.close("never-issued").await);

        assert_eq!(registry.len().await, 1);
        assert!(registry.get(&gone.id).await.is_none());
        assert!(registry.get(&keep.id).await.is_some());
    }

    #[tokio::test]
    async fn close_releases_transport() {
        let registry = SessionRegistry::new();
        let session = registry.create(SessionTransport::new()).await;
        let mut rx = registry.subscribe(&session.id).await.unwrap();

        assert_eq!(registry.publish(&session.id, serde_json::json!({"n": 1})).await, Some(1));
        assert_eq!(rx.recv().await.unwrap(), serde_json::json!({"n": 1}));

        registry.close(&session.id).await;
        assert!(matches!(rx.recv().await, Err(broadcast::error::RecvError::Closed)));
        assert_eq!(registry.publish(&session.id, Value::Null).await, None);
    }

    #[tokio::test]
    async fn update_context_is_non_destructive() {
        let registry = SessionRegistry::new();
        let session = registry.create(SessionTransport::new()).await;
        registry.activate(&session.id, ctx("E1", "N1", "D1")).await;

        let update = ConnectionContext::new(None::<String>, Some("N2"), Some(""));
        let merged = registry.update_context(&session.id, &update).await.unwrap();
        assert_eq!(merged, ctx("E1", "N2", "D1"));

        let merged = registry
            .update_context(&session.id, &ConnectionContext::default())
            .await
            .unwrap();
        assert_eq!(merged, ctx("E1", "N2", "D1"));
    }

    #[tokio::test]
    async fn update_context_on_unknown_session_is_noop() {
        let registry = SessionRegistry::new();
        assert!(registry.update_context("xyz", &ctx("E", "N", "D")).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn shutdown_closes_everything() {
        let registry = SessionRegistry::new();
        for _ in 0..3 {
            registry.create(SessionTransport::new()).await;
        }
        assert_eq!(registry.shutdown().await, 3);
        assert!(registry.is_empty().await);
        assert_eq!(registry.shutdown().await, 0);
    }
}
