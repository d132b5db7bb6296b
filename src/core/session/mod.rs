//! Session and connection-context routing.
//!
//! - `context`: resolves which Fluree target a request runs against
//! - `registry`: concurrent map of live sessions
//! - `handshake`: new / continue / reject classification and termination
//! - `error`: session-level errors and their JSON-RPC codes

pub mod context;
mod error;
pub mod handshake;
pub mod registry;

pub use context::{
    BackendTarget, ConnectionContext, ContextField, Resolution, TransportMetadata, resolve,
};
pub use error::{MISSING_CONTEXT_CODE, SESSION_ERROR_CODE, SessionError};
pub use handshake::{Established, Handshake, IncomingRequest, is_initialize};
pub use registry::{SessionRegistry, SessionSnapshot, SessionState, SessionTransport};
