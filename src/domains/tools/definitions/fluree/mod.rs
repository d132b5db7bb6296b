//! Fluree database tools.
//!
//! Each tool forwards one request to the Fluree HTTP API of the session's
//! target:
//! - `query`: FlureeQL select over a collection
//! - `transact`: create test collections
//! - `network_status`: raft/network state of the server
//! - `block`: a single block
//! - `history`: history of a subject
//! - `multi_query`: several named queries in one round-trip
//! - `new_keys`: generate a key pair and auth id
//! - `block_range`: block stats and transactions for a range

pub mod block;
pub mod block_range;
pub mod client;
pub mod history;
pub mod multi_query;
pub mod network_status;
pub mod new_keys;
pub mod query;
pub mod transact;

pub use block::{FlureeBlockParams, FlureeBlockTool};
pub use block_range::{FlureeBlockRangeParams, FlureeBlockRangeTool};
pub use client::{DownstreamError, DownstreamResult, FlureeClient};
pub use history::{FlureeHistoryParams, FlureeHistoryTool};
pub use multi_query::{FlureeMultiQueryParams, FlureeMultiQueryTool};
pub use network_status::FlureeNetworkStatusTool;
pub use new_keys::{FlureeNewKeysParams, FlureeNewKeysTool};
pub use query::{FlureeQueryParams, FlureeQueryTool};
pub use transact::{FlureeTransactParams, FlureeTransactTool};

use rmcp::model::CallToolResult;

use super::common::{error_result, structured_result};

/// Turn a downstream outcome into a tool result.
///
/// Failures stay inside the result (`is_error: true`) so the protocol call
/// itself still succeeds.
pub fn downstream_result(label: &str, outcome: DownstreamResult) -> CallToolResult {
    match outcome {
        Ok(data) => structured_result(label, data),
        Err(e) => error_result(&format!("{label} failed: {e}")),
    }
}
