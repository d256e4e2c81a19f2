use serde::{Deserialize, Serialize};

/// RPC path appended to the location when none is configured.
pub const DEFAULT_RPC_PATH: &str = "rpc.pl";

/// Settings shared by every connection a process creates: the RPC path
/// suffix and the trace switch.
///
/// The client crate keeps one process-wide instance behind a lock; a
/// client may also be handed its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSettings {
    #[serde(default = "d_rpc_path")]
    pub path: String,
    /// Capture the last request/response on each connection.
    #[serde(default)]
    pub trace: bool,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            path: d_rpc_path(),
            trace: false,
        }
    }
}

fn d_rpc_path() -> String {
    DEFAULT_RPC_PATH.into()
}
