//! Process-wide RPC settings: the RPC path suffix and the trace switch.
//!
//! Clients built without an explicit [`RpcSettings`] read these values
//! every time they open a connection, so a change here affects every
//! connection created afterwards. Access is serialized by an `RwLock`.

use std::sync::OnceLock;

use otrs_domain::config::RpcSettings;
use parking_lot::RwLock;

static SETTINGS: OnceLock<RwLock<RpcSettings>> = OnceLock::new();

fn global() -> &'static RwLock<RpcSettings> {
    SETTINGS.get_or_init(|| RwLock::new(RpcSettings::default()))
}

/// Copy of the current process-wide settings.
pub fn snapshot() -> RpcSettings {
    global().read().clone()
}

/// Replace the process-wide settings wholesale.
pub fn install(settings: RpcSettings) {
    *global().write() = settings;
}

pub fn set_trace(enabled: bool) {
    global().write().trace = enabled;
}

pub fn trace_enabled() -> bool {
    global().read().trace
}

/// Change the path appended to every location (default `rpc.pl`).
pub fn set_rpc_path(path: impl Into<String>) {
    global().write().path = path.into();
}

pub fn rpc_path() -> String {
    global().read().path.clone()
}
