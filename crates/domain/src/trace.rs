use serde::Serialize;

/// Structured trace events emitted by the dispatch client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ConnectionOpened {
        endpoint: String,
        namespace: String,
        trace: bool,
    },
    ConnectionInvalidated {
        reason: String,
    },
    DispatchCompleted {
        module: String,
        operation: String,
        params: usize,
        reply_keys: usize,
        duration_ms: u64,
    },
    DispatchFailed {
        module: String,
        operation: String,
        error: String,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "otrs_event");
    }
}
