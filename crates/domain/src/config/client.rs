use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub reset_policy: ResetPolicy,
}

/// What happens to the pending-call buffer after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Keep accumulated arguments until `reset()` is called. Later calls
    /// send every key set so far, which is easy to trip over.
    #[default]
    Retain,
    /// Clear the buffer once the transport has been invoked, whether or
    /// not the call succeeded.
    AfterDispatch,
}
