//! Transport seam.
//!
//! The dispatch engine never talks to the network itself. A [`Connector`]
//! turns [`ConnectionParams`] into a live [`RpcTransport`], and the
//! transport carries one positional remote call at a time. The SOAP
//! implementation lives in [`crate::soap`]; tests plug in doubles.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// Trait for RPC transports bound to one endpoint and login.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `procedure` with positional `args` and return the raw reply.
    ///
    /// A reply is normally a JSON array (the flat sequence); `Null` or an
    /// empty array mean "no data".
    async fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value, TransportError>;

    /// Last request body sent, when tracing was enabled at connect time.
    fn last_request(&self) -> Option<String> {
        None
    }

    /// Last response body received, when tracing was enabled at connect time.
    fn last_response(&self) -> Option<String> {
        None
    }
}

/// Factory for [`RpcTransport`]s.
///
/// Called by the connection manager every time it needs a fresh
/// connection; no I/O is expected until the first `call`.
pub trait Connector: Send + Sync {
    fn connect(&self, params: &ConnectionParams) -> Result<Arc<dyn RpcTransport>, TransportError>;
}

/// RPC message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcStyle {
    Rpc,
    Document,
}

/// Parameter encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcEncoding {
    Encoded,
    Literal,
}

/// Everything a connector needs, snapshotted when the connection is made.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// `location + rpc path`.
    pub endpoint: String,
    /// RPC namespace (`uri`).
    pub namespace: String,
    pub login: String,
    pub password: String,
    pub style: RpcStyle,
    pub encoding: RpcEncoding,
    pub trace: bool,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("endpoint", &self.endpoint)
            .field("namespace", &self.namespace)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("style", &self.style)
            .field("encoding", &self.encoding)
            .field("trace", &self.trace)
            .finish()
    }
}

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("malformed envelope: {0}")]
    Envelope(String),
}

/// Convert a [`reqwest::Error`] into a [`TransportError`].
pub fn from_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Http(e.to_string())
    }
}
