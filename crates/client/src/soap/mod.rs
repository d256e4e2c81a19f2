//! SOAP-over-HTTP transport.
//!
//! Sends RPC/encoded SOAP 1.1 envelopes with `reqwest`, authenticating
//! every request with HTTP basic auth from the connection login. The
//! reply's values come back as a JSON array for the dispatch codec.

pub mod envelope;
pub mod reply;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

use crate::transport::{
    from_reqwest, ConnectionParams, Connector, RpcEncoding, RpcStyle, RpcTransport, TransportError,
};
use reply::Reply;

/// Longest response body quoted back in a [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 512;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Connector
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Creates a [`SoapTransport`] per connection.
#[derive(Debug, Clone, Default)]
pub struct SoapConnector {
    timeout: Option<Duration>,
}

impl SoapConnector {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Connector for SoapConnector {
    fn connect(&self, params: &ConnectionParams) -> Result<Arc<dyn RpcTransport>, TransportError> {
        Ok(Arc::new(SoapTransport::new(params.clone(), self.timeout)?))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One SOAP endpoint with a fixed login.
///
/// With `params.trace` set, the last request and response bodies are
/// kept for inspection.
pub struct SoapTransport {
    http: Client,
    params: ConnectionParams,
    last_request: Mutex<Option<String>>,
    last_response: Mutex<Option<String>>,
}

impl SoapTransport {
    pub fn new(params: ConnectionParams, timeout: Option<Duration>) -> Result<Self, TransportError> {
        if params.style != RpcStyle::Rpc || params.encoding != RpcEncoding::Encoded {
            return Err(TransportError::Envelope(format!(
                "unsupported message style {:?}/{:?}; only RPC/encoded is implemented",
                params.style, params.encoding
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(from_reqwest)?;

        Ok(Self {
            http,
            params,
            last_request: Mutex::new(None),
            last_response: Mutex::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.params.endpoint
    }
}

#[async_trait]
impl RpcTransport for SoapTransport {
    async fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        let body = envelope::encode_request(&self.params.namespace, procedure, &args)?;
        if self.params.trace {
            *self.last_request.lock() = Some(body.clone());
        }

        tracing::debug!(
            endpoint = %self.params.endpoint,
            procedure,
            args = args.len(),
            bytes = body.len(),
            "sending SOAP request"
        );

        let resp = self
            .http
            .post(&self.params.endpoint)
            .basic_auth(&self.params.login, Some(&self.params.password))
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}#{}\"", self.params.namespace, procedure))
            .body(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;
        if self.params.trace {
            *self.last_response.lock() = Some(text.clone());
        }

        tracing::debug!(status = status.as_u16(), bytes = text.len(), "SOAP response received");

        match reply::decode_response(&text) {
            Ok(Reply::Fault { code, message }) => Err(TransportError::Fault { code, message }),
            Ok(Reply::Values(values)) if status.is_success() => Ok(Value::Array(values)),
            Ok(Reply::Values(_)) => Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            }),
            Err(_) if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            }),
            Err(e) => Err(TransportError::Envelope(e)),
        }
    }

    fn last_request(&self) -> Option<String> {
        self.last_request.lock().clone()
    }

    fn last_response(&self) -> Option<String> {
        self.last_response.lock().clone()
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
