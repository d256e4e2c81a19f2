//! `OtrsClient`: the dynamic dispatch facade.
//!
//! Any operation name can be invoked through [`OtrsClient::call`]. The
//! arguments are merged into the pending-call buffer, the buffer is
//! flattened behind `[username, password, module, Operation]`, and the
//! whole payload goes to the remote `Dispatch` procedure. The flat reply
//! comes back as an ordered map.
//!
//! A client is meant to be driven by one caller at a time: every
//! mutating method takes `&mut self`. Wrap it in a mutex to share it.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};

use otrs_domain::config::{Config, ResetPolicy, RpcSettings};
use otrs_domain::trace::TraceEvent;

use crate::builder::OtrsClientBuilder;
use crate::codec;
use crate::connection::ConnectionManager;
use crate::credentials::{CredentialField, Credentials};
use crate::pending::PendingCall;
use crate::transport::{RpcTransport, TransportError};

/// Name of the single remote procedure every operation goes through.
pub const DISPATCH_PROCEDURE: &str = "Dispatch";

/// Suffix appended to the module name to form the remote object name.
pub const MODULE_SUFFIX: &str = "Object";

pub struct OtrsClient {
    pub(crate) module: String,
    pub(crate) connection: ConnectionManager,
    pub(crate) pending: PendingCall,
    pub(crate) reset_policy: ResetPolicy,
    /// Transport used by the most recent dispatch, kept for trace access
    /// after the connection itself has been dropped.
    pub(crate) last_transport: Option<Arc<dyn RpcTransport>>,
}

impl OtrsClient {
    /// Client for `module` over SOAP, seeded from `OTRS_API_*`.
    pub fn new(module: &str) -> Self {
        OtrsClientBuilder::new().module(module).build()
    }

    pub fn builder() -> OtrsClientBuilder {
        OtrsClientBuilder::new()
    }

    /// Build a SOAP client from a loaded [`Config`].
    ///
    /// Environment seeding runs first; values present in the config are
    /// then applied on top, the same as calling the setters by hand. The
    /// config's `[rpc]` settings are pinned to this client; see
    /// [`OtrsClientBuilder::from_config`].
    pub fn from_config(config: &Config) -> otrs_domain::error::Result<Self> {
        Ok(OtrsClientBuilder::from_config(config)?.build())
    }

    // ── module ───────────────────────────────────────────────────────

    /// Remote object name, including the `Object` suffix.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// `"Ticket"` becomes `"TicketObject"`; an empty name clears the module.
    pub fn set_module(&mut self, module: &str) -> &mut Self {
        self.module = if module.is_empty() {
            String::new()
        } else {
            format!("{module}{MODULE_SUFFIX}")
        };
        self
    }

    // ── credentials ──────────────────────────────────────────────────

    pub fn set_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.connection.set_credential(CredentialField::Location, location);
        self
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.connection.set_credential(CredentialField::Uri, uri);
        self
    }

    pub fn set_username(&mut self, username: impl Into<String>) -> &mut Self {
        self.connection.set_credential(CredentialField::Username, username);
        self
    }

    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.connection.set_credential(CredentialField::Password, password);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        self.connection.credentials()
    }

    /// Seed credentials from the `OTRS_API_*` environment variables.
    pub fn seed_from_env(&mut self) -> &mut Self {
        self.seed_from_env_with(|name| std::env::var(name).ok())
    }

    /// Seed credentials through `lookup`, which maps a variable name such
    /// as `OTRS_API_LOCATION` to its value. Absent or empty values leave
    /// the field untouched.
    pub fn seed_from_env_with<F>(&mut self, lookup: F) -> &mut Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for field in CredentialField::ALL {
            if let Some(value) = lookup(&field.env_var()).filter(|v| !v.is_empty()) {
                tracing::debug!(field = %field, "credential seeded from environment");
                self.connection.set_credential(field, value);
            }
        }
        self
    }

    // ── connection ───────────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Settings the next connection will use.
    pub fn rpc_settings(&self) -> RpcSettings {
        self.connection.effective_settings()
    }

    /// Connect now instead of on the first dispatch.
    pub fn ensure_connection(&mut self) -> Result<(), DispatchError> {
        self.connection.ensure_connection().map(|_| ())
    }

    /// Last request body, when tracing was on for the last connection.
    pub fn last_request(&self) -> Option<String> {
        self.last_transport.as_ref().and_then(|t| t.last_request())
    }

    /// Last response body, when tracing was on for the last connection.
    pub fn last_response(&self) -> Option<String> {
        self.last_transport.as_ref().and_then(|t| t.last_response())
    }

    // ── pending-call buffer ──────────────────────────────────────────

    /// Queue an argument for the next dispatch.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.pending.set(key, value);
        self
    }

    /// Clear every queued argument.
    pub fn reset(&mut self) {
        self.pending.reset();
    }

    pub fn pending(&self) -> &PendingCall {
        &self.pending
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }

    // ── dispatch ─────────────────────────────────────────────────────

    /// Invoke the remote operation `operation` with `args` merged into the
    /// pending-call buffer. The first letter of `operation` is uppercased,
    /// so `create` dispatches `Create`.
    ///
    /// The buffer is not cleared afterwards unless the client was built
    /// with [`ResetPolicy::AfterDispatch`]; a second call sends everything
    /// the first one did plus any new keys.
    pub async fn call<I, K, V>(
        &mut self,
        operation: &str,
        args: I,
    ) -> Result<Map<String, Value>, DispatchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.pending.merge(args);
        let remote = remote_operation_name(operation);
        self.dispatch(&remote).await
    }

    /// [`call`](Self::call) with no extra arguments.
    pub async fn call_empty(&mut self, operation: &str) -> Result<Map<String, Value>, DispatchError> {
        self.call(operation, Map::new()).await
    }

    /// Send the pending-call buffer as `operation`, verbatim.
    pub async fn dispatch(&mut self, operation: &str) -> Result<Map<String, Value>, DispatchError> {
        let transport = self.connection.ensure_connection()?;
        self.last_transport = Some(Arc::clone(&transport));

        let creds = self.connection.credentials();
        let mut payload = Vec::with_capacity(4 + self.pending.len() * 2);
        payload.push(Value::String(creds.username().to_owned()));
        payload.push(Value::String(creds.password().to_owned()));
        payload.push(Value::String(self.module.clone()));
        payload.push(Value::String(operation.to_owned()));
        payload.extend(self.pending.to_params());
        let param_count = payload.len();

        tracing::debug!(
            module = %self.module,
            operation,
            params = param_count,
            "dispatching"
        );

        let start = Instant::now();
        let result = transport.call(DISPATCH_PROCEDURE, payload).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        if self.reset_policy == ResetPolicy::AfterDispatch {
            self.pending.reset();
        }

        match result {
            Ok(reply) => {
                let mapped = codec::unflatten(&reply);
                if mapped.is_empty() && !is_empty_reply(&reply) {
                    tracing::debug!(
                        operation,
                        "reply is not an even-length sequence, treating as no data"
                    );
                }
                TraceEvent::DispatchCompleted {
                    module: self.module.clone(),
                    operation: operation.to_owned(),
                    params: param_count,
                    reply_keys: mapped.len(),
                    duration_ms,
                }
                .emit();
                Ok(mapped)
            }
            Err(e) => {
                tracing::warn!(
                    module = %self.module,
                    operation,
                    error = %e,
                    "dispatch failed"
                );
                self.connection.invalidate("transport fault");
                TraceEvent::DispatchFailed {
                    module: self.module.clone(),
                    operation: operation.to_owned(),
                    error: e.to_string(),
                    duration_ms,
                }
                .emit();
                Err(DispatchError::Transport(e))
            }
        }
    }
}

/// Uppercase the first character: `"ticketGet"` → `"TicketGet"`.
pub fn remote_operation_name(operation: &str) -> String {
    let mut chars = operation.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_empty_reply(reply: &Value) -> bool {
    match reply {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Errors returned by a dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("required {} missing", format_missing(.missing))]
    Configuration { missing: Vec<CredentialField> },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

fn format_missing(missing: &[CredentialField]) -> String {
    missing
        .iter()
        .map(|f| format!("`{f}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<DispatchError> for otrs_domain::error::Error {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Configuration { .. } => otrs_domain::error::Error::Config(e.to_string()),
            DispatchError::Transport(_) => otrs_domain::error::Error::Dispatch(e.to_string()),
        }
    }
}
