//! Connection manager: owns the credentials and the lazily created
//! transport handle.
//!
//! The handle is built on first use and dropped whenever a credential
//! changes or the transport faults, so the next dispatch always connects
//! with the most recently set values.

use std::sync::Arc;

use otrs_domain::config::RpcSettings;
use otrs_domain::trace::TraceEvent;

use crate::client::DispatchError;
use crate::credentials::{CredentialField, Credentials};
use crate::settings;
use crate::transport::{ConnectionParams, Connector, RpcEncoding, RpcStyle, RpcTransport};

pub struct ConnectionManager {
    credentials: Credentials,
    /// Injected settings; `None` reads the process-wide values at connect time.
    settings: Option<RpcSettings>,
    connector: Arc<dyn Connector>,
    live: Option<Arc<dyn RpcTransport>>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            credentials: Credentials::default(),
            settings: None,
            connector,
            live: None,
        }
    }

    /// Pin this manager to `settings` instead of the process-wide values.
    pub fn with_settings(mut self, settings: RpcSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Settings the next connection will be built with.
    pub fn effective_settings(&self) -> RpcSettings {
        match &self.settings {
            Some(s) => s.clone(),
            None => settings::snapshot(),
        }
    }

    /// Store a credential and drop any live connection.
    pub fn set_credential(&mut self, field: CredentialField, value: impl Into<String>) {
        self.credentials.set(field, value.into());
        self.invalidate(&format!("{field} changed"));
    }

    /// Return to the disconnected state.
    pub fn invalidate(&mut self, reason: &str) {
        if self.live.take().is_some() {
            tracing::debug!(reason, "connection invalidated");
            TraceEvent::ConnectionInvalidated {
                reason: reason.to_owned(),
            }
            .emit();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.live.is_some()
    }

    /// Build connection parameters from the current credentials, failing
    /// with every missing field named.
    pub fn params(&self) -> Result<ConnectionParams, DispatchError> {
        let missing = self.credentials.missing();
        if !missing.is_empty() {
            return Err(DispatchError::Configuration { missing });
        }

        let settings = self.effective_settings();
        Ok(ConnectionParams {
            endpoint: format!("{}{}", self.credentials.location(), settings.path),
            namespace: self.credentials.uri().to_owned(),
            login: self.credentials.username().to_owned(),
            password: self.credentials.password().to_owned(),
            style: RpcStyle::Rpc,
            encoding: RpcEncoding::Encoded,
            trace: settings.trace,
        })
    }

    /// Return the live transport, connecting first if there is none.
    pub fn ensure_connection(&mut self) -> Result<Arc<dyn RpcTransport>, DispatchError> {
        if let Some(live) = &self.live {
            return Ok(Arc::clone(live));
        }

        let params = self.params()?;
        let transport = self.connector.connect(&params)?;

        tracing::debug!(
            endpoint = %params.endpoint,
            namespace = %params.namespace,
            trace = params.trace,
            "connection created"
        );
        TraceEvent::ConnectionOpened {
            endpoint: params.endpoint.clone(),
            namespace: params.namespace.clone(),
            trace: params.trace,
        }
        .emit();

        self.live = Some(Arc::clone(&transport));
        Ok(transport)
    }
}
