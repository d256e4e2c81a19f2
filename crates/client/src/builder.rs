//! Builder pattern for constructing an [`OtrsClient`].

use std::sync::Arc;
use std::time::Duration;

use otrs_domain::config::{resolve_password, Config, ResetPolicy, RpcSettings};

use crate::client::OtrsClient;
use crate::connection::ConnectionManager;
use crate::credentials::CredentialField;
use crate::pending::PendingCall;
use crate::soap::SoapConnector;
use crate::transport::Connector;

/// Fluent builder for [`OtrsClient`].
///
/// # Example
///
/// ```rust,no_run
/// # use otrs_client::OtrsClient;
/// let client = OtrsClient::builder()
///     .module("Ticket")
///     .location("https://helpdesk.example.com/otrs/")
///     .username("agent")
///     .password("secret")
///     .build();
/// assert_eq!(client.module(), "TicketObject");
/// ```
/// Maps a variable name such as `OTRS_API_LOCATION` to its value.
type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct OtrsClientBuilder {
    module: String,
    connector: Option<Arc<dyn Connector>>,
    settings: Option<RpcSettings>,
    reset_policy: ResetPolicy,
    seed_env: bool,
    env_lookup: Option<EnvLookup>,
    timeout: Option<Duration>,
    credentials: Vec<(CredentialField, String)>,
}

impl OtrsClientBuilder {
    pub fn new() -> Self {
        Self {
            module: String::new(),
            connector: None,
            settings: None,
            reset_policy: ResetPolicy::Retain,
            seed_env: true,
            env_lookup: None,
            timeout: Some(Duration::from_secs(30)),
            credentials: Vec::new(),
        }
    }

    /// Remote module name without the `Object` suffix.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    // ── Credentials ──────────────────────────────────────────────────

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.credentials.push((CredentialField::Location, location.into()));
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.credentials.push((CredentialField::Uri, uri.into()));
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.credentials.push((CredentialField::Username, username.into()));
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials.push((CredentialField::Password, password.into()));
        self
    }

    /// Read `OTRS_API_*` at build time (default `true`).
    pub fn seed_from_env(mut self, enabled: bool) -> Self {
        self.seed_env = enabled;
        self
    }

    /// Seed through `lookup` instead of the process environment.
    pub fn env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env_lookup = Some(Box::new(lookup));
        self
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Use a custom transport factory instead of SOAP.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Pin RPC path and trace flag instead of reading the process-wide values.
    pub fn settings(mut self, settings: RpcSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    /// HTTP timeout for the default SOAP connector, in milliseconds.
    /// `0` disables it.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        self
    }

    /// Build the [`OtrsClient`].
    ///
    /// Environment seeding runs before the explicitly supplied
    /// credentials, so explicit values win.
    pub fn build(self) -> OtrsClient {
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(SoapConnector::new(self.timeout)));

        let mut connection = ConnectionManager::new(connector);
        if let Some(settings) = self.settings {
            connection = connection.with_settings(settings);
        }

        let mut client = OtrsClient {
            module: String::new(),
            connection,
            pending: PendingCall::new(),
            reset_policy: self.reset_policy,
            last_transport: None,
        };
        client.set_module(&self.module);

        if self.seed_env {
            match self.env_lookup {
                Some(lookup) => client.seed_from_env_with(lookup),
                None => client.seed_from_env(),
            };
        }
        for (field, value) in self.credentials {
            client.connection.set_credential(field, value);
        }

        client
    }
}

impl OtrsClientBuilder {
    /// Builder preloaded from a [`Config`].
    ///
    /// Only values the file actually sets become explicit credentials, so
    /// anything it leaves out is still seeded from `OTRS_API_*` at build
    /// time. `config.rpc` is pinned to the client: later changes to the
    /// process-wide [`settings`](crate::settings) do not reach it.
    pub fn from_config(config: &Config) -> otrs_domain::error::Result<Self> {
        let conn = &config.connection;
        let mut builder = Self::new()
            .module(conn.module.as_deref().unwrap_or(""))
            .settings(config.rpc.clone())
            .reset_policy(config.client.reset_policy)
            .timeout_ms(conn.timeout_ms);

        if let Some(location) = non_empty(&conn.location) {
            builder = builder.location(location);
        }
        if let Some(uri) = non_empty(&conn.uri) {
            builder = builder.uri(uri);
        }
        if let Some(username) = non_empty(&conn.username) {
            builder = builder.username(username);
        }
        if let Some(password) = resolve_password(&conn.password)? {
            builder = builder.password(password);
        }

        Ok(builder)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Default for OtrsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_timeout_reaches_builder() {
        let config = Config::from_toml_str("[connection]\ntimeout_ms = 1500\n").unwrap();
        let builder = OtrsClientBuilder::from_config(&config).unwrap();
        assert_eq!(builder.timeout, Some(Duration::from_millis(1500)));

        let config = Config::from_toml_str("[connection]\ntimeout_ms = 0\n").unwrap();
        let builder = OtrsClientBuilder::from_config(&config).unwrap();
        assert_eq!(builder.timeout, None);
    }

    #[test]
    fn unset_fields_are_not_explicit() {
        let builder = OtrsClientBuilder::from_config(&Config::default()).unwrap();
        assert!(builder.credentials.is_empty());
        assert_eq!(builder.module, "");
        assert_eq!(builder.settings, Some(RpcSettings::default()));
    }
}
