mod client;
mod connection;
mod rpc;

pub use client::*;
pub use connection::*;
pub use rpc::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Parse a config from TOML text. Missing sections take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Credentials are allowed to be absent here because the client seeds
    /// them from `OTRS_API_*` at construction; those gaps are warnings.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        match self.connection.location.as_deref() {
            None | Some("") => issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "connection.location".into(),
                message: format!("not set; {} must supply it", env_var_name("location")),
            }),
            Some(loc) if !loc.ends_with('/') => issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "connection.location".into(),
                message: format!(
                    "does not end with '/'; the endpoint will be \"{loc}{}\"",
                    self.rpc.path
                ),
            }),
            Some(_) => {}
        }

        if matches!(self.connection.uri.as_deref(), Some(uri) if uri.trim().is_empty()) {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "connection.uri".into(),
                message: "uri must not be empty".into(),
            });
        }

        if self.connection.username.as_deref().unwrap_or("").is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "connection.username".into(),
                message: format!("not set; {} must supply it", env_var_name("username")),
            });
        }

        if self.connection.password.key.is_some() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "connection.password.key".into(),
                message: "plaintext password in config (prefer 'env' or keychain)".into(),
            });
        }

        if self.connection.password.service.is_some() != self.connection.password.account.is_some()
        {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "connection.password".into(),
                message: "keychain lookup needs both 'service' and 'account'".into(),
            });
        }

        if self.rpc.path.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "rpc.path".into(),
                message: "path must not be empty".into(),
            });
        }

        issues
    }
}
