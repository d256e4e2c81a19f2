use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix of the environment variables that seed client credentials.
pub const ENV_PREFIX: &str = "OTRS_API_";

/// Namespace used when none is configured.
pub const DEFAULT_URI: &str = "Core";

/// Build the seeding variable name for a credential field,
/// e.g. `"location"` → `"OTRS_API_LOCATION"`.
pub fn env_var_name(field: &str) -> String {
    format!("{ENV_PREFIX}{}", field.to_uppercase())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the server; the RPC path is appended verbatim.
    #[serde(default)]
    pub location: Option<String>,
    /// RPC namespace. Unset leaves the client's own value in place
    /// (`OTRS_API_URI`, else [`DEFAULT_URI`]).
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: PasswordSource,
    /// Remote object name without the `Object` suffix (e.g. `"Ticket"`).
    #[serde(default)]
    pub module: Option<String>,
    /// HTTP timeout for the SOAP transport. `0` disables it.
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            location: None,
            uri: None,
            username: None,
            password: PasswordSource::default(),
            module: None,
            timeout_ms: 30_000,
        }
    }
}

/// Where to find the password. Every field is optional; see
/// [`resolve_password`] for precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PasswordSource {
    /// Plaintext password (discouraged).
    #[serde(default)]
    pub key: Option<String>,
    /// Env var containing the password.
    #[serde(default)]
    pub env: Option<String>,
    /// Keychain service name.
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name.
    #[serde(default)]
    pub account: Option<String>,
}

/// Resolve the password from a [`PasswordSource`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `service` + `account` → OS keychain via `keyring`
/// 3. `env` field
///
/// Returns `Ok(None)` when nothing is configured, leaving the client to
/// its `OTRS_API_PASSWORD` seed.
pub fn resolve_password(src: &PasswordSource) -> Result<Option<String>> {
    if let Some(ref key) = src.key {
        tracing::warn!(
            "password loaded from plaintext config field 'key'; \
             prefer 'env' or keychain instead"
        );
        return Ok(Some(key.clone()));
    }

    if let (Some(ref service), Some(ref account)) = (&src.service, &src.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) => return Ok(Some(secret)),
            Err(e) => {
                tracing::warn!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = src.env {
        return std::env::var(env_var).map(Some).map_err(|_| {
            Error::Auth(format!(
                "environment variable '{env_var}' not set or not valid UTF-8"
            ))
        });
    }

    Ok(None)
}

/// Read a secret from the OS keychain.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}

// ── serde default helpers ───────────────────────────────────────────

fn d_30000() -> u64 {
    30_000
}
