pub mod call;
pub mod config;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use otrs_domain::config::Config;

/// Default config file when neither `--config` nor `OTRS_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "otrs.toml";

/// otrs-dispatch: invoke any remote operation through `Dispatch`.
#[derive(Debug, Parser)]
#[command(name = "otrs-dispatch", version, about)]
pub struct Cli {
    /// Path to the config file (default: `$OTRS_CONFIG`, then `otrs.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Capture the SOAP request and response and print them to stderr.
    #[arg(long, global = true)]
    pub trace: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Call a remote operation and print the returned mapping.
    Call {
        /// Operation name; the first letter is uppercased (`ticketGet` → `TicketGet`).
        operation: String,
        /// Argument as KEY=VALUE. VALUE is read as JSON when it parses, else as a string.
        #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        args: Vec<(String, Value)>,
        /// Module override (e.g. "Ticket"); defaults to `connection.module`.
        #[arg(long)]
        module: Option<String>,
        /// Print the mapping as pretty JSON instead of `key = value` lines.
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Parse one `KEY=VALUE` argument.
///
/// Only the first `=` splits, so values may contain `=`. `VALUE` becomes
/// JSON when it parses (`42`, `true`, `[1,2]`, `"quoted"`), otherwise a
/// plain string.
pub fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

// ── Config loading helper ─────────────────────────────────────────────

/// Resolve the config path: the explicit flag, then `OTRS_CONFIG`, then
/// [`DEFAULT_CONFIG_PATH`].
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::var("OTRS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
    }
}

/// Load the configuration from `path`. A missing file yields the
/// defaults, so the client can run from `OTRS_API_*` alone.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    Config::load(path).map_err(|e| anyhow::anyhow!("loading {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_value_parses_json_or_string() {
        assert_eq!(parse_key_value("UserID=1").unwrap(), ("UserID".into(), json!(1)));
        assert_eq!(parse_key_value("Extended=true").unwrap(), ("Extended".into(), json!(true)));
        assert_eq!(
            parse_key_value("Title=Printer on fire").unwrap(),
            ("Title".into(), json!("Printer on fire"))
        );
        assert_eq!(
            parse_key_value("StateType=[\"open\",\"new\"]").unwrap(),
            ("StateType".into(), json!(["open", "new"]))
        );
        assert_eq!(parse_key_value("Body=a=b").unwrap(), ("Body".into(), json!("a=b")));
        assert_eq!(parse_key_value("Empty=").unwrap(), ("Empty".into(), json!("")));
    }

    #[test]
    fn key_value_rejects_malformed() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=1").is_err());
    }

    #[test]
    fn parses_call_with_args() {
        let cli = Cli::try_parse_from([
            "otrs-dispatch",
            "--trace",
            "call",
            "ticketGet",
            "-a",
            "TicketID=7",
            "--arg",
            "UserID=1",
            "--module",
            "Ticket",
        ])
        .unwrap();

        assert!(cli.trace);
        match cli.command {
            Command::Call {
                operation,
                args,
                module,
                json,
            } => {
                assert_eq!(operation, "ticketGet");
                assert_eq!(
                    args,
                    vec![("TicketID".into(), json!(7)), ("UserID".into(), json!(1))]
                );
                assert_eq!(module.as_deref(), Some("Ticket"));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "otrs-dispatch",
            "config",
            "show",
            "--config",
            "/etc/otrs.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/otrs.toml")));
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Show)));
    }

    #[test]
    fn explicit_config_path_wins() {
        assert_eq!(
            config_path(Some(Path::new("custom.toml"))),
            PathBuf::from("custom.toml")
        );
    }

    #[test]
    fn missing_config_file_means_defaults() {
        let config = load_config(Path::new("/nonexistent/otrs-dispatch/otrs.toml")).unwrap();
        assert!(config.connection.uri.is_none());
        assert_eq!(config.rpc.path, "rpc.pl");
    }
}
