use std::path::Path;

use otrs_domain::config::{Config, ConfigSeverity};

/// Placeholder printed instead of a plaintext password.
const REDACTED: &str = "********";

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when at least one error was found.
pub fn validate(config: &Config, config_path: &Path) -> bool {
    let issues = config.validate();
    let path = config_path.display();

    if issues.is_empty() {
        println!("Config OK ({path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

fn render(config: &Config) -> anyhow::Result<String> {
    let mut config = config.clone();
    if config.connection.password.key.is_some() {
        config.connection.password.key = Some(REDACTED.to_owned());
    }
    toml::to_string_pretty(&config).map_err(|e| anyhow::anyhow!("serializing config: {e}"))
}
