use clap::Parser;
use tracing_subscriber::EnvFilter;

use otrs_cli::cli::call::CallArgs;
use otrs_cli::cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config_path = otrs_cli::cli::config_path(cli.config.as_deref());
    let config = otrs_cli::cli::load_config(&config_path)?;

    match cli.command {
        Command::Call {
            operation,
            args,
            module,
            json,
        } => {
            let call = CallArgs {
                operation,
                args,
                module,
                json,
                trace: cli.trace,
            };
            otrs_cli::cli::call::run(config, call).await
        }
        Command::Config(ConfigCommand::Validate) => {
            let valid = otrs_cli::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => otrs_cli::cli::config::show(&config),
    }
}

/// Logs go to stderr so stdout carries only the reply.
fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
