//! `otrs-dispatch call`: one-shot remote operation.
//!
//! Builds a client from the config file plus `OTRS_API_*`, queues the
//! given arguments, dispatches once, and prints the returned mapping.

use serde_json::{Map, Value};

use otrs_client::{settings, OtrsClient};
use otrs_domain::config::Config;

pub struct CallArgs {
    pub operation: String,
    pub args: Vec<(String, Value)>,
    pub module: Option<String>,
    pub json: bool,
    pub trace: bool,
}

pub async fn run(mut config: Config, call: CallArgs) -> anyhow::Result<()> {
    if let Some(module) = call.module {
        config.connection.module = Some(module);
    }
    if call.trace {
        config.rpc.trace = true;
    }
    settings::install(config.rpc.clone());

    let mut client = OtrsClient::from_config(&config)?;
    let result = client.call(&call.operation, call.args).await;

    if call.trace {
        print_trace(&client);
    }

    let mapping = result?;
    if call.json {
        let json = serde_json::to_string_pretty(&mapping)
            .map_err(|e| anyhow::anyhow!("serializing reply: {e}"))?;
        println!("{json}");
    } else if mapping.is_empty() {
        eprintln!("(no data)");
    } else {
        for line in render_lines(&mapping) {
            println!("{line}");
        }
    }

    Ok(())
}

fn print_trace(client: &OtrsClient) {
    match client.last_request() {
        Some(request) => eprintln!("--- request ---\n{request}"),
        None => eprintln!("--- request ---\n(not sent)"),
    }
    if let Some(response) = client.last_response() {
        eprintln!("--- response ---\n{response}");
    }
}

/// `key = value` lines; strings print bare, everything else as JSON.
pub fn render_lines(mapping: &Map<String, Value>) -> Vec<String> {
    mapping
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key} = {s}"),
            other => format!("{key} = {other}"),
        })
        .collect()
}
