//! Integration tests for the dispatch engine against a scripted transport.
//!
//! The transport double records every payload it is handed and answers
//! from a queue of canned replies, so each test can assert exactly what
//! went over the wire and how the reply was mapped back.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use otrs_client::{
    settings, ConnectionParams, Connector, CredentialField, DispatchError, OtrsClient,
    OtrsClientBuilder, RpcTransport, TransportError,
};
use otrs_domain::config::{Config, ResetPolicy, RpcSettings};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

// ── Scripted transport ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SentCall {
    procedure: String,
    args: Vec<Value>,
}

#[derive(Default)]
struct Script {
    sent: Mutex<Vec<SentCall>>,
    replies: Mutex<VecDeque<Result<Value, TransportError>>>,
    connects: AtomicUsize,
    params: Mutex<Vec<ConnectionParams>>,
}

impl Script {
    fn reply(&self, reply: Result<Value, TransportError>) {
        self.replies.lock().push_back(reply);
    }

    fn sent(&self) -> Vec<SentCall> {
        self.sent.lock().clone()
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

struct ScriptedTransport(Arc<Script>);

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        self.0.sent.lock().push(SentCall {
            procedure: procedure.to_owned(),
            args,
        });
        self.0.replies.lock().pop_front().unwrap_or(Ok(Value::Null))
    }
}

struct ScriptedConnector(Arc<Script>);

impl Connector for ScriptedConnector {
    fn connect(&self, params: &ConnectionParams) -> Result<Arc<dyn RpcTransport>, TransportError> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        self.0.params.lock().push(params.clone());
        Ok(Arc::new(ScriptedTransport(Arc::clone(&self.0))))
    }
}

fn client_with(script: &Arc<Script>, module: &str) -> OtrsClient {
    OtrsClient::builder()
        .module(module)
        .connector(Arc::new(ScriptedConnector(Arc::clone(script))))
        .settings(RpcSettings::default())
        .seed_from_env(false)
        .location("https://helpdesk.example.com/otrs/")
        .username("user")
        .password("pass")
        .build()
}

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| json!(v)).collect()
}

// ── End-to-end ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_ticket_round_trip() {
    let script = Arc::new(Script::default());
    script.reply(Ok(json!(["Title", "Test", "TicketID", "42"])));
    let mut client = client_with(&script, "Ticket");

    let result = client.call("create", [("Title", "Test")]).await.unwrap();

    let sent = script.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].procedure, "Dispatch");
    assert_eq!(
        sent[0].args,
        strings(&["user", "pass", "TicketObject", "Create", "Title", "Test"])
    );

    let mut expected = Map::new();
    expected.insert("Title".into(), json!("Test"));
    expected.insert("TicketID".into(), json!("42"));
    assert_eq!(result, expected);
}

#[tokio::test]
async fn connection_params_use_rpc_conventions() {
    let script = Arc::new(Script::default());
    let mut client = client_with(&script, "Ticket");
    client.call_empty("ticketSearch").await.unwrap();

    let params = script.params.lock().clone();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].endpoint, "https://helpdesk.example.com/otrs/rpc.pl");
    assert_eq!(params[0].namespace, "Core");
    assert_eq!(params[0].login, "user");
    assert_eq!(params[0].password, "pass");
}

// ── Pending-call buffer ────────────────────────────────────────────────

#[tokio::test]
async fn buffer_persists_across_calls_until_reset() {
    let script = Arc::new(Script::default());
    let mut client = client_with(&script, "Ticket");

    client.set("a", 1);
    client.call_empty("Foo").await.unwrap();
    client.set("b", "two");
    client.call_empty("Bar").await.unwrap();
    client.reset();
    client.call_empty("Baz").await.unwrap();

    let sent = script.sent();
    assert_eq!(&sent[0].args[3..], &[json!("Foo"), json!("a"), json!(1)]);
    assert_eq!(
        &sent[1].args[3..],
        &[json!("Bar"), json!("a"), json!(1), json!("b"), json!("two")]
    );
    assert_eq!(&sent[2].args[3..], &[json!("Baz")]);
}

#[tokio::test]
async fn call_args_upsert_into_buffer() {
    let script = Arc::new(Script::default());
    let mut client = client_with(&script, "Ticket");

    client.set("UserID", 1).set("TicketID", 10);
    client
        .call("ticketGet", [("TicketID", json!(11)), ("Extended", json!(true))])
        .await
        .unwrap();

    let sent = script.sent();
    assert_eq!(
        &sent[0].args[3..],
        &[
            json!("TicketGet"),
            json!("UserID"),
            json!(1),
            json!("TicketID"),
            json!(11),
            json!("Extended"),
            json!(true)
        ]
    );
    assert_eq!(client.pending().len(), 3);
}

#[tokio::test]
async fn after_dispatch_policy_clears_buffer() {
    let script = Arc::new(Script::default());
    let mut client = OtrsClient::builder()
        .module("Ticket")
        .connector(Arc::new(ScriptedConnector(Arc::clone(&script))))
        .settings(RpcSettings::default())
        .reset_policy(ResetPolicy::AfterDispatch)
        .seed_from_env(false)
        .location("https://helpdesk.example.com/otrs/")
        .username("user")
        .password("pass")
        .build();

    client.call("Foo", [("a", 1)]).await.unwrap();
    assert!(client.pending().is_empty());
    client.call_empty("Bar").await.unwrap();

    let sent = script.sent();
    assert_eq!(sent[1].args.len(), 4);
}

// ── Connection lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn connection_is_reused_between_calls() {
    let script = Arc::new(Script::default());
    let mut client = client_with(&script, "Ticket");

    client.call_empty("One").await.unwrap();
    client.call_empty("Two").await.unwrap();

    assert_eq!(script.connects(), 1);
    assert!(client.is_connected());
}

#[tokio::test]
async fn every_credential_setter_forces_reconnect() {
    let script = Arc::new(Script::default());
    let mut client = client_with(&script, "Ticket");
    client.call_empty("Warmup").await.unwrap();
    assert_eq!(script.connects(), 1);

    client.set_location("https://other.example.com/otrs/");
    assert!(!client.is_connected());
    client.call_empty("AfterLocation").await.unwrap();
    assert_eq!(script.connects(), 2);

    client.set_username("user2");
    client.call_empty("AfterUsername").await.unwrap();
    assert_eq!(script.connects(), 3);

    client.set_password("pass2");
    client.call_empty("AfterPassword").await.unwrap();
    assert_eq!(script.connects(), 4);

    client.set_uri("Custom");
    client.call_empty("AfterUri").await.unwrap();
    assert_eq!(script.connects(), 5);

    let last = script.params.lock().last().cloned().unwrap();
    assert_eq!(last.endpoint, "https://other.example.com/otrs/rpc.pl");
    assert_eq!(last.namespace, "Custom");
    assert_eq!(last.login, "user2");
    assert_eq!(last.password, "pass2");

    let sent = script.sent();
    assert_eq!(sent.last().unwrap().args[0], json!("user2"));
    assert_eq!(sent.last().unwrap().args[1], json!("pass2"));
}

#[tokio::test]
async fn missing_credential_fails_before_transport() {
    let script = Arc::new(Script::default());
    let mut client = OtrsClient::builder()
        .module("Ticket")
        .connector(Arc::new(ScriptedConnector(Arc::clone(&script))))
        .settings(RpcSettings::default())
        .seed_from_env(false)
        .location("https://helpdesk.example.com/otrs/")
        .username("user")
        .build();

    let err = client.call("create", [("Title", "Test")]).await.unwrap_err();
    assert!(err.to_string().contains("`password`"));
    match err {
        DispatchError::Configuration { missing } => {
            assert_eq!(missing, vec![CredentialField::Password]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(script.connects(), 0);
    assert!(script.sent().is_empty());
    assert_eq!(client.pending().len(), 1, "arguments survive a failed dispatch");
}

#[tokio::test]
async fn transport_fault_resets_connection() {
    let script = Arc::new(Script::default());
    script.reply(Err(TransportError::Fault {
        code: "Server".into(),
        message: "boom".into(),
    }));
    script.reply(Ok(json!(["ok", "1"])));
    let mut client = client_with(&script, "Ticket");

    let err = client.call_empty("Fails").await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Transport(TransportError::Fault { .. })
    ));
    assert!(!client.is_connected());

    let ok = client.call_empty("Works").await.unwrap();
    assert_eq!(ok.get("ok"), Some(&json!("1")));
    assert_eq!(script.connects(), 2);
}

// ── Reply shapes ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_and_malformed_replies_map_to_empty() {
    let script = Arc::new(Script::default());
    script.reply(Ok(Value::Null));
    script.reply(Ok(json!([])));
    script.reply(Ok(json!(["dangling"])));
    script.reply(Ok(json!("scalar")));
    let mut client = client_with(&script, "Ticket");

    for op in ["a", "b", "c", "d"] {
        let result = client.call_empty(op).await.unwrap();
        assert!(result.is_empty(), "reply for {op} should be empty");
    }
}

#[tokio::test]
async fn empty_module_is_sent_as_empty_string() {
    let script = Arc::new(Script::default());
    let mut client = client_with(&script, "");
    assert_eq!(client.module(), "");

    client.call_empty("ping").await.unwrap();
    assert_eq!(script.sent()[0].args[2], json!(""));
    assert_eq!(script.sent()[0].args[3], json!("Ping"));
}

// ── Environment seeding ────────────────────────────────────────────────

#[tokio::test]
async fn env_seeding_then_explicit_override() {
    let script = Arc::new(Script::default());
    let mut client = OtrsClient::builder()
        .module("Queue")
        .connector(Arc::new(ScriptedConnector(Arc::clone(&script))))
        .settings(RpcSettings::default())
        .seed_from_env(false)
        .build();

    client.seed_from_env_with(|name| match name {
        "OTRS_API_LOCATION" => Some("https://env.example.com/otrs/".into()),
        "OTRS_API_URI" => Some(String::new()),
        "OTRS_API_USERNAME" => Some("env-user".into()),
        "OTRS_API_PASSWORD" => Some("env-pass".into()),
        _ => None,
    });
    assert_eq!(client.credentials().uri(), "Core", "empty env value is ignored");
    assert_eq!(client.credentials().username(), "env-user");

    client.set_username("explicit");
    client.call_empty("queueList").await.unwrap();

    let params = script.params.lock().clone();
    assert_eq!(params[0].endpoint, "https://env.example.com/otrs/rpc.pl");
    assert_eq!(params[0].login, "explicit");
    assert_eq!(script.sent()[0].args[2], json!("QueueObject"));
}

// ── Process-wide settings ──────────────────────────────────────────────

// The only test in this file that touches the global settings; every other
// client here pins its own.
#[tokio::test]
async fn unpinned_client_follows_process_settings() {
    let original = settings::snapshot();
    let script = Arc::new(Script::default());
    let mut client = OtrsClient::builder()
        .module("Ticket")
        .connector(Arc::new(ScriptedConnector(Arc::clone(&script))))
        .seed_from_env(false)
        .location("https://helpdesk.example.com/otrs/")
        .username("user")
        .password("pass")
        .build();

    settings::set_rpc_path("x.pl");
    settings::set_trace(true);
    let first = client.call_empty("One").await;

    // Only new connections see a change.
    settings::set_rpc_path("y.pl");
    let second = client.call_empty("Two").await;
    client.set_password("pass2");
    let third = client.call_empty("Three").await;

    settings::install(original);

    first.unwrap();
    second.unwrap();
    third.unwrap();
    let params = script.params.lock().clone();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].endpoint, "https://helpdesk.example.com/otrs/x.pl");
    assert!(params[0].trace);
    assert_eq!(params[1].endpoint, "https://helpdesk.example.com/otrs/y.pl");
}

// ── Config-built clients ───────────────────────────────────────────────

fn config_client<F>(script: &Arc<Script>, toml: &str, env: F) -> OtrsClient
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    let config = Config::from_toml_str(toml).unwrap();
    OtrsClientBuilder::from_config(&config)
        .unwrap()
        .connector(Arc::new(ScriptedConnector(Arc::clone(script))))
        .env_lookup(env)
        .build()
}

#[tokio::test]
async fn config_file_drives_module_password_and_policy() {
    let script = Arc::new(Script::default());
    let mut client = config_client(
        &script,
        r#"
        [connection]
        location = "https://helpdesk.example.com/otrs/"
        username = "agent"
        module = "Ticket"

        [connection.password]
        key = "from-file"

        [rpc]
        path = "custom.pl"

        [client]
        reset_policy = "after_dispatch"
        "#,
        |_| None,
    );

    assert_eq!(client.module(), "TicketObject");
    assert_eq!(client.reset_policy(), ResetPolicy::AfterDispatch);
    client.call("ticketGet", [("TicketID", 7)]).await.unwrap();

    let params = script.params.lock().clone();
    assert_eq!(params[0].endpoint, "https://helpdesk.example.com/otrs/custom.pl");
    assert_eq!(params[0].namespace, "Core");
    assert_eq!(
        &script.sent()[0].args[..4],
        &strings(&["agent", "from-file", "TicketObject", "TicketGet"])[..]
    );
    assert!(client.pending().is_empty());
}

#[tokio::test]
async fn env_fills_what_the_config_leaves_out() {
    let script = Arc::new(Script::default());
    let mut client = config_client(
        &script,
        r#"
        [connection]
        username = "agent"
        "#,
        |name| match name {
            "OTRS_API_LOCATION" => Some("https://env.example.com/otrs/".into()),
            "OTRS_API_URI" => Some("CustomNs".into()),
            "OTRS_API_USERNAME" => Some("env-user".into()),
            "OTRS_API_PASSWORD" => Some("env-pass".into()),
            _ => None,
        },
    );

    assert_eq!(client.credentials().uri(), "CustomNs");
    assert_eq!(client.credentials().username(), "agent", "file beats env");
    client.call_empty("ping").await.unwrap();

    let params = script.params.lock().clone();
    assert_eq!(params[0].endpoint, "https://env.example.com/otrs/rpc.pl");
    assert_eq!(params[0].namespace, "CustomNs");
    assert_eq!(params[0].password, "env-pass");
}

#[tokio::test]
async fn config_uri_overrides_env_uri() {
    let script = Arc::new(Script::default());
    let client = config_client(
        &script,
        r#"
        [connection]
        uri = "FileNs"
        "#,
        |name| (name == "OTRS_API_URI").then(|| "CustomNs".to_owned()),
    );
    assert_eq!(client.credentials().uri(), "FileNs");
}

#[tokio::test]
async fn config_rpc_settings_are_pinned() {
    let script = Arc::new(Script::default());
    let client = config_client(
        &script,
        r#"
        [rpc]
        path = "pinned.pl"
        trace = true
        "#,
        |_| None,
    );
    assert_eq!(
        client.rpc_settings(),
        RpcSettings {
            path: "pinned.pl".into(),
            trace: true,
        }
    );
}
