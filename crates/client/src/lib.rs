//! `otrs-client`: dynamic dispatch client for `Dispatch`-style RPC servers.
//!
//! This crate provides:
//! - [`OtrsClient`], which turns any operation name plus key/value
//!   arguments into one positional `Dispatch` call and maps the flat reply
//!   back into key/value form.
//! - The flat parameter [`codec`] and the pending-call buffer.
//! - A lazily created, credential-bound connection that is dropped on any
//!   credential change or transport fault.
//! - A SOAP 1.1 RPC/encoded transport over HTTP ([`soap`]), plus the
//!   [`Connector`]/[`RpcTransport`] seam for plugging in others.
//! - Process-wide RPC path and trace switches ([`settings`]).
//!
//! # Usage
//!
//! ```rust,no_run
//! use otrs_client::OtrsClient;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), otrs_client::DispatchError> {
//! // Credentials come from OTRS_API_* unless set explicitly.
//! let mut client = OtrsClient::new("Ticket");
//! client
//!     .set_location("https://helpdesk.example.com/otrs/")
//!     .set_username("agent")
//!     .set_password("secret");
//!
//! let created = client
//!     .call("ticketCreate", [("Title", json!("Printer on fire")), ("UserID", json!(1))])
//!     .await?;
//! println!("ticket {}", created["TicketID"]);
//!
//! // Arguments accumulate until reset.
//! client.reset();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod codec;
pub mod connection;
pub mod credentials;
pub mod pending;
pub mod settings;
pub mod soap;
pub mod transport;

// Re-exports for convenience.
pub use builder::OtrsClientBuilder;
pub use client::{remote_operation_name, DispatchError, OtrsClient, DISPATCH_PROCEDURE};
pub use credentials::{CredentialField, Credentials};
pub use pending::PendingCall;
pub use soap::{SoapConnector, SoapTransport};
pub use transport::{ConnectionParams, Connector, RpcEncoding, RpcStyle, RpcTransport, TransportError};
