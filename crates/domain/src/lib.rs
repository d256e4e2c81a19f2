//! `otrs-domain`: shared types for the otrs-dispatch workspace.
//!
//! Holds the workspace error type, the TOML/env configuration model, and
//! the structured trace events emitted by the client.

pub mod config;
pub mod error;
pub mod trace;
