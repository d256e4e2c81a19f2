//! Pending-call buffer: the named arguments queued for the next dispatch.

use serde_json::{Map, Value};

use crate::codec;

/// Ordered `name → value` arguments.
///
/// Entries survive a dispatch; only [`PendingCall::reset`] clears them.
/// Re-setting a key replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingCall {
    args: Map<String, Value>,
}

impl PendingCall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one argument.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.args.insert(key.into(), value.into());
    }

    /// Upsert every entry of `args`, in iteration order.
    pub fn merge<I, K, V>(&mut self, args: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in args {
            self.set(key, value);
        }
    }

    pub fn reset(&mut self) {
        self.args.clear();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.args
    }

    /// The flat `[k1, v1, k2, v2, ...]` wire form.
    pub fn to_params(&self) -> Vec<Value> {
        codec::flatten(&self.args)
    }
}
