//! Flat parameter codec.
//!
//! The remote `Dispatch` procedure takes and returns interleaved
//! `[k1, v1, k2, v2, ...]` sequences. [`flatten`] packs an ordered map
//! into that shape and [`unflatten`] reads it back. Anything that is not
//! a well-formed even-length sequence decodes to an empty map.

use serde_json::{Map, Value};

/// Emit `key, value` for every entry, in insertion order.
pub fn flatten(map: &Map<String, Value>) -> Vec<Value> {
    let mut out = Vec::with_capacity(map.len() * 2);
    for (key, value) in map {
        out.push(Value::String(key.clone()));
        out.push(value.clone());
    }
    out
}

/// Rebuild a map from a raw reply.
///
/// Arrays are read pairwise. Objects are read by their values in
/// returned order; their own keys are ignored. Every other shape, and
/// any odd-length sequence, yields an empty map.
pub fn unflatten(reply: &Value) -> Map<String, Value> {
    match reply {
        Value::Array(items) => unflatten_slice(items),
        Value::Object(envelope) => {
            let items: Vec<Value> = envelope.values().cloned().collect();
            unflatten_slice(&items)
        }
        _ => Map::new(),
    }
}

/// Read `(key, value)` pairs from a flat sequence. A repeated key keeps
/// the later value.
pub fn unflatten_slice(items: &[Value]) -> Map<String, Value> {
    if items.is_empty() || items.len() % 2 != 0 {
        return Map::new();
    }

    let mut map = Map::new();
    for pair in items.chunks_exact(2) {
        let Some(key) = key_of(&pair[0]) else {
            return Map::new();
        };
        map.insert(key, pair[1].clone());
    }
    map
}

/// Strings are used as-is and numbers stringified; nothing else can be a key.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
