//! SOAP response decoding.
//!
//! The response element's children are read in document order into a
//! flat list of values. `xsi:type` decides scalar typing; `SOAP-ENC:Array`
//! and repeated children decode to arrays, `Map` items and named
//! children to objects.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Values(Vec<Value>),
    Fault { code: String, message: String },
}

/// Decode a full response envelope.
pub fn decode_response(xml: &str) -> Result<Reply, String> {
    let doc = parse_document(xml)?;
    let envelope = doc.child("Envelope").ok_or("missing Envelope element")?;
    let body = envelope.child("Body").ok_or("missing Body element")?;

    if let Some(fault) = body.child("Fault") {
        return Ok(Reply::Fault {
            code: fault.child_text("faultcode"),
            message: fault.child_text("faultstring"),
        });
    }

    let values = match body.children.first() {
        Some(response) => response.children.iter().map(decode_value).collect(),
        None => Vec::new(),
    };
    Ok(Reply::Values(values))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Element tree
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Default)]
struct Node {
    /// Local name, prefix stripped.
    name: String,
    /// Attributes by local name.
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> String {
        self.child(name)
            .map(|c| c.text.trim().to_owned())
            .unwrap_or_default()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `xsi:type` without its prefix, e.g. `"string"` or `"Array"`.
    fn xsi_type(&self) -> &str {
        match self.attr("type") {
            Some(t) => t.rsplit(':').next().unwrap_or(t),
            None => "",
        }
    }
}

fn parse_document(xml: &str) -> Result<Node, String> {
    let mut reader = Reader::from_str(xml);
    // Synthetic root collects the document element.
    let mut stack: Vec<Node> = vec![Node::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(start_node(&e)?),
            Ok(Event::Empty(e)) => {
                let node = start_node(&e)?;
                top(&mut stack)?.children.push(node);
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err("unbalanced end tag".into());
                }
                let node = stack.pop().ok_or("unbalanced end tag")?;
                top(&mut stack)?.children.push(node);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                top(&mut stack)?.text.push_str(&text);
            }
            Ok(Event::CData(c)) => {
                let raw = c.into_inner();
                top(&mut stack)?.text.push_str(&String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                ))
            }
        }
    }

    if stack.len() != 1 {
        return Err("unexpected end of document".into());
    }
    stack.pop().ok_or_else(|| "empty document".into())
}

fn top(stack: &mut [Node]) -> Result<&mut Node, String> {
    stack.last_mut().ok_or_else(|| "element stack underflow".into())
}

fn start_node(e: &BytesStart<'_>) -> Result<Node, String> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attrs.push((key, value));
    }
    Ok(Node {
        name,
        attrs,
        ..Node::default()
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Value decoding
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn decode_value(node: &Node) -> Value {
    if matches!(node.attr("nil"), Some("true") | Some("1")) {
        return Value::Null;
    }

    let ty = node.xsi_type();

    if node.children.is_empty() {
        return match ty {
            "Array" => Value::Array(Vec::new()),
            "Map" | "Struct" => Value::Object(Map::new()),
            _ => decode_scalar(ty, &node.text),
        };
    }

    if ty == "Map" || node.children.iter().all(is_map_item) {
        let mut map = Map::new();
        for item in &node.children {
            let key = item.child("key").map(decode_value).unwrap_or(Value::Null);
            let key = match key {
                Value::String(s) => s,
                other => other.to_string(),
            };
            let value = item.child("value").map(decode_value).unwrap_or(Value::Null);
            map.insert(key, value);
        }
        return Value::Object(map);
    }

    // A lone `item` child is a one-element array, not a struct field.
    let lone_item = node.children.len() == 1 && node.children[0].name == "item";
    if ty == "Array" || lone_item || (node.children.len() > 1 && all_same_name(&node.children)) {
        return Value::Array(node.children.iter().map(decode_value).collect());
    }

    let mut map = Map::new();
    for child in &node.children {
        map.insert(child.name.clone(), decode_value(child));
    }
    Value::Object(map)
}

fn decode_scalar(ty: &str, text: &str) -> Value {
    match ty {
        "int" | "integer" | "long" | "short" | "byte" | "unsignedInt" | "unsignedLong"
        | "unsignedShort" | "nonNegativeInteger" | "positiveInteger" => {
            let trimmed = text.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Value::Number(i.into())
            } else if let Ok(u) = trimmed.parse::<u64>() {
                Value::Number(u.into())
            } else {
                Value::String(text.to_owned())
            }
        }
        "double" | "float" | "decimal" => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_owned())),
        "boolean" => match text.trim() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(text.to_owned()),
        },
        _ => Value::String(text.to_owned()),
    }
}

fn is_map_item(node: &Node) -> bool {
    node.name == "item" && node.child("key").is_some() && node.child("value").is_some()
}

fn all_same_name(nodes: &[Node]) -> bool {
    match nodes.first() {
        Some(first) => nodes.iter().all(|n| n.name == first.name),
        None => true,
    }
}
