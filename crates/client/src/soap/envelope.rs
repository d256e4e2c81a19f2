//! SOAP 1.1 RPC/encoded request envelopes.

use serde_json::{Number, Value};

use crate::transport::TransportError;

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_ENC_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Namespace of the `Map` type used for JSON objects.
pub const MAP_NS: &str = "http://xml.apache.org/xml-soap";

/// Build the envelope for `procedure` in `namespace` with positional
/// arguments named `param0..paramN`.
pub fn encode_request(
    namespace: &str,
    procedure: &str,
    args: &[Value],
) -> Result<String, TransportError> {
    if !is_xml_name(procedure) {
        return Err(TransportError::Envelope(format!(
            "procedure name {procedure:?} is not a valid XML element name"
        )));
    }

    let mut out = String::with_capacity(512 + args.len() * 64);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str(&format!(
        concat!(
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="{env}" xmlns:ns1="{ns}" "#,
            r#"xmlns:xsd="{xsd}" xmlns:xsi="{xsi}" xmlns:SOAP-ENC="{enc}" "#,
            r#"xmlns:ns2="{map}" SOAP-ENV:encodingStyle="{enc}">"#
        ),
        env = SOAP_ENV_NS,
        ns = escape(namespace),
        xsd = XSD_NS,
        xsi = XSI_NS,
        enc = SOAP_ENC_NS,
        map = MAP_NS,
    ));
    out.push_str("<SOAP-ENV:Body>");
    out.push_str(&format!("<ns1:{procedure}>"));
    for (i, arg) in args.iter().enumerate() {
        write_value(&mut out, &format!("param{i}"), arg);
    }
    out.push_str(&format!("</ns1:{procedure}>"));
    out.push_str("</SOAP-ENV:Body></SOAP-ENV:Envelope>");
    Ok(out)
}

fn write_value(out: &mut String, tag: &str, value: &Value) {
    match value {
        Value::Null => out.push_str(&format!(r#"<{tag} xsi:nil="true"/>"#)),
        Value::Bool(b) => write_scalar(out, tag, "xsd:boolean", if *b { "true" } else { "false" }),
        Value::Number(n) => write_scalar(out, tag, number_type(n), &n.to_string()),
        Value::String(s) => write_scalar(out, tag, "xsd:string", &escape(s)),
        Value::Array(items) => {
            out.push_str(&format!(
                r#"<{tag} SOAP-ENC:arrayType="xsd:anyType[{}]" xsi:type="SOAP-ENC:Array">"#,
                items.len()
            ));
            for item in items {
                write_value(out, "item", item);
            }
            out.push_str(&format!("</{tag}>"));
        }
        Value::Object(map) => {
            out.push_str(&format!(r#"<{tag} xsi:type="ns2:Map">"#));
            for (key, item) in map {
                out.push_str("<item>");
                write_scalar(out, "key", "xsd:string", &escape(key));
                write_value(out, "value", item);
                out.push_str("</item>");
            }
            out.push_str(&format!("</{tag}>"));
        }
    }
}

fn write_scalar(out: &mut String, tag: &str, xsi_type: &str, text: &str) {
    out.push_str(&format!(r#"<{tag} xsi:type="{xsi_type}">{text}</{tag}>"#));
}

fn number_type(n: &Number) -> &'static str {
    match n.as_i64() {
        Some(i) if i32::try_from(i).is_ok() => "xsd:int",
        Some(_) => "xsd:long",
        None if n.is_u64() => "xsd:unsignedLong",
        None => "xsd:double",
    }
}

fn escape(raw: &str) -> String {
    quick_xml::escape::escape(raw).into_owned()
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
