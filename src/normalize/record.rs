use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sources::SourceKind;
use crate::target::{Target, TargetType};

/// One discovered service in the shape shared by every source.
///
/// `url` and `protocol` are never empty; items without a host are dropped
/// before a record is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub source: SourceKind,
    pub original_target: String,
    pub target_type: TargetType,
    pub ip: Option<String>,
    pub domain: Option<String>,
    pub root_domain: Option<String>,
    pub subdomain: Option<String>,
    pub port: Option<u16>,
    pub protocol: String,
    pub url: String,
    pub title: Option<String>,
    pub server: Option<String>,
    pub status_code: u16,
    pub banner: Option<String>,
    pub headers: Option<String>,
    pub body_length: usize,
    pub cert_subject: String,
    pub query_time: String,
    pub has_https: bool,
}

/// Source-independent parts of a record, filled in by each source mapper.
pub(crate) struct RecordParts {
    pub ip: Option<String>,
    pub domain: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub protocol: String,
    pub title: Option<String>,
    pub server: Option<String>,
    pub status_code: u16,
    pub banner: Option<String>,
    pub headers: Option<String>,
    pub body: Option<String>,
    pub cert_subject: String,
}

impl NormalizedRecord {
    pub(crate) fn assemble(source: SourceKind, target: &Target, parts: RecordParts, captured_at: &str) -> Option<Self> {
        if parts.host.is_empty() || parts.protocol.is_empty() {
            return None;
        }
        let (root_domain, subdomain) = split_domain(parts.domain.as_deref());
        let url = build_url(&parts.protocol, &parts.host, parts.port);
        let has_https = parts.protocol == "https";

        Some(Self {
            source,
            original_target: target.value.clone(),
            target_type: target.target_type,
            ip: parts.ip,
            domain: parts.domain,
            root_domain,
            subdomain,
            port: parts.port,
            protocol: parts.protocol,
            url,
            title: parts.title,
            server: parts.server,
            status_code: parts.status_code,
            banner: parts.banner,
            headers: parts.headers,
            body_length: parts.body.map(|b| b.chars().count()).unwrap_or(0),
            cert_subject: parts.cert_subject,
            query_time: captured_at.to_string(),
            has_https,
        })
    }
}

/// `protocol://host`, with `:port` unless the port is 80 or 443.
pub fn build_url(protocol: &str, host: &str, port: Option<u16>) -> String {
    match port {
        Some(p) if p != 80 && p != 443 => format!("{}://{}:{}", protocol, host, p),
        _ => format!("{}://{}", protocol, host),
    }
}

/// Split a host name into (root domain, leading labels).
pub fn split_domain(domain: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(domain) = domain.filter(|d| !d.is_empty()) else {
        return (None, None);
    };
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return (None, None);
    }
    let root = labels[labels.len() - 2..].join(".");
    if domain == root {
        return (Some(root), None);
    }
    let sub = domain[..domain.len() - root.len() - 1].to_string();
    (Some(root), Some(sub))
}

/// Capture instant shared by a whole normalization batch.
pub fn capture_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Non-empty textual value of a JSON scalar.
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Port number from a JSON number or numeric string. Zero counts as absent.
pub(crate) fn parse_port(value: &Value) -> Option<u16> {
    let port = match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    port.filter(|p| *p != 0)
}

/// Compact JSON of a certificate's `subject`. The certificate may arrive as
/// an object or as JSON text; anything unparseable gives an empty string.
pub(crate) fn cert_subject(raw: &Value) -> String {
    let parsed = match raw {
        Value::String(s) if s.trim().is_empty() => return String::new(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v) => v,
            Err(_) => return String::new(),
        },
        Value::Object(_) => raw.clone(),
        _ => return String::new(),
    };

    match parsed.as_object() {
        Some(obj) if !obj.is_empty() => {
            let empty = Value::Object(serde_json::Map::new());
            serde_json::to_string(obj.get("subject").unwrap_or(&empty)).unwrap_or_default()
        }
        _ => String::new(),
    }
}
