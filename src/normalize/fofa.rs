use serde_json::Value;

use super::record::{cert_subject, parse_port, text, NormalizedRecord, RecordParts};
use crate::sources::SourceKind;
use crate::target::Target;

/// Map a FOFA result tuple (`host,ip,domain,port,protocol,title,server,banner,
/// cert,header,body`). Short tuples are padded with absent values; tuples
/// under six fields or without host/protocol are dropped.
pub fn normalize_item(target: &Target, item: &Value, captured_at: &str) -> Option<NormalizedRecord> {
    let fields = item.as_array()?;
    if fields.len() < 6 {
        return None;
    }
    let field = |idx: usize| fields.get(idx).and_then(text);

    let port = fields.get(3).and_then(parse_port);
    let host = bare_host(&field(0)?, port);
    let protocol = field(4)?;

    let parts = RecordParts {
        ip: field(1),
        domain: field(2),
        host,
        port,
        protocol,
        title: field(5),
        server: field(6),
        status_code: 200,
        banner: field(7),
        headers: field(9),
        body: field(10),
        cert_subject: fields.get(8).map(cert_subject).unwrap_or_default(),
    };

    NormalizedRecord::assemble(SourceKind::Fofa, target, parts, captured_at)
}

/// FOFA reports non-default ports inside `host` (and a scheme for https),
/// e.g. `https://a.example.com:8443`. Strip both so the URL carries the port once.
fn bare_host(host: &str, port: Option<u16>) -> String {
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    let host = match port {
        Some(p) => host.strip_suffix(&format!(":{}", p)).unwrap_or(host),
        None => host,
    };
    host.trim_end_matches('/').to_string()
}
