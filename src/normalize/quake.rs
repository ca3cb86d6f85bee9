use serde_json::{Map, Value};

use super::record::{cert_subject, parse_port, text, NormalizedRecord, RecordParts};
use crate::sources::SourceKind;
use crate::target::Target;

fn status_code(value: &Value) -> Option<u16> {
    let code = match value {
        Value::Number(n) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    code.filter(|c| *c != 0)
}

/// Map a Quake service object.
///
/// Every query already asks for `status_code=200`, so a declared status other
/// than 200 marks stale data and the item is dropped. An absent or unreadable
/// status is kept.
pub fn normalize_item(target: &Target, item: &Value, captured_at: &str) -> Option<NormalizedRecord> {
    let obj = item.as_object()?;
    let get = |key: &str| obj.get(key).and_then(text);

    let empty = Map::new();
    let service = obj.get("service").and_then(Value::as_object).unwrap_or(&empty);
    let http = service.get("http").and_then(Value::as_object).unwrap_or(&empty);
    let http_field = |key: &str| http.get(key).and_then(text);

    let status = http.get("status_code").and_then(status_code);
    if matches!(status, Some(code) if code != 200) {
        return None;
    }

    let ip = get("ip");
    let domain = get("domain");
    let port = obj.get("port").and_then(parse_port);
    let transport = get("transport").unwrap_or_else(|| "tcp".to_string());
    let service_name = service.get("name").and_then(text);

    let host = domain
        .clone()
        .or_else(|| http_field("host"))
        .or_else(|| ip.clone())?;

    let mut protocol = service_name.as_deref().unwrap_or("http").to_lowercase();
    if transport == "tcp" && protocol != "http" && protocol != "https" {
        protocol = if port == Some(443) { "https" } else { "http" }.to_string();
    }

    let parts = RecordParts {
        ip,
        domain,
        host,
        port,
        protocol,
        title: http_field("title"),
        server: http_field("server"),
        status_code: status.unwrap_or(200),
        banner: service_name,
        headers: http_field("response"),
        body: http_field("body").or_else(|| http_field("response")),
        cert_subject: service.get("cert").map(cert_subject).unwrap_or_default(),
    };

    NormalizedRecord::assemble(SourceKind::Quake, target, parts, captured_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetType;
    use serde_json::json;

    const NOW: &str = "2024-01-01 00:00:00";

    #[test]
    fn test_http_service_with_domain() {
        let target = Target::new("www.example.com", TargetType::Subdomain);
        let item = json!({
            "ip": "93.184.216.34",
            "port": 8080,
            "domain": "www.example.com",
            "transport": "tcp",
            "service": {
                "name": "http",
                "http": {"status_code": 200, "title": "Home", "server": "Apache", "body": "hello"},
                "cert": {"subject": {"CN": "www.example.com"}}
            }
        });
        let rec = normalize_item(&target, &item, NOW).unwrap();
        assert_eq!(rec.url, "http://www.example.com:8080");
        assert_eq!(rec.protocol, "http");
        assert!(!rec.has_https);
        assert_eq!(rec.root_domain.as_deref(), Some("example.com"));
        assert_eq!(rec.subdomain.as_deref(), Some("www"));
        assert_eq!(rec.body_length, 5);
        assert_eq!(rec.cert_subject, r#"{"CN":"www.example.com"}"#);
        assert_eq!(rec.banner.as_deref(), Some("http"));
        assert_eq!(rec.source, SourceKind::Quake);
    }

    #[test]
    fn test_non_200_status_dropped() {
        let target = Target::ip("10.0.0.1");
        let item = json!({"ip": "10.0.0.1", "port": 80, "service": {"name": "http", "http": {"status_code": 404}}});
        assert!(normalize_item(&target, &item, NOW).is_none());
    }

    #[test]
    fn test_absent_status_kept() {
        let target = Target::ip("10.0.0.1");
        let item = json!({"ip": "10.0.0.1", "port": 80, "service": {"name": "http", "http": {"status_code": "n/a"}}});
        let rec = normalize_item(&target, &item, NOW).unwrap();
        assert_eq!(rec.status_code, 200);
        assert_eq!(rec.url, "http://10.0.0.1");
    }

    #[test]
    fn test_protocol_inferred_from_port() {
        let target = Target::ip("10.0.0.2");
        let item = json!({"ip": "10.0.0.2", "port": 443, "service": {"name": "http/ssl", "http": {"host": "portal.example.org"}}});
        let rec = normalize_item(&target, &item, NOW).unwrap();
        assert_eq!(rec.protocol, "https");
        assert!(rec.has_https);
        assert_eq!(rec.url, "https://portal.example.org");
        assert_eq!(rec.domain, None);
        assert_eq!(rec.banner.as_deref(), Some("http/ssl"));

        let item = json!({"ip": "10.0.0.2", "port": 22, "service": {"name": "ssh"}});
        assert_eq!(normalize_item(&target, &item, NOW).unwrap().url, "http://10.0.0.2:22");
    }

    #[test]
    fn test_udp_service_keeps_name() {
        let target = Target::ip("10.0.0.3");
        let item = json!({"ip": "10.0.0.3", "port": 53, "transport": "udp", "service": {"name": "DNS"}});
        let rec = normalize_item(&target, &item, NOW).unwrap();
        assert_eq!(rec.protocol, "dns");
        assert_eq!(rec.url, "dns://10.0.0.3:53");
    }

    #[test]
    fn test_no_host_dropped() {
        let target = Target::ip("10.0.0.4");
        assert!(normalize_item(&target, &json!({"port": 80, "service": {"name": "http"}}), NOW).is_none());
        assert!(normalize_item(&target, &json!(["10.0.0.4"]), NOW).is_none());
    }

    #[test]
    fn test_response_used_for_length_when_body_missing() {
        let target = Target::ip("10.0.0.5");
        let item = json!({"ip": "10.0.0.5", "service": {"http": {"response": "HTTP/1.1 200 OK"}}});
        let rec = normalize_item(&target, &item, NOW).unwrap();
        assert_eq!(rec.body_length, 15);
        assert_eq!(rec.headers.as_deref(), Some("HTTP/1.1 200 OK"));
        assert_eq!(rec.protocol, "http");
    }
}
