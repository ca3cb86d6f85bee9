use ahash::AHashSet;

use crate::normalize::NormalizedRecord;

/// Drop repeated services. Two records are the same service when both `url`
/// and `ip` match; the first one seen wins and order is otherwise kept.
pub fn deduplicate(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let mut seen: AHashSet<(String, Option<String>)> = AHashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert((r.url.clone(), r.ip.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::fofa::normalize_item;
    use crate::target::Target;
    use serde_json::json;

    fn record(host: &str, ip: &str, port: u16, title: &str) -> NormalizedRecord {
        let target = Target::ip(ip);
        let item = json!([host, ip, "", port, "http", title]);
        normalize_item(&target, &item, "2024-01-01 00:00:00").unwrap()
    }

    #[test]
    fn test_first_occurrence_wins() {
        let records = vec![
            record("10.0.0.1", "10.0.0.1", 80, "first"),
            record("10.0.0.2", "10.0.0.2", 80, "other"),
            record("10.0.0.1", "10.0.0.1", 80, "second"),
        ];
        let unique = deduplicate(records);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title.as_deref(), Some("first"));
        assert_eq!(unique[1].ip.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_same_url_different_ip_kept() {
        let records = vec![
            record("cdn.example.com", "1.1.1.1", 443, "a"),
            record("cdn.example.com", "2.2.2.2", 443, "b"),
        ];
        assert_eq!(deduplicate(records).len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            record("10.0.0.1", "10.0.0.1", 80, "a"),
            record("10.0.0.1", "10.0.0.1", 80, "b"),
            record("10.0.0.1", "10.0.0.1", 8080, "c"),
        ];
        let once = deduplicate(records);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }
}
