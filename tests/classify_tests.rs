use space_hunter::scan::run_classification;
use space_hunter::target::{classify_all, Classification, TargetType};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn mixed_inputs_expand_and_classify() {
    let raw = [
        "192.168.1.1",
        "192.168.1.10-192.168.1.12",
        "192.168.2.5-7",
        "10.10.10.0/24",
        "010.1.2.0",
        "api.example.com",
        "example.org",
        "https://portal.example.net/login",
        "192.168.1.1",
    ];
    let (targets, records) = classify_all(&raw);

    let kinds: Vec<Classification> = records.iter().map(|r| r.classification).collect();
    assert_eq!(
        kinds,
        vec![
            Classification::Ip,
            Classification::IpRange,
            Classification::IpRange,
            Classification::IpRange,
            Classification::CSegment,
            Classification::Subdomain,
            Classification::Domain,
            Classification::Subdomain,
            Classification::Ip,
        ]
    );
    assert_eq!(records[1].expanded_count, 3);
    assert_eq!(records[2].expanded_count, 3);
    assert_eq!(records[3].expanded_count, 254);

    // 1 + 3 + 3 + 254 + 1 + 1 + 1 + 1 + 1, duplicates still present
    assert_eq!(targets.len(), 266);
    assert_eq!(targets.iter().filter(|t| t.target_type == TargetType::CSegment).count(), 1);
    assert!(targets.iter().any(|t| t.value == "portal.example.net"));
}

#[test]
fn classification_report_written_without_credentials() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "asset").unwrap();
    writeln!(input, "example.com(7)").unwrap();
    writeln!(input, "10.0.0.1-3").unwrap();
    writeln!(input, "no way").unwrap();
    input.flush().unwrap();
    let out = TempDir::new().unwrap();

    let records = run_classification(input.path(), out.path()).unwrap();
    assert_eq!(records.len(), 3);

    let text = std::fs::read_to_string(out.path().join("input_classification.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "original,processed,classification,expanded_count");
    assert_eq!(lines[1], "example.com,example.com,domain,1");
    assert_eq!(lines[2], "10.0.0.1-3,10.0.0.1-3,ip_range,3");
    assert_eq!(lines[3], "no way,no way,unrecognised,1");
}
