//! End-to-end runs of `run_scan` against mocked FOFA and Quake endpoints.

use base64::Engine;
use serde_json::json;
use space_hunter::utils::read_jsonl;
use space_hunter::{run_scan, ScanOutcome, ScannerConfig};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FOFA_PATH: &str = "/api/v1/search/all";
const QUAKE_PATH: &str = "/api/v3/search/quake_service";

fn write_targets(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    for line in lines {
        writeln!(file, "{}", line).expect("Failed to write target");
    }
    file.flush().expect("Failed to flush file");
    file
}

fn test_config(server: &MockServer, workers: usize) -> ScannerConfig {
    ScannerConfig {
        fofa_email: "user@example.com".to_string(),
        fofa_key: "fofa-key".to_string(),
        quake_api_key: "quake-token".to_string(),
        fofa_base_url: server.uri(),
        quake_base_url: server.uri(),
        max_workers: workers,
        api_delay: 0.0,
        retry_delay: 0.0,
        max_retries: 1,
        max_api_failures: 2,
        request_timeout: 5,
        ..ScannerConfig::default()
    }
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

async fn mount_empty_quake(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(QUAKE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": []})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn scan_exports_deduplicated_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FOFA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "results": [["10.0.0.1", "10.0.0.1", "", "80", "http", "Welcome", "nginx"]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(QUAKE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": [{"ip": "10.0.0.2", "port": 8443, "service": {"name": "http/ssl", "http": {"status_code": 200}}}]
        })))
        .mount(&server)
        .await;

    let input = write_targets(&["target", "10.0.0.0/30", "example.com(4)", "10.0.0.1", "???"]);
    let out = TempDir::new().unwrap();

    let report = run_scan(test_config(&server, 2), input.path(), out.path()).await.unwrap();

    assert_eq!(report.outcome, ScanOutcome::Exported);
    assert_eq!(report.raw_inputs, 4);
    assert_eq!(report.unique_targets, 3);
    assert_eq!(report.completed_tasks, 3);
    assert_eq!(report.failed_tasks, 0);
    assert_eq!(report.records_collected, 6);
    assert_eq!(report.records_unique, 2);
    assert_eq!(requests_to(&server, FOFA_PATH).await, 3);

    for name in ["results.csv", "results.jsonl", "summary.csv", "input_classification.csv", "scan_report.json"] {
        assert!(out.path().join(name).exists(), "{} missing", name);
    }

    let records = read_jsonl(&out.path().join("results.jsonl")).unwrap();
    assert_eq!(records.len(), 2);
    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert!(urls.contains(&"http://10.0.0.1"));
    assert!(urls.contains(&"http://10.0.0.2:8443"));

    let classification = std::fs::read_to_string(out.path().join("input_classification.csv")).unwrap();
    assert!(classification.contains("10.0.0.0/30,10.0.0.0/30,ip_range,2"));
    assert!(classification.contains("???,???,unrecognised,1"));

    let summary = std::fs::read_to_string(out.path().join("summary.csv")).unwrap();
    assert!(summary.contains("Overview,total_results,2"));
    assert!(summary.contains("By Source,fofa,1"));
    assert!(summary.contains("By Source,quake,1"));
}

fn fofa_ip_query(ip: &str) -> String {
    let query = format!("status_code=200 && ip=\"{}\"", ip);
    base64::engine::general_purpose::STANDARD.encode(query.as_bytes())
}

#[tokio::test]
async fn exports_share_presentation_order() {
    let server = MockServer::start().await;
    for ip in ["10.0.0.9", "10.0.0.1"] {
        Mock::given(method("GET"))
            .and(path(FOFA_PATH))
            .and(query_param("qbase64", fofa_ip_query(ip).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": false,
                "results": [[ip, ip, "", "80", "http", "", ""]]
            })))
            .mount(&server)
            .await;
    }
    mount_empty_quake(&server).await;

    let input = write_targets(&["10.0.0.9", "10.0.0.1"]);
    let out = TempDir::new().unwrap();

    let report = run_scan(test_config(&server, 1), input.path(), out.path()).await.unwrap();
    assert_eq!(report.outcome, ScanOutcome::Exported);

    let jsonl_ips: Vec<String> = read_jsonl(&out.path().join("results.jsonl"))
        .unwrap()
        .into_iter()
        .filter_map(|r| r.ip)
        .collect();
    assert_eq!(jsonl_ips, vec!["10.0.0.1", "10.0.0.9"]);

    let mut reader = csv::Reader::from_path(out.path().join("results.csv")).unwrap();
    let csv_ips: Vec<String> = reader.records().map(|row| row.unwrap()[3].to_string()).collect();
    assert_eq!(csv_ips, jsonl_ips);
}

#[tokio::test]
async fn failing_source_trips_circuit_and_run_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FOFA_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_empty_quake(&server).await;

    let input = write_targets(&["10.1.1.1", "10.1.1.2", "10.1.1.3", "10.1.1.4", "10.1.1.5"]);
    let out = TempDir::new().unwrap();

    let report = run_scan(test_config(&server, 1), input.path(), out.path()).await.unwrap();

    assert_eq!(report.outcome, ScanOutcome::NoResults);
    assert_eq!(report.completed_tasks, 5);
    assert_eq!(report.failed_tasks, 0);
    assert_eq!(report.targets_with_failures, 1);
    // two failed attempts on the first target open the circuit for the rest
    assert_eq!(requests_to(&server, FOFA_PATH).await, 2);
    assert_eq!(requests_to(&server, QUAKE_PATH).await, 5);

    let (_, fofa) = report.source_stats.iter().find(|(k, _)| k.as_str() == "fofa").unwrap();
    assert_eq!(fofa.attempts, 2);
    assert_eq!(fofa.circuit_skips, 4);

    assert!(out.path().join("input_classification.csv").exists());
    assert!(!out.path().join("results.csv").exists());
}

#[tokio::test]
async fn range_input_expands_to_one_query_per_host() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FOFA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": false, "results": []})))
        .mount(&server)
        .await;
    mount_empty_quake(&server).await;

    let input = write_targets(&["10.0.0.0/24"]);
    let out = TempDir::new().unwrap();

    let report = run_scan(test_config(&server, 16), input.path(), out.path()).await.unwrap();

    assert_eq!(report.unique_targets, 254);
    assert_eq!(report.completed_tasks, 254);
    assert_eq!(report.outcome, ScanOutcome::NoResults);
    assert_eq!(requests_to(&server, FOFA_PATH).await, 254);
    assert_eq!(requests_to(&server, QUAKE_PATH).await, 254);
}

#[tokio::test]
async fn unrecognised_input_exits_before_querying() {
    let server = MockServer::start().await;
    let input = write_targets(&["not a host", "http://300.1.1.1/"]);
    let out = TempDir::new().unwrap();

    let report = run_scan(test_config(&server, 2), input.path(), out.path()).await.unwrap();

    assert_eq!(report.outcome, ScanOutcome::NoTargets);
    assert_eq!(report.unique_targets, 0);
    assert_eq!(report.completed_tasks, 0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());

    let classification = std::fs::read_to_string(out.path().join("input_classification.csv")).unwrap();
    assert!(classification.contains("http://300.1.1.1/,http://300.1.1.1/,unrecognised,0"));
}

#[tokio::test]
async fn missing_input_file_is_terminal() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let missing = out.path().join("absent.csv");

    let err = run_scan(test_config(&server, 2), &missing, out.path()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to open input file"));
}

#[tokio::test]
async fn missing_credentials_are_rejected() {
    let server = MockServer::start().await;
    let mut config = test_config(&server, 2);
    config.quake_api_key.clear();
    let input = write_targets(&["10.0.0.1"]);
    let out = TempDir::new().unwrap();

    let err = run_scan(config, input.path(), out.path()).await.unwrap_err();
    assert!(err.to_string().contains("QUAKE_API_KEY"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
