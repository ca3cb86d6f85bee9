pub mod report;
pub mod summary;
pub mod writer_csv;
pub mod writer_jsonl;

pub use report::{ScanOutcome, ScanReport};
pub use summary::{summarize, write_summary_csv, Summary};
pub use writer_csv::{sort_records, write_classification_csv, write_results_csv};
pub use writer_jsonl::write_jsonl;

pub const RESULTS_CSV: &str = "results.csv";
pub const RESULTS_JSONL: &str = "results.jsonl";
pub const SUMMARY_CSV: &str = "summary.csv";
pub const CLASSIFICATION_CSV: &str = "input_classification.csv";
pub const REPORT_JSON: &str = "scan_report.json";
