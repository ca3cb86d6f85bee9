//! End-to-end scan: read, classify, query, deduplicate, export.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ScannerConfig;
use crate::engine::Scanner;
use crate::input::read_raw_targets;
use crate::output::{self, ScanOutcome, ScanReport};
use crate::target::{classify_all, dedup_targets, ClassificationRecord};
use crate::utils::ensure_dir;

/// Read `input`, scan every target and write the exports into `out_dir`.
pub async fn run_scan(config: ScannerConfig, input: &Path, out_dir: &Path) -> anyhow::Result<ScanReport> {
    let raw = read_raw_targets(input)?;
    run_with_inputs(config, raw, out_dir).await
}

/// Same as [`run_scan`] for values already in memory.
pub async fn run_with_inputs(config: ScannerConfig, raw: Vec<String>, out_dir: &Path) -> anyhow::Result<ScanReport> {
    config.validate()?;
    let started = Instant::now();
    let mut report = ScanReport::new(raw.len(), out_dir);

    ensure_dir(out_dir).with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let (targets, classification) = classify_all(&raw);
    persist_classification(out_dir, &classification);

    let targets = dedup_targets(targets);
    report.unique_targets = targets.len();
    tracing::info!(targets = targets.len(), "Identified {} unique targets", targets.len());

    if targets.is_empty() {
        tracing::warn!("No valid targets discovered. Nothing to do.");
        report.elapsed_seconds = started.elapsed().as_secs_f64();
        return Ok(report);
    }

    let scanner = Arc::new(Scanner::new(&config).context("Failed to build API clients")?);
    let results = scanner.scan(targets).await;

    report.completed_tasks = results.completed_tasks;
    report.failed_tasks = results.failed_tasks;
    report.targets_with_failures = results.targets_with_failures;
    report.records_collected = results.collected;
    report.records_unique = results.records.len();
    report.source_stats = results.source_stats;

    if results.records.is_empty() {
        tracing::warn!("No data returned from APIs.");
        report.outcome = ScanOutcome::NoResults;
        report.elapsed_seconds = started.elapsed().as_secs_f64();
        return Ok(report);
    }

    tracing::info!(unique = results.records.len(), "{} unique services discovered", results.records.len());

    let summary = output::summarize(&results.records);
    let mut ordered = results.records;
    output::sort_records(&mut ordered);
    output::write_results_csv(&out_dir.join(output::RESULTS_CSV), &ordered)
        .context("Failed to write results CSV")?;
    output::write_jsonl(&out_dir.join(output::RESULTS_JSONL), &ordered)
        .context("Failed to write results JSONL")?;
    output::write_summary_csv(&out_dir.join(output::SUMMARY_CSV), &summary)
        .context("Failed to write summary CSV")?;
    tracing::info!(dir = %out_dir.display(), "Results written to {}", out_dir.display());

    report.summary = Some(summary);
    report.outcome = ScanOutcome::Exported;
    report.elapsed_seconds = started.elapsed().as_secs_f64();

    let report_path = out_dir.join(output::REPORT_JSON);
    if let Err(e) = report.save_to_file(&report_path) {
        tracing::warn!(path = %report_path.display(), error = %e, "Failed to write scan report");
    }

    Ok(report)
}

/// Classify `input` and write only the classification report. No API is
/// contacted and no credentials are needed.
pub fn run_classification(input: &Path, out_dir: &Path) -> anyhow::Result<Vec<ClassificationRecord>> {
    let raw = read_raw_targets(input)?;
    ensure_dir(out_dir).with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    let (_, classification) = classify_all(&raw);
    output::write_classification_csv(&out_dir.join(output::CLASSIFICATION_CSV), &classification)
        .context("Failed to write classification report")?;
    Ok(classification)
}

fn persist_classification(out_dir: &Path, records: &[ClassificationRecord]) {
    if records.is_empty() {
        return;
    }
    let path = out_dir.join(output::CLASSIFICATION_CSV);
    match output::write_classification_csv(&path, records) {
        Ok(()) => tracing::info!(path = %path.display(), entries = records.len(), "Input classification saved"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to write input classification"),
    }
}
