use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::SourceStatsSnapshot;
use crate::output::summary::Summary;
use crate::sources::SourceKind;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    Exported,
    /// Nothing in the input classified as a target
    NoTargets,
    /// Targets were queried but no record survived normalization
    NoResults,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub raw_inputs: usize,
    pub unique_targets: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub targets_with_failures: usize,
    pub records_collected: usize,
    pub records_unique: usize,
    pub elapsed_seconds: f64,
    pub outcome: ScanOutcome,
    pub output_dir: PathBuf,
    pub source_stats: Vec<(SourceKind, SourceStatsSnapshot)>,
    pub summary: Option<Summary>,
}

impl ScanReport {
    pub fn new(raw_inputs: usize, output_dir: &Path) -> Self {
        Self {
            raw_inputs,
            unique_targets: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            targets_with_failures: 0,
            records_collected: 0,
            records_unique: 0,
            elapsed_seconds: 0.0,
            outcome: ScanOutcome::NoTargets,
            output_dir: output_dir.to_path_buf(),
            source_stats: Vec::new(),
            summary: None,
        }
    }

    /// Short console summary of the run.
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("              SCAN COMPLETE");
        println!("{}", "=".repeat(60));

        println!("\n[*] Summary:");
        println!("   Inputs: {}", self.raw_inputs);
        println!("   Unique targets: {}", self.unique_targets);
        println!("   Duration: {:.1}s", self.elapsed_seconds);

        match self.outcome {
            ScanOutcome::NoTargets => {
                println!("\n[!] No valid targets discovered");
                println!();
                return;
            }
            ScanOutcome::NoResults => println!("\n[!] No data returned from APIs"),
            ScanOutcome::Exported => {}
        }

        println!("\n[*] Results:");
        println!("   Collected: {}", self.records_collected);
        println!("   Unique services: {}", self.records_unique);
        if self.failed_tasks > 0 || self.targets_with_failures > 0 {
            println!(
                "   [!] Failed targets: {} crashed, {} with exhausted retries",
                self.failed_tasks, self.targets_with_failures
            );
        }

        if let Some(ref summary) = self.summary {
            println!("   Unique IPs: {}", summary.unique_ips);
            println!("   Unique domains: {}", summary.unique_domains);
            if !summary.by_source.is_empty() {
                println!("\n[*] By source:");
                for (source, count) in &summary.by_source {
                    println!("   {}: {}", source, count);
                }
            }
        }

        if !self.source_stats.is_empty() {
            println!("\n[*] API usage:");
            for (kind, stats) in &self.source_stats {
                println!(
                    "   {}: {} requests, {} failed, {} cached, {} skipped",
                    kind.label(),
                    stats.attempts,
                    stats.failures,
                    stats.cache_hits,
                    stats.circuit_skips
                );
            }
        }

        if self.outcome == ScanOutcome::Exported {
            println!("\n[=] Detailed results saved to: {}", self.output_dir.display());
        }
        println!();
    }

    /// Pretty JSON copy of the report.
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}
