//! Fan-out of targets across the worker pool.
//!
//! Each worker takes one target, queries every configured source through
//! that source's [`SourceGuard`], normalizes what comes back and appends the
//! batch to a shared sink. A failure on one target or source never stops the
//! rest of the run.

pub mod dedup;
pub mod guard;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::concurrent::WorkerPool;
use crate::config::ScannerConfig;
use crate::normalize::{capture_timestamp, NormalizedRecord};
use crate::sources::{FofaSource, QuakeSource, SearchSource, SourceKind};
use crate::target::Target;
use crate::throttle::RateLimiter;

pub use dedup::deduplicate;
pub use guard::{QueryOutcome, QueryStatus, RetryPolicy, SourceGuard, SourceStatsSnapshot};

struct SourcePipeline {
    source: Arc<dyn SearchSource>,
    guard: SourceGuard,
}

/// Per-target tally returned by a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetOutcome {
    pub records: usize,
    pub failed_queries: usize,
}

#[derive(Debug, Clone)]
pub struct ScanResults {
    /// Deduplicated records in first-seen order
    pub records: Vec<NormalizedRecord>,
    /// Records gathered before deduplication
    pub collected: usize,
    pub completed_tasks: usize,
    /// Targets whose worker panicked
    pub failed_tasks: usize,
    /// Targets where at least one source exhausted its retries
    pub targets_with_failures: usize,
    pub source_stats: Vec<(SourceKind, SourceStatsSnapshot)>,
}

pub struct Scanner {
    pipelines: Vec<SourcePipeline>,
    results: Mutex<Vec<NormalizedRecord>>,
    workers: usize,
}

impl Scanner {
    /// Scanner over FOFA and Quake, both built from `config`.
    pub fn new(config: &ScannerConfig) -> reqwest::Result<Self> {
        let sources: Vec<Arc<dyn SearchSource>> = vec![
            Arc::new(FofaSource::new(config)?),
            Arc::new(QuakeSource::new(config)?),
        ];
        Ok(Self::with_sources(config, sources))
    }

    /// Scanner over an arbitrary set of sources. Each source gets its own
    /// rate limiter, failure counter and query cache.
    pub fn with_sources(config: &ScannerConfig, sources: Vec<Arc<dyn SearchSource>>) -> Self {
        let policy = RetryPolicy::from_config(config);
        let pipelines = sources
            .into_iter()
            .map(|source| {
                let guard = SourceGuard::new(source.kind(), policy, RateLimiter::new(config.api_delay()));
                SourcePipeline { source, guard }
            })
            .collect();

        Self {
            pipelines,
            results: Mutex::new(Vec::new()),
            workers: config.max_workers.max(1),
        }
    }

    pub fn source_stats(&self) -> Vec<(SourceKind, SourceStatsSnapshot)> {
        self.pipelines.iter().map(|p| (p.guard.kind(), p.guard.stats())).collect()
    }

    /// Query every target on the bounded pool and return deduplicated results.
    pub async fn scan(self: Arc<Self>, targets: Vec<Target>) -> ScanResults {
        let total = targets.len();
        tracing::info!(targets = total, workers = self.workers, "Starting scan of {} targets", total);

        let pool = WorkerPool::new(self.workers);
        let scanner = self.clone();
        let outcomes = pool
            .execute(targets, move |target| {
                let scanner = scanner.clone();
                async move { scanner.query_target(&target).await }
            })
            .await;
        let (completed_tasks, failed_tasks) = pool.get_stats();

        let targets_with_failures = outcomes
            .iter()
            .flatten()
            .filter(|o| o.failed_queries > 0)
            .count();

        let collected = std::mem::take(&mut *self.results.lock());
        let collected_count = collected.len();
        let records = deduplicate(collected);

        let source_stats = self.source_stats();
        for (kind, stats) in &source_stats {
            tracing::info!(
                source = %kind,
                attempts = stats.attempts,
                failures = stats.failures,
                cache_hits = stats.cache_hits,
                circuit_skips = stats.circuit_skips,
                exhausted = stats.exhausted,
                "{} source statistics",
                kind.label()
            );
        }
        tracing::info!(
            completed = completed_tasks,
            failed = failed_tasks,
            collected = collected_count,
            unique = records.len(),
            "Scan finished"
        );

        ScanResults {
            records,
            collected: collected_count,
            completed_tasks,
            failed_tasks,
            targets_with_failures,
            source_stats,
        }
    }

    /// Query all sources for one target and push its records into the sink.
    pub async fn query_target(&self, target: &Target) -> TargetOutcome {
        let mut outcomes = Vec::with_capacity(self.pipelines.len());
        for pipeline in &self.pipelines {
            let Some(query) = pipeline.source.build_query(target) else {
                tracing::error!(source = %pipeline.source.kind(), target = %target, "could not build query");
                continue;
            };
            tracing::debug!(source = %pipeline.source.kind(), target = %target, query = %query, "querying");
            let outcome = pipeline.guard.run(pipeline.source.as_ref(), &query).await;
            outcomes.push((pipeline, outcome));
        }

        let captured_at = capture_timestamp();
        let mut batch = Vec::new();
        let mut failed_queries = 0;

        for (pipeline, outcome) in &outcomes {
            if outcome.is_failure() {
                failed_queries += 1;
            }
            let before = batch.len();
            batch.extend(
                outcome
                    .records
                    .iter()
                    .filter_map(|item| pipeline.source.normalize(target, item, &captured_at)),
            );
            tracing::debug!(
                source = %outcome.source,
                target = %target,
                raw = outcome.records.len(),
                kept = batch.len() - before,
                "normalized"
            );
        }

        let records = batch.len();
        if records == 0 {
            tracing::debug!(target = %target, "no results");
        } else {
            tracing::debug!(target = %target, records, "collected results");
            self.results.lock().extend(batch);
        }

        TargetOutcome { records, failed_queries }
    }
}
