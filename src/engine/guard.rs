//! Retry, cache and circuit-breaker policy around one search source.
//!
//! Order of checks for a query: cached result, open circuit, then up to
//! `max_retries + 1` paced attempts with a fixed delay between them. The
//! circuit is checked again after each limiter wait, so callers queued
//! behind the limiter never reach a disabled source. Every
//! failed attempt bumps the source's failure counter; any success resets it.
//! Once the counter reaches `max_failures` the source is skipped for the rest
//! of the run. Completed queries are cached, including exhausted ones (as an
//! empty result), so an identical query is never sent twice.

use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::concurrent::ResultCache;
use crate::config::ScannerConfig;
use crate::sources::{SearchSource, SourceKind};
use crate::throttle::RateLimiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_failures: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            max_failures: config.max_api_failures,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Fetched { attempts: u32 },
    Cached,
    CircuitOpen,
    Exhausted { attempts: u32, last_error: String },
}

/// Result of one guarded query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub source: SourceKind,
    pub query: String,
    pub records: Arc<Vec<Value>>,
    pub status: QueryStatus,
}

impl QueryOutcome {
    /// True when every attempt failed; the run treats this as a recoverable
    /// per-target failure.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, QueryStatus::Exhausted { .. })
    }
}

#[derive(Default)]
struct SourceStats {
    attempts: AtomicUsize,
    failures: AtomicUsize,
    cache_hits: AtomicUsize,
    circuit_skips: AtomicUsize,
    exhausted: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStatsSnapshot {
    pub attempts: usize,
    pub failures: usize,
    pub cache_hits: usize,
    pub circuit_skips: usize,
    pub exhausted: usize,
}

pub struct SourceGuard {
    kind: SourceKind,
    policy: RetryPolicy,
    limiter: RateLimiter,
    failures: AtomicU32,
    cache: ResultCache<String, Arc<Vec<Value>>>,
    stats: SourceStats,
}

impl SourceGuard {
    pub fn new(kind: SourceKind, policy: RetryPolicy, limiter: RateLimiter) -> Self {
        Self {
            kind,
            policy,
            limiter,
            failures: AtomicU32::new(0),
            cache: ResultCache::new(),
            stats: SourceStats::default(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.failure_count() >= self.policy.max_failures
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> SourceStatsSnapshot {
        SourceStatsSnapshot {
            attempts: self.stats.attempts.load(Ordering::Relaxed),
            failures: self.stats.failures.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            circuit_skips: self.stats.circuit_skips.load(Ordering::Relaxed),
            exhausted: self.stats.exhausted.load(Ordering::Relaxed),
        }
    }

    fn outcome(&self, query: &str, records: Arc<Vec<Value>>, status: QueryStatus) -> QueryOutcome {
        QueryOutcome { source: self.kind, query: query.to_string(), records, status }
    }

    fn skip(&self, query: &str) -> QueryOutcome {
        self.stats.circuit_skips.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(source = %self.kind, query, "{} API disabled due to repeated failures", self.kind.label());
        self.outcome(query, Arc::new(Vec::new()), QueryStatus::CircuitOpen)
    }

    pub async fn run(&self, source: &dyn SearchSource, query: &str) -> QueryOutcome {
        let key = query.to_string();
        if let Some(records) = self.cache.get(&key) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(source = %self.kind, query, "query served from cache");
            return self.outcome(query, records, QueryStatus::Cached);
        }

        if self.is_open() {
            return self.skip(query);
        }

        let max_attempts = self.policy.max_attempts();
        let mut attempts = 0;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 && self.is_open() {
                tracing::warn!(source = %self.kind, query, "{} API disabled mid-retry, giving up on query", self.kind.label());
                break;
            }

            self.limiter.wait().await;
            // the circuit may have opened while this caller was queued on the limiter
            if self.is_open() {
                if attempt == 1 {
                    return self.skip(query);
                }
                tracing::warn!(source = %self.kind, query, "{} API disabled mid-retry, giving up on query", self.kind.label());
                break;
            }
            attempts = attempt;
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);

            match source.execute(query).await {
                Ok(items) => {
                    self.failures.store(0, Ordering::SeqCst);
                    let records = Arc::new(items);
                    self.cache.insert(key, records.clone());
                    return self.outcome(query, records, QueryStatus::Fetched { attempts });
                }
                Err(e) => {
                    let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        source = %self.kind,
                        attempt,
                        max_attempts,
                        failures,
                        timeout = e.is_timeout(),
                        "{} API request failed (attempt {}/{}): {}",
                        self.kind.label(),
                        attempt,
                        max_attempts,
                        e
                    );
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        self.stats.exhausted.fetch_add(1, Ordering::Relaxed);
        tracing::error!(source = %self.kind, query, attempts, "Exceeded retry budget for {}", self.kind.label());
        let empty = Arc::new(Vec::new());
        self.cache.insert(key, empty.clone());
        self.outcome(query, empty, QueryStatus::Exhausted { attempts, last_error })
    }
}
