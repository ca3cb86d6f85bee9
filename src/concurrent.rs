use tokio::sync::Semaphore;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;

/// Bounded worker pool: at most `workers` tasks run at once, each on its own
/// tokio task so a panic in one never reaches its siblings.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    completed: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
    processed: AtomicUsize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            completed: Arc::new(AtomicUsize::new(0)),
            errors: Arc::new(AtomicUsize::new(0)),
            processed: AtomicUsize::new(0),
        }
    }

    /// Run `task_fn` once per task and wait for all of them. Output order
    /// follows completion, not submission. Panicked tasks yield `None`.
    pub async fn execute<T, F, Fut>(
        &self,
        tasks: Vec<T>,
        task_fn: F,
    ) -> Vec<Option<Fut::Output>>
    where
        F: Fn(T) -> Fut + Clone + Send + 'static,
        Fut: std::future::Future + Send + 'static,
        Fut::Output: Send + 'static,
        T: Display + Send + 'static,
    {
        let total = tasks.len();
        let mut futures = FuturesUnordered::new();

        for task in tasks {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!(task = %task, "worker pool closed, task dropped");
                    self.errors.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };
            let label = task.to_string();
            let task_fn = task_fn.clone();
            let completed = self.completed.clone();

            let handle = tokio::spawn(async move {
                let result = task_fn(task).await;
                drop(permit);
                completed.fetch_add(1, Ordering::Relaxed);
                result
            });
            futures.push(async move { (label, handle.await) });
        }

        let mut results = Vec::with_capacity(total);
        let mut done = 0;
        while let Some((label, joined)) = futures.next().await {
            match joined {
                Ok(output) => results.push(Some(output)),
                Err(e) => {
                    self.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(task = %label, error = %e, "task failed");
                    results.push(None);
                }
            }
            // panicked tasks count toward progress too
            done += 1;
            self.processed.fetch_add(1, Ordering::Relaxed);
            if done % 10 == 0 || done == total {
                tracing::info!(done, total, "processed {}/{} targets", done, total);
            }
        }

        results
    }

    /// Tasks joined so far, whether they finished or panicked.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// (completed, failed) task counts so far.
    pub fn get_stats(&self) -> (usize, usize) {
        (
            self.completed.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }
}

/// Shared result cache using parking_lot RwLock for better performance
pub struct ResultCache<K, V> {
    cache: Arc<RwLock<ahash::AHashMap<K, V>>>,
}

impl<K: std::hash::Hash + Eq + Clone, V: Clone> ResultCache<K, V> {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(RwLock::new(ahash::AHashMap::new())),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.read().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.cache.write().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl<K, V> Default for ResultCache<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let pool = WorkerPool::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<u32> = (0..12).collect();
        let (r, p) = (running.clone(), peak.clone());
        let results = pool
            .execute(tasks, move |n| {
                let (running, peak) = (r.clone(), p.clone());
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    n * 2
                }
            })
            .await;

        assert_eq!(results.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.get_stats(), (12, 0));
        assert_eq!(pool.processed(), 12);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_abort_siblings() {
        let pool = WorkerPool::new(2);
        let results = pool
            .execute(vec![1u32, 2, 3, 4], |n| async move {
                if n == 3 {
                    panic!("boom");
                }
                n
            })
            .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.is_none()).count(), 1);
        assert_eq!(pool.get_stats(), (3, 1));
        assert_eq!(pool.processed(), 4);
    }

    #[test]
    fn test_result_cache() {
        let cache: ResultCache<String, Vec<u8>> = ResultCache::new();
        assert!(cache.is_empty());
        cache.insert("q".to_string(), vec![1, 2]);
        assert_eq!(cache.get(&"q".to_string()), Some(vec![1, 2]));
        assert_eq!(cache.get(&"other".to_string()), None);
        assert_eq!(cache.len(), 1);
    }
}
