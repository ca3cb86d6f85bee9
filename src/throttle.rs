use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Minimum-interval pacing for one API source.
///
/// Callers reserve the next free slot on a shared cursor under the lock and
/// then sleep outside it, so no two permitted calls are closer than
/// `interval` regardless of how many tasks are waiting.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_slot: Mutex::new(None) }
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        let secs = if secs.is_finite() && secs > 0.0 { secs } else { 0.0 };
        Self::new(Duration::from_secs_f64(secs))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until this caller's reserved slot arrives.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let slot = self.reserve();
        sleep_until(slot).await;
    }

    fn reserve(&self) -> Instant {
        let mut next = self.next_slot.lock();
        let now = Instant::now();
        let slot = match *next {
            Some(t) if t > now => t,
            _ => now,
        };
        *next = Some(slot + self.interval);
        slot
    }
}
