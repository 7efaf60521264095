use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between requests, shared by every call made through one
/// client.
///
/// Built for a single caller at a time within one process: two tasks waiting
/// concurrently can both observe the same last-request time and dispatch
/// together. The mutex only guards the timestamp; it does not serialize
/// requests.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            min_interval: Duration::from_secs_f64(60.0 / requests_per_minute.max(1) as f64),
            last_request: Mutex::new(None),
        }
    }

    /// Sleep until `min_interval` has passed since the last recorded request.
    pub async fn wait(&self) {
        let remaining = {
            let last = self.last_request.lock().await;
            last.map(|t| (t + self.min_interval).saturating_duration_since(Instant::now()))
        };

        if let Some(remaining) = remaining.filter(|d| !d.is_zero()) {
            tracing::debug!(wait_ms = remaining.as_millis() as u64, "Rate limiting LLM request");
            tokio::time::sleep(remaining).await;
        }
    }

    /// Record that a request just reached the server, whatever its outcome.
    pub async fn mark(&self) {
        *self.last_request.lock().await = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_follows_requests_per_minute() {
        assert_eq!(RateLimiter::per_minute(60).min_interval, Duration::from_secs(1));
        assert_eq!(RateLimiter::per_minute(120).min_interval, Duration::from_millis(500));
        assert_eq!(RateLimiter::per_minute(0).min_interval, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn first_request_does_not_wait() {
        let limiter = RateLimiter::per_minute(60);
        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_requests_are_spaced() {
        let limiter = RateLimiter::per_minute(60);
        limiter.mark().await;

        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_counts_towards_interval() {
        let limiter = RateLimiter::per_minute(60);
        limiter.mark().await;
        tokio::time::advance(Duration::from_millis(700)).await;

        let start = Instant::now();
        limiter.wait().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(400));
    }
}
