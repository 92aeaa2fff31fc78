// Client-side request spacing for hosted model providers.
//
// Hosted inference endpoints throttle free-tier tokens. When a QPS limit is
// configured, each provider call waits its turn here. Callers queue on the
// lock (tokio's Mutex is FIFO) and a request is stamped only once it is
// admitted, so a caller cancelled while waiting (e.g. by the adapter's
// timeout) leaves no trace and cannot push later callers back.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Spaces admitted requests at least `interval` apart.
#[derive(Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Allow up to `requests_per_second` requests per second.
    /// Non-positive rates are treated as "no spacing".
    pub fn new(requests_per_second: f64) -> Result<Self> {
        let interval = if requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second).with_context(|| {
                format!("Request rate {requests_per_second} is too low to schedule")
            })?
        } else {
            Duration::ZERO
        };
        Ok(Self {
            interval,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a request is allowed, then return.
    ///
    /// The lock is held through the wait so admissions stay ordered; dropping
    /// the future releases it without recording a request.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
