// file: src/enrich/rate_limit.rs
// description: shared fetch rate limiter: bounded concurrency, global spacing, cooldown
// reference: token-clock limiter shared by all workers

use crate::config::ScraperConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Permit-issuing limiter shared by every enrichment worker. Holds three
/// constraints at once: at most `max_workers` concurrent requests, a global
/// minimum spacing between request starts, and a global cooldown after the
/// remote site reports rate limiting.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    workers: Arc<Semaphore>,
    min_spacing: Duration,
    cooldown: Duration,
    clock: Mutex<Instant>,
}

/// Lease for one in-flight request. Concurrency is released when the lease
/// drops, on every exit path.
#[derive(Debug)]
pub struct RequestLease {
    _permit: OwnedSemaphorePermit,
}

impl RateLimiter {
    pub fn new(max_workers: usize, min_spacing: Duration, cooldown: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                workers: Arc::new(Semaphore::new(max_workers.max(1))),
                min_spacing,
                cooldown,
                clock: Mutex::new(Instant::now()),
            }),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(
            config.max_workers,
            config.min_spacing(),
            config.cooldown(),
        )
    }

    /// Wait for a concurrency slot and the next request slot on the shared
    /// clock, then hand out a lease. The clock slot is reserved before
    /// sleeping so concurrent acquirers serialize at `min_spacing` apart.
    pub async fn acquire(&self) -> RequestLease {
        let permit = self
            .inner
            .workers
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore closed");

        let slot = {
            let mut next_slot = self.inner.clock.lock().await;
            let now = Instant::now();
            let slot = (*next_slot).max(now);
            *next_slot = slot + self.inner.min_spacing;
            slot
        };

        let now = Instant::now();
        if slot > now {
            debug!("rate limiter holding request for {:?}", slot - now);
            tokio::time::sleep_until(slot).await;
        }

        RequestLease { _permit: permit }
    }

    /// Push the shared clock forward by the cooldown window. Pauses every
    /// worker, not just the one that observed the rate limit.
    pub async fn penalize(&self) {
        let mut next_slot = self.inner.clock.lock().await;
        let resume = Instant::now() + self.inner.cooldown;
        if resume > *next_slot {
            warn!(
                "remote rate limit observed, pausing all fetches for {:?}",
                self.inner.cooldown
            );
            *next_slot = resume;
        }
    }
}
