// file: src/enrich/pool.rs
// description: bounded enrichment worker pool with retries, cancellation, and result channel
// reference: semaphore-bounded concurrent tasks feeding a single consumer

use crate::config::ScraperConfig;
use crate::enrich::fetcher::Fetcher;
use crate::enrich::rate_limit::RateLimiter;
use crate::enrich::retry::{AttemptState, RetryPolicy};
use crate::error::FetchError;
use crate::models::{CanonicalRecord, EnrichmentResult, FetchStatus};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Events the pool reports back to the orchestrator over a single channel.
/// `Started` lets the consumer track in-progress counts; `Finished` carries
/// the terminal result of a record's retry sequence.
#[derive(Debug)]
pub enum WorkerEvent {
    Started { record_id: usize },
    Finished(EnrichmentResult),
}

/// Concurrent fetch pool. Each record is enriched by at most one worker at
/// a time; retries for one record are strictly sequential. Completion order
/// across records is unspecified.
pub struct WorkerPool {
    fetcher: Arc<dyn Fetcher>,
    limiter: RateLimiter,
    policy: RetryPolicy,
    fetch_timeout: Duration,
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            limiter: RateLimiter::from_config(config),
            policy: RetryPolicy::from_config(config),
            fetch_timeout: config.fetch_timeout(),
            max_workers: config.max_workers.max(1),
        }
    }

    /// Enrich every record, sending events to `events`. Returns when all
    /// records have either finished or been skipped due to cancellation;
    /// records skipped before dispatch produce no event at all.
    pub async fn run(
        &self,
        records: Vec<CanonicalRecord>,
        events: mpsc::Sender<WorkerEvent>,
        cancel: watch::Receiver<bool>,
    ) {
        let tasks = records.into_iter().map(|record| {
            let events = events.clone();
            let cancel = cancel.clone();
            async move {
                // no new dispatch once cancellation is requested
                if *cancel.borrow() {
                    debug!(record_id = record.record_id, "skipping dispatch, job cancelled");
                    return;
                }

                let started = events
                    .send(WorkerEvent::Started {
                        record_id: record.record_id,
                    })
                    .await;
                if started.is_err() {
                    return; // consumer gone, job is tearing down
                }

                let result = self.enrich_record(&record, &cancel).await;
                let _ = events.send(WorkerEvent::Finished(result)).await;
            }
        });

        stream::iter(tasks)
            .buffer_unordered(self.max_workers)
            .collect::<Vec<()>>()
            .await;
    }

    /// Run the bounded attempt state machine for one record.
    async fn enrich_record(
        &self,
        record: &CanonicalRecord,
        cancel: &watch::Receiver<bool>,
    ) -> EnrichmentResult {
        let max_attempts = self.policy.attempts_allowed();
        let mut state = AttemptState::Pending;
        let mut attempts = 0u32;
        let mut last_error: Option<FetchError> = None;

        loop {
            match state {
                AttemptState::Pending => {
                    if *cancel.borrow() {
                        break;
                    }
                    state = AttemptState::Attempting;
                }
                AttemptState::Attempting => {
                    attempts += 1;

                    let lease = self.limiter.acquire().await;
                    let outcome =
                        tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(record))
                            .await;
                    drop(lease);

                    let outcome = match outcome {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::Transient(format!(
                            "fetch timed out after {:?}",
                            self.fetch_timeout
                        ))),
                    };

                    match outcome {
                        Ok(fields) => {
                            debug!(
                                record_id = record.record_id,
                                attempts,
                                fields = fields.len(),
                                "enrichment succeeded"
                            );
                            return EnrichmentResult::success(record.record_id, fields, attempts);
                        }
                        Err(FetchError::RateLimited) => {
                            // the remote site limits the whole client, not one worker
                            self.limiter.penalize().await;
                            last_error = Some(FetchError::RateLimited);
                            state = AttemptState::TransientFailure;
                        }
                        Err(err @ FetchError::Transient(_)) => {
                            warn!(
                                record_id = record.record_id,
                                attempt = attempts,
                                error = %err,
                                "transient enrichment failure"
                            );
                            last_error = Some(err);
                            state = AttemptState::TransientFailure;
                        }
                        Err(err @ FetchError::Permanent(_)) => {
                            warn!(
                                record_id = record.record_id,
                                attempt = attempts,
                                error = %err,
                                "permanent enrichment failure"
                            );
                            return EnrichmentResult::failure(
                                record.record_id,
                                FetchStatus::Failed,
                                attempts,
                                err.to_string(),
                            );
                        }
                    }
                }
                AttemptState::TransientFailure => {
                    if attempts >= max_attempts {
                        state = AttemptState::ExhaustedRetries;
                        continue;
                    }
                    let delay = self.policy.backoff_delay(attempts);
                    debug!(
                        record_id = record.record_id,
                        attempt = attempts,
                        "backing off {:?} before retry",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    // a retry is a new fetch; stop scheduling after cancel
                    if *cancel.borrow() {
                        break;
                    }
                    state = AttemptState::Attempting;
                }
                AttemptState::ExhaustedRetries => {
                    debug!(record_id = record.record_id, attempts, "retries exhausted");
                    break;
                }
                // reached only via early return above
                AttemptState::Success | AttemptState::PermanentFailure => break,
            }
        }

        let status = match last_error {
            Some(FetchError::RateLimited) => FetchStatus::RateLimited,
            _ => FetchStatus::Failed,
        };
        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "cancelled before first attempt".to_string());

        EnrichmentResult::failure(record.record_id, status, attempts, detail)
    }
}
