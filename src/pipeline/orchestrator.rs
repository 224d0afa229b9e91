// file: src/pipeline/orchestrator.rs
// description: coordinates normalization, enrichment dispatch, merge, and job state
// reference: orchestrates asynchronous enrichment workflow

use crate::config::Config;
use crate::enrich::{Fetcher, WorkerEvent, WorkerPool};
use crate::error::{PipelineError, Result};
use crate::input::RawDataset;
use crate::merge::merge;
use crate::models::{
    CanonicalRecord, JobId, JobState, JobStatus, MergedRecord, RejectedRecord,
};
use crate::normalizer::{AliasTable, SchemaNormalizer};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Finished output of a job, handed to the persistence boundary.
#[derive(Debug, Clone)]
pub struct JobResults {
    pub merged: Vec<MergedRecord>,
    pub rejected: Vec<RejectedRecord>,
}

struct JobHandle {
    state: Arc<Mutex<JobState>>,
    cancel: watch::Sender<bool>,
    outcome: Arc<Mutex<Option<JobResults>>>,
}

/// Owns all job state. Submission normalizes the dataset, spawns a job task
/// that drives the worker pool, and consumes worker events; callers observe
/// jobs only through snapshots.
pub struct Orchestrator {
    pool: Arc<WorkerPool>,
    normalizer: SchemaNormalizer,
    result_channel_capacity: usize,
    jobs: Mutex<HashMap<JobId, Arc<JobHandle>>>,
}

impl Orchestrator {
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let aliases = AliasTable::from_config(config)?;
        Ok(Self {
            pool: Arc::new(WorkerPool::new(fetcher, &config.scraper)),
            normalizer: SchemaNormalizer::new(aliases),
            result_channel_capacity: config.pipeline.result_channel_capacity,
            jobs: Mutex::new(HashMap::new()),
        })
    }

    /// Normalize the dataset and start an enrichment job. Fails only on a
    /// structural input error; per-row problems reject rows, not the job.
    pub fn submit(&self, dataset: &RawDataset) -> Result<JobId> {
        let normalized = self.normalizer.normalize(dataset)?;
        let job_id = JobId::new();

        info!(
            %job_id,
            enrichable = normalized.records.len(),
            rejected = normalized.rejected.len(),
            "job submitted"
        );

        let state = Arc::new(Mutex::new(JobState::pending(
            normalized.records.len(),
            normalized.rejected.len(),
        )));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let outcome = Arc::new(Mutex::new(None));

        let handle = Arc::new(JobHandle {
            state: state.clone(),
            cancel: cancel_tx,
            outcome: outcome.clone(),
        });
        self.jobs
            .lock()
            .expect("jobs lock poisoned")
            .insert(job_id, handle);

        let pool = self.pool.clone();
        let capacity = self.result_channel_capacity;
        tokio::spawn(async move {
            run_job(
                job_id,
                pool,
                normalized.records,
                normalized.rejected,
                state,
                cancel_rx,
                outcome,
                capacity,
            )
            .await;
        });

        Ok(job_id)
    }

    /// Point-in-time snapshot of a job's state.
    pub fn status(&self, job_id: JobId) -> Result<JobState> {
        let handle = self.handle(job_id)?;
        let state = handle.state.lock().expect("job state lock poisoned");
        Ok(state.clone())
    }

    /// Request cooperative cancellation. In-flight fetches drain; no new
    /// fetches are dispatched. Idempotent, and a no-op once terminal.
    pub fn cancel(&self, job_id: JobId) -> Result<()> {
        let handle = self.handle(job_id)?;
        {
            let mut state = handle.state.lock().expect("job state lock poisoned");
            if state.is_terminal() {
                return Ok(());
            }
            state.status = JobStatus::Cancelling;
        }
        info!(%job_id, "cancellation requested");
        // send fails only when the job task already finished
        let _ = handle.cancel.send(true);
        Ok(())
    }

    /// Merged and rejected records, available once the job is terminal.
    pub fn results(&self, job_id: JobId) -> Result<JobResults> {
        let handle = self.handle(job_id)?;
        let outcome = handle.outcome.lock().expect("job outcome lock poisoned");
        outcome
            .clone()
            .ok_or(PipelineError::JobNotFinished(job_id))
    }

    fn handle(&self, job_id: JobId) -> Result<Arc<JobHandle>> {
        self.jobs
            .lock()
            .expect("jobs lock poisoned")
            .get(&job_id)
            .cloned()
            .ok_or(PipelineError::UnknownJob(job_id))
    }
}

/// The single writer of a job's counters. Consumes worker events, merges
/// every terminal record, and settles the terminal status.
#[allow(clippy::too_many_arguments)]
async fn run_job(
    job_id: JobId,
    pool: Arc<WorkerPool>,
    records: Vec<CanonicalRecord>,
    rejected: Vec<RejectedRecord>,
    state: Arc<Mutex<JobState>>,
    cancel_rx: watch::Receiver<bool>,
    outcome: Arc<Mutex<Option<JobResults>>>,
    channel_capacity: usize,
) {
    {
        let mut st = state.lock().expect("job state lock poisoned");
        // cancel may already have been requested between submit and spawn
        if st.status == JobStatus::Pending {
            st.status = JobStatus::Running;
        }
    }

    let mut pending: BTreeMap<usize, CanonicalRecord> = records
        .iter()
        .map(|r| (r.record_id, r.clone()))
        .collect();
    let mut merged: Vec<MergedRecord> = Vec::with_capacity(records.len());

    if !records.is_empty() {
        let (events_tx, mut events_rx) = mpsc::channel(channel_capacity);
        let pool_task = {
            let cancel = cancel_rx.clone();
            tokio::spawn(async move { pool.run(records, events_tx, cancel).await })
        };

        while let Some(event) = events_rx.recv().await {
            match event {
                WorkerEvent::Started { record_id } => {
                    tracing::debug!(%job_id, record_id, "enrichment dispatched");
                    let mut st = state.lock().expect("job state lock poisoned");
                    st.in_progress += 1;
                }
                WorkerEvent::Finished(result) => {
                    let Some(record) = pending.remove(&result.record_id) else {
                        warn!(%job_id, record_id = result.record_id, "duplicate worker result dropped");
                        continue;
                    };
                    let merged_record = merge(&record, Some(&result));
                    let mut st = state.lock().expect("job state lock poisoned");
                    st.in_progress = st.in_progress.saturating_sub(1);
                    if result.fetch_status.succeeded() {
                        st.completed += 1;
                    } else {
                        st.failed += 1;
                    }
                    drop(st);
                    merged.push(merged_record);
                }
            }
        }

        if let Err(e) = pool_task.await {
            warn!(%job_id, "worker pool task failed: {}", e);
        }
    }

    // records never dispatched (cancellation): merge from original fields
    for (_, record) in pending {
        merged.push(merge(&record, None));
    }
    merged.sort_by_key(|m| m.record_id);

    let cancelled = *cancel_rx.borrow();
    let mut st = state.lock().expect("job state lock poisoned");
    st.in_progress = 0;
    st.finished_at = Some(Utc::now());
    st.status = if st.total == 0 {
        if st.rejected > 0 {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        }
    } else if !cancelled && st.completed == 0 && st.failed == st.total {
        JobStatus::Failed
    } else {
        JobStatus::Completed
    };
    let final_status = st.status;
    let (completed, failed) = (st.completed, st.failed);
    drop(st);

    *outcome.lock().expect("job outcome lock poisoned") = Some(JobResults { merged, rejected });

    info!(
        %job_id,
        ?final_status,
        completed,
        failed,
        "job reached terminal state"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::input::{RawDataset, RawRow};
    use crate::models::{CanonicalField, FetchedFields};
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticFetcher {
        outcome: fn() -> std::result::Result<FetchedFields, FetchError>,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(
            &self,
            _record: &CanonicalRecord,
        ) -> std::result::Result<FetchedFields, FetchError> {
            (self.outcome)()
        }
    }

    fn dataset(rows: &[(&str, &str)]) -> RawDataset {
        RawDataset {
            headers: vec!["Company Name".to_string(), "Company Linkedin".to_string()],
            rows: rows
                .iter()
                .map(|(name, url)| RawRow {
                    cells: vec![
                        ("Company Name".to_string(), name.to_string()),
                        ("Company Linkedin".to_string(), url.to_string()),
                    ],
                })
                .collect(),
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default_config();
        config.scraper.min_spacing_ms = 0;
        config.scraper.backoff_base_ms = 1;
        config.scraper.backoff_cap_ms = 2;
        config.scraper.max_retries = 1;
        config.scraper.cooldown_secs = 0;
        config
    }

    fn orchestrator(outcome: fn() -> std::result::Result<FetchedFields, FetchError>) -> Orchestrator {
        Orchestrator::new(&fast_config(), Arc::new(StaticFetcher { outcome })).unwrap()
    }

    async fn wait_terminal(orch: &Orchestrator, job_id: JobId) -> JobState {
        loop {
            let state = orch.status(job_id).unwrap();
            if state.is_terminal() {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_and_complete() {
        let orch = orchestrator(|| {
            Ok([(CanonicalField::Size, "51-200".to_string())]
                .into_iter()
                .collect())
        });
        let job_id = orch
            .submit(&dataset(&[("Acme", "https://linkedin.com/company/acme")]))
            .unwrap();

        let state = wait_terminal(&orch, job_id).await;
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.completed, 1);
        assert_eq!(state.failed, 0);

        let results = orch.results(job_id).unwrap();
        assert_eq!(results.merged.len(), 1);
        assert_eq!(results.merged[0].fields[&CanonicalField::Size], "51-200");
        assert_eq!(results.merged[0].fields[&CanonicalField::CompanyName], "Acme");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failed_job_fails() {
        let orch = orchestrator(|| Err(FetchError::Permanent("404".into())));
        let job_id = orch
            .submit(&dataset(&[
                ("Acme", "https://linkedin.com/company/acme"),
                ("Globex", "https://linkedin.com/company/globex"),
            ]))
            .unwrap();

        let state = wait_terminal(&orch, job_id).await;
        assert_eq!(state.status, JobStatus::Failed);
        assert_eq!(state.failed, 2);

        // failed records still merge with original fields
        let results = orch.results(job_id).unwrap();
        assert_eq!(results.merged.len(), 2);
        assert!(results.merged.iter().all(|m| m.enrichment_incomplete));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_still_completes() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct AlternatingFetcher {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl Fetcher for AlternatingFetcher {
            async fn fetch(
                &self,
                _record: &CanonicalRecord,
            ) -> std::result::Result<FetchedFields, FetchError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                    Ok([(CanonicalField::Size, "11-50".to_string())]
                        .into_iter()
                        .collect())
                } else {
                    Err(FetchError::Permanent("gone".into()))
                }
            }
        }

        let mut config = fast_config();
        config.scraper.max_workers = 1; // deterministic alternation
        let orch = Orchestrator::new(
            &config,
            Arc::new(AlternatingFetcher {
                calls: AtomicUsize::new(0),
            }),
        )
        .unwrap();

        let job_id = orch
            .submit(&dataset(&[
                ("Acme", "https://linkedin.com/company/acme"),
                ("Globex", "https://linkedin.com/company/globex"),
            ]))
            .unwrap();

        let state = wait_terminal(&orch, job_id).await;
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.completed, 1);
        assert_eq!(state.failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_rejected_job_fails() {
        let orch = orchestrator(|| Ok(FetchedFields::new()));
        let job_id = orch.submit(&dataset(&[("", ""), ("  ", "")])).unwrap();

        let state = wait_terminal(&orch, job_id).await;
        assert_eq!(state.status, JobStatus::Failed);
        assert_eq!(state.rejected, 2);
        assert_eq!(state.total, 0);

        let results = orch.results(job_id).unwrap();
        assert!(results.merged.is_empty());
        assert_eq!(results.rejected.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_completes() {
        let orch = orchestrator(|| Ok(FetchedFields::new()));
        let job_id = orch.submit(&dataset(&[])).unwrap();

        let state = wait_terminal(&orch, job_id).await;
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.total, 0);
        assert_eq!(state.rejected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_before_terminal_rejected() {
        struct SlowFetcher;

        #[async_trait]
        impl Fetcher for SlowFetcher {
            async fn fetch(
                &self,
                _record: &CanonicalRecord,
            ) -> std::result::Result<FetchedFields, FetchError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Transient("never".into()))
            }
        }

        let orch = Orchestrator::new(&fast_config(), Arc::new(SlowFetcher)).unwrap();
        let job_id = orch
            .submit(&dataset(&[("Acme", "https://linkedin.com/company/acme")]))
            .unwrap();

        tokio::task::yield_now().await;
        assert!(matches!(
            orch.results(job_id),
            Err(PipelineError::JobNotFinished(_))
        ));
        orch.cancel(job_id).unwrap();
        wait_terminal(&orch, job_id).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_job() {
        let orch = orchestrator(|| Ok(FetchedFields::new()));
        assert!(matches!(
            orch.status(JobId::new()),
            Err(PipelineError::UnknownJob(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drains_and_completes() {
        struct SlowFetcher;

        #[async_trait]
        impl Fetcher for SlowFetcher {
            async fn fetch(
                &self,
                _record: &CanonicalRecord,
            ) -> std::result::Result<FetchedFields, FetchError> {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok([(CanonicalField::Size, "1-10".to_string())]
                    .into_iter()
                    .collect())
            }
        }

        let mut config = fast_config();
        config.scraper.max_workers = 1;
        let orch = Orchestrator::new(&config, Arc::new(SlowFetcher)).unwrap();

        let rows: Vec<(String, String)> = (0..5)
            .map(|i| {
                (
                    format!("Company {}", i),
                    format!("https://linkedin.com/company/c{}", i),
                )
            })
            .collect();
        let row_refs: Vec<(&str, &str)> = rows
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let job_id = orch.submit(&dataset(&row_refs)).unwrap();

        // let the first fetch start, then cancel
        tokio::time::sleep(Duration::from_millis(50)).await;
        orch.cancel(job_id).unwrap();

        let state = wait_terminal(&orch, job_id).await;
        assert_eq!(state.status, JobStatus::Completed);
        assert!(state.processed() < state.total);

        // every record is still present in the merged output
        let results = orch.results(job_id).unwrap();
        assert_eq!(results.merged.len(), 5);
        let incomplete = results
            .merged
            .iter()
            .filter(|m| m.enrichment_incomplete)
            .count();
        assert!(incomplete >= 3, "expected most records unenriched");
    }
}
