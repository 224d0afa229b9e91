// file: src/models/job.rs
// description: job identity and per-job progress state
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Cancelling,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Progress of one enrichment run. Mutated only by the owning job task;
/// everyone else reads snapshots through the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub rejected: usize,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobState {
    pub fn pending(total: usize, rejected: usize) -> Self {
        Self {
            total,
            completed: 0,
            failed: 0,
            in_progress: 0,
            rejected,
            status: JobStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
