// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod enrichment;
pub mod job;
pub mod record;

pub use enrichment::{EnrichmentResult, FetchStatus, FetchedFields};
pub use job::{JobId, JobState, JobStatus};
pub use record::{CanonicalField, CanonicalRecord, MergedRecord, RejectReason, RejectedRecord};
