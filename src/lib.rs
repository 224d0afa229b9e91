// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod enrich;
pub mod error;
pub mod exporter;
pub mod input;
pub mod merge;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod utils;

pub use config::{Config, ExportConfig, PipelineConfig, ScraperConfig};
pub use enrich::{Fetcher, LinkedInFetcher, RateLimiter, RetryPolicy, WorkerPool};
pub use error::{FetchError, PipelineError, Result};
pub use exporter::{ExportManifest, JsonExporter};
pub use input::{read_csv, RawDataset, RawRow};
pub use merge::merge;
pub use models::{
    CanonicalField, CanonicalRecord, EnrichmentResult, FetchStatus, FetchedFields, JobId, JobState,
    JobStatus, MergedRecord, RejectReason, RejectedRecord,
};
pub use normalizer::{AliasTable, NormalizedDataset, SchemaNormalizer};
pub use pipeline::{format_summary, JobResults, Orchestrator, PipelineStats, ProgressTracker};
