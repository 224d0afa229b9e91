// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod orchestrator;
mod progress;

pub use orchestrator::{JobResults, Orchestrator};
pub use progress::{format_summary, PipelineStats, ProgressTracker};
