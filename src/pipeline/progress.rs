// file: src/pipeline/progress.rs
// description: progress bar rendering and run statistics for pipeline execution
// reference: uses indicatif for progress bars, fed from JobState snapshots

use crate::models::JobState;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub rejected: usize,
    pub duration_secs: u64,
}

impl PipelineStats {
    pub fn from_state(state: &JobState, duration_secs: u64) -> Self {
        Self {
            total: state.total,
            completed: state.completed,
            failed: state.failed,
            rejected: state.rejected,
            duration_secs,
        }
    }

    pub fn records_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        (self.completed + self.failed) as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let processed = self.completed + self.failed;
        if processed == 0 {
            return 0.0;
        }
        (self.completed as f64 / processed as f64) * 100.0
    }
}

/// Console progress display driven by `JobState` snapshots, so it shows
/// exactly what a `status` caller would see.
pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self::with_color(total, true)
    }

    pub fn with_color(total: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            start_time: Instant::now(),
        }
    }

    /// Position never moves backwards: processed counts are monotonic in
    /// the orchestrator, so replaying a snapshot is safe.
    pub fn update(&self, state: &JobState) {
        self.main_bar.set_position(state.processed() as u64);
        self.detail_bar.set_message(format!(
            "Enriched: {} | Failed: {} | In flight: {}",
            state.completed, state.failed, state.in_progress
        ));
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Enrichment complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn stats(&self, state: &JobState) -> PipelineStats {
        PipelineStats::from_state(state, self.start_time.elapsed().as_secs())
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}

pub fn format_summary(stats: &PipelineStats) -> Vec<String> {
    vec![
        format!("Records enriched:  {}", stats.completed.to_string().green()),
        format!("Records failed:    {}", stats.failed.to_string().red()),
        format!("Rows rejected:     {}", stats.rejected.to_string().yellow()),
        format!("Success rate:      {:.1}%", stats.success_rate()),
        format!("Duration:          {}s", stats.duration_secs),
        format!("Throughput:        {:.2} records/sec", stats.records_per_second()),
    ]
}
