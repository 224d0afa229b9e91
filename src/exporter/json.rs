// file: src/exporter/json.rs
// description: json export of finished jobs for the persistence boundary

use crate::error::Result;
use crate::models::{JobId, JobState};
use crate::pipeline::JobResults;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub job_id: String,
    pub exported_at: String,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub rejected: usize,
    pub files: Vec<String>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Write merged records, rejected records, and a run manifest for a
    /// terminal job. File names carry the job id so repeated runs into the
    /// same directory never clobber each other.
    pub fn export_job(
        &self,
        job_id: JobId,
        results: &JobResults,
        state: &JobState,
        pretty: bool,
    ) -> Result<ExportManifest> {
        info!(%job_id, "Starting JSON export to {:?}", self.output_dir);

        let merged_name = format!("{}.merged.json", job_id);
        let rejected_name = format!("{}.rejected.json", job_id);
        self.write_json(&merged_name, &results.merged, pretty)?;
        self.write_json(&rejected_name, &results.rejected, pretty)?;

        let manifest = ExportManifest {
            job_id: job_id.to_string(),
            exported_at: Utc::now().to_rfc3339(),
            total: state.total,
            completed: state.completed,
            failed: state.failed,
            rejected: state.rejected,
            files: vec![merged_name, rejected_name],
        };
        self.write_json(&format!("{}.manifest.json", job_id), &manifest, pretty)?;

        info!(
            "Export complete: {} merged, {} rejected records",
            results.merged.len(),
            results.rejected.len()
        );
        Ok(manifest)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T, pretty: bool) -> Result<()> {
        let path = self.output_dir.join(name);
        let body = if pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        fs::write(&path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalField, MergedRecord};
    use tempfile::tempdir;

    #[test]
    fn test_exporter_creation() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path());
        assert!(exporter.is_ok());
    }

    #[test]
    fn test_export_job_writes_files() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();
        let job_id = JobId::new();

        let results = JobResults {
            merged: vec![MergedRecord {
                record_id: 0,
                fields: [(CanonicalField::CompanyName, "Acme".to_string())]
                    .into_iter()
                    .collect(),
                source_fields: vec![],
                enrichment_incomplete: false,
                attempt_count: 1,
                error_detail: None,
            }],
            rejected: vec![],
        };
        let mut state = JobState::pending(1, 0);
        state.completed = 1;

        let manifest = exporter.export_job(job_id, &results, &state, true).unwrap();
        assert_eq!(manifest.files.len(), 2);

        let merged_path = dir.path().join(format!("{}.merged.json", job_id));
        let body = fs::read_to_string(merged_path).unwrap();
        assert!(body.contains("\"company_name\": \"Acme\""));

        let manifest_path = dir.path().join(format!("{}.manifest.json", job_id));
        assert!(manifest_path.exists());
    }
}
