// file: src/models/enrichment.rs
// description: outcome of one enrichment attempt sequence for a record
// reference: internal data structures

use crate::models::CanonicalField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type FetchedFields = BTreeMap<CanonicalField, String>;

/// Terminal status of a record's fetch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Partial,
    Failed,
    RateLimited,
}

impl FetchStatus {
    /// Whether scraped values are trusted enough to merge.
    pub fn succeeded(&self) -> bool {
        matches!(self, FetchStatus::Ok | FetchStatus::Partial)
    }
}

/// Result of the fetch sequence for one record. Immutable once produced;
/// a retry sequence yields exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub record_id: usize,
    pub fetched_fields: FetchedFields,
    pub fetch_status: FetchStatus,
    pub attempt_count: u32,
    pub error_detail: Option<String>,
}

impl EnrichmentResult {
    /// A successful fetch. Status is `Ok` when the page yielded all of the
    /// primary volatile fields, `Partial` otherwise.
    pub fn success(record_id: usize, fetched_fields: FetchedFields, attempt_count: u32) -> Self {
        let complete = [
            CanonicalField::Size,
            CanonicalField::Industry,
            CanonicalField::Description,
        ]
        .iter()
        .all(|f| fetched_fields.contains_key(f));

        Self {
            record_id,
            fetched_fields,
            fetch_status: if complete {
                FetchStatus::Ok
            } else {
                FetchStatus::Partial
            },
            attempt_count,
            error_detail: None,
        }
    }

    pub fn failure(
        record_id: usize,
        fetch_status: FetchStatus,
        attempt_count: u32,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            record_id,
            fetched_fields: FetchedFields::new(),
            fetch_status,
            attempt_count,
            error_detail: Some(error_detail.into()),
        }
    }
}
