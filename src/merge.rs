// file: src/merge.rs
// description: precedence merge of canonical records with enrichment results
// reference: pure per-record transform, safe to run concurrently

use crate::models::{CanonicalField, CanonicalRecord, EnrichmentResult, MergedRecord};

/// Combine a record with its enrichment outcome.
///
/// Volatile fields (size, revenue, industry, description) take the scraped
/// value only when the fetch succeeded and the value is non-empty. Identity
/// fields are kept verbatim, except that a scraped website may fill an
/// absent one. A record with no usable enrichment is still merged, from its
/// original fields alone, and flagged `enrichment_incomplete`.
pub fn merge(record: &CanonicalRecord, enrichment: Option<&EnrichmentResult>) -> MergedRecord {
    let mut fields = record.fields.clone();
    let mut enrichment_incomplete = true;

    if let Some(result) = enrichment {
        if result.fetch_status.succeeded() {
            for field in CanonicalField::VOLATILE_FIELDS {
                if let Some(value) = result.fetched_fields.get(&field) {
                    if !value.trim().is_empty() {
                        fields.insert(field, value.clone());
                    }
                }
            }

            if !fields.contains_key(&CanonicalField::Website) {
                if let Some(site) = result.fetched_fields.get(&CanonicalField::Website) {
                    if !site.trim().is_empty() {
                        fields.insert(CanonicalField::Website, site.clone());
                    }
                }
            }

            enrichment_incomplete = false;
        }
    }

    MergedRecord {
        record_id: record.record_id,
        fields,
        source_fields: record.source_fields.clone(),
        enrichment_incomplete,
        attempt_count: enrichment.map(|e| e.attempt_count).unwrap_or(0),
        error_detail: enrichment.and_then(|e| e.error_detail.clone()),
    }
}
