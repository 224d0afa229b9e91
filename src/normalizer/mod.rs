// file: src/normalizer/mod.rs
// description: schema normalization of raw tabular rows into canonical records
// reference: pure transform, alias-table header resolution

mod aliases;

pub use aliases::AliasTable;

use crate::error::{PipelineError, Result};
use crate::input::RawDataset;
use crate::models::{CanonicalField, CanonicalRecord, RejectReason, RejectedRecord};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct NormalizedDataset {
    pub records: Vec<CanonicalRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Pure transform from raw rows to canonical records. Rows that resolve
/// neither a company name nor a LinkedIn URL are rejected, not dropped.
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    aliases: AliasTable,
}

impl SchemaNormalizer {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn normalize(&self, dataset: &RawDataset) -> Result<NormalizedDataset> {
        let resolved: Vec<Option<CanonicalField>> = dataset
            .headers
            .iter()
            .map(|h| self.aliases.resolve(h))
            .collect();

        if !dataset.headers.is_empty() && resolved.iter().all(Option::is_none) {
            return Err(PipelineError::Schema(format!(
                "no recognizable columns among headers: {}",
                dataset.headers.join(", ")
            )));
        }

        debug!(
            "Header resolution: {} of {} columns recognized",
            resolved.iter().filter(|r| r.is_some()).count(),
            dataset.headers.len()
        );

        let mut out = NormalizedDataset::default();

        for (row_index, row) in dataset.rows.iter().enumerate() {
            let mut record = CanonicalRecord {
                record_id: row_index,
                fields: Default::default(),
                source_fields: row.cells.clone(),
            };

            for (column, (_, raw_value)) in row.cells.iter().enumerate() {
                let Some(field) = resolved.get(column).copied().flatten() else {
                    continue;
                };
                let value = raw_value.trim();
                if value.is_empty() {
                    // unset fields stay absent, never empty strings
                    continue;
                }
                // duplicate columns for one canonical field: first wins
                record.fields.entry(field).or_insert_with(|| value.to_string());
            }

            if record.company_name().is_none() && record.linkedin_url().is_none() {
                warn!(row = row_index, "row rejected: missing required field");
                out.rejected.push(RejectedRecord {
                    row_index,
                    reason: RejectReason::MissingRequiredField,
                    source_fields: record.source_fields,
                });
            } else {
                out.records.push(record);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawRow;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> RawDataset {
        RawDataset {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|cells| RawRow {
                    cells: headers
                        .iter()
                        .zip(cells.iter())
                        .map(|(h, v)| (h.to_string(), v.to_string()))
                        .collect(),
                })
                .collect(),
        }
    }

    fn normalizer() -> SchemaNormalizer {
        SchemaNormalizer::new(AliasTable::with_defaults())
    }

    #[test]
    fn test_normalize_happy_path() {
        let data = dataset(
            &["Company Name", "Company Linkedin", "Size"],
            &[&["Acme", "https://linkedin.com/company/acme", "10-50"]],
        );
        let out = normalizer().normalize(&data).unwrap();

        assert_eq!(out.records.len(), 1);
        assert!(out.rejected.is_empty());
        let record = &out.records[0];
        assert_eq!(record.company_name(), Some("Acme"));
        assert_eq!(
            record.linkedin_url(),
            Some("https://linkedin.com/company/acme")
        );
        assert_eq!(record.field(CanonicalField::Size), Some("10-50"));
    }

    #[test]
    fn test_row_missing_both_required_fields_rejected() {
        let data = dataset(
            &["Company Name", "Company Linkedin", "Website"],
            &[&["", "  ", "acme.com"]],
        );
        let out = normalizer().normalize(&data).unwrap();

        assert!(out.records.is_empty());
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].reason, RejectReason::MissingRequiredField);
        assert_eq!(out.rejected[0].row_index, 0);
        // original cells preserved for audit
        assert_eq!(out.rejected[0].source_fields[2].1, "acme.com");
    }

    #[test]
    fn test_row_with_one_required_field_kept() {
        let data = dataset(
            &["Company Name", "Company Linkedin"],
            &[&["Acme", ""]],
        );
        let out = normalizer().normalize(&data).unwrap();
        assert_eq!(out.records.len(), 1);
        assert!(out.records[0].linkedin_url().is_none());
    }

    #[test]
    fn test_unrecognized_header_fails_schema() {
        let data = dataset(&["Foo", "Bar"], &[&["a", "b"]]);
        let err = normalizer().normalize(&data).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn test_unmatched_columns_preserved_in_source_fields() {
        let data = dataset(
            &["Company Name", "Internal Notes"],
            &[&["Acme", "call back in Q3"]],
        );
        let out = normalizer().normalize(&data).unwrap();
        let record = &out.records[0];
        assert_eq!(record.fields.len(), 1);
        assert_eq!(
            record.source_fields[1],
            ("Internal Notes".to_string(), "call back in Q3".to_string())
        );
    }

    #[test]
    fn test_duplicate_alias_columns_first_wins() {
        let data = dataset(
            &["Company Name", "Company_Name"],
            &[&["Acme", "Acme Corp"]],
        );
        let out = normalizer().normalize(&data).unwrap();
        assert_eq!(out.records[0].company_name(), Some("Acme"));
    }

    #[test]
    fn test_output_order_matches_input_order() {
        let data = dataset(
            &["Company Name"],
            &[&["Acme"], &["Globex"], &["Initech"]],
        );
        let out = normalizer().normalize(&data).unwrap();
        let ids: Vec<usize> = out.records.iter().map(|r| r.record_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_blank_cells_are_absent_not_empty() {
        let data = dataset(&["Company Name", "Size"], &[&["Acme", "   "]]);
        let out = normalizer().normalize(&data).unwrap();
        assert!(!out.records[0].fields.contains_key(&CanonicalField::Size));
    }
}
