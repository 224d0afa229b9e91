// file: src/models/record.rs
// description: canonical record models produced by normalization and merge
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized field name used internally regardless of input column naming.
///
/// The first six variants can be populated from input columns via the alias
/// table; `Industry` and `Description` only ever arrive from enrichment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    CompanyName,
    LinkedinUrl,
    Website,
    Size,
    Revenue,
    ZoominfoId,
    Industry,
    Description,
}

impl CanonicalField {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::CompanyName => "company_name",
            CanonicalField::LinkedinUrl => "linkedin_url",
            CanonicalField::Website => "website",
            CanonicalField::Size => "size",
            CanonicalField::Revenue => "revenue",
            CanonicalField::ZoominfoId => "zoominfo_id",
            CanonicalField::Industry => "industry",
            CanonicalField::Description => "description",
        }
    }

    /// Fields that may be mapped from input columns.
    pub const INPUT_FIELDS: [CanonicalField; 6] = [
        CanonicalField::CompanyName,
        CanonicalField::LinkedinUrl,
        CanonicalField::Website,
        CanonicalField::Size,
        CanonicalField::Revenue,
        CanonicalField::ZoominfoId,
    ];

    /// Fields where a successful scrape overrides the user-supplied value.
    pub const VOLATILE_FIELDS: [CanonicalField; 4] = [
        CanonicalField::Size,
        CanonicalField::Revenue,
        CanonicalField::Industry,
        CanonicalField::Description,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "company_name" => Some(CanonicalField::CompanyName),
            "linkedin_url" => Some(CanonicalField::LinkedinUrl),
            "website" => Some(CanonicalField::Website),
            "size" => Some(CanonicalField::Size),
            "revenue" => Some(CanonicalField::Revenue),
            "zoominfo_id" => Some(CanonicalField::ZoominfoId),
            "industry" => Some(CanonicalField::Industry),
            "description" => Some(CanonicalField::Description),
            _ => None,
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input row after normalization. `fields` holds only fields that
/// resolved to a non-empty value; `source_fields` keeps every original
/// column verbatim for audit and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub record_id: usize,
    pub fields: BTreeMap<CanonicalField, String>,
    pub source_fields: Vec<(String, String)>,
}

impl CanonicalRecord {
    pub fn field(&self, field: CanonicalField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.field(CanonicalField::CompanyName)
    }

    pub fn linkedin_url(&self) -> Option<&str> {
        self.field(CanonicalField::LinkedinUrl)
    }
}

/// Why a row was excluded from enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingRequiredField,
}

/// A row the normalizer refused to enrich. Reported alongside merged
/// results, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub row_index: usize,
    pub reason: RejectReason,
    pub source_fields: Vec<(String, String)>,
}

/// Final record handed to the persistence boundary: original fields combined
/// with the last enrichment result under the merge precedence rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub record_id: usize,
    pub fields: BTreeMap<CanonicalField, String>,
    pub source_fields: Vec<(String, String)>,
    pub enrichment_incomplete: bool,
    pub attempt_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}
