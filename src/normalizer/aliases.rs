// file: src/normalizer/aliases.rs
// description: extensible header alias table mapping raw column names to canonical fields
// reference: configurable lookup table, first matching alias wins

use crate::config::Config;
use crate::error::Result;
use crate::models::CanonicalField;
use std::collections::HashMap;

/// Maps raw column headers onto canonical fields. Matching is
/// case-insensitive and whitespace-trimmed; once a normalized spelling is
/// registered it is never overwritten, so the first alias wins.
#[derive(Debug, Clone)]
pub struct AliasTable {
    lookup: HashMap<String, CanonicalField>,
}

const DEFAULT_ALIASES: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::CompanyName, &["Company Name", "Company_Name"]),
    (CanonicalField::LinkedinUrl, &["Company Linkedin", "LinkedIn_URL"]),
    (CanonicalField::Website, &["Website", "Company_Website"]),
    (CanonicalField::Size, &["Size"]),
    (CanonicalField::Revenue, &["Revenue"]),
    (CanonicalField::ZoominfoId, &["Zoominfo ID"]),
];

impl AliasTable {
    pub fn with_defaults() -> Self {
        let mut table = Self {
            lookup: HashMap::new(),
        };
        for (field, aliases) in DEFAULT_ALIASES {
            for alias in *aliases {
                table.register(*field, alias);
            }
        }
        table
    }

    /// Built-in table extended with the aliases from configuration.
    /// Configured aliases are added after the defaults, so they cannot
    /// shadow a built-in spelling.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut table = Self::with_defaults();
        for (name, aliases) in &config.aliases {
            // validated during Config::load; unknown names cannot reach here
            if let Some(field) = CanonicalField::parse(name) {
                for alias in aliases {
                    table.register(field, alias);
                }
            }
        }
        Ok(table)
    }

    pub fn register(&mut self, field: CanonicalField, alias: &str) {
        self.lookup
            .entry(Self::normalize_key(alias))
            .or_insert(field);
    }

    pub fn resolve(&self, raw_header: &str) -> Option<CanonicalField> {
        self.lookup.get(&Self::normalize_key(raw_header)).copied()
    }

    /// (canonical field, normalized alias) pairs, sorted for display.
    pub fn entries(&self) -> Vec<(CanonicalField, String)> {
        let mut entries: Vec<_> = self
            .lookup
            .iter()
            .map(|(alias, field)| (*field, alias.clone()))
            .collect();
        entries.sort();
        entries
    }

    fn normalize_key(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aliases_resolve() {
        let table = AliasTable::with_defaults();
        assert_eq!(
            table.resolve("Company Name"),
            Some(CanonicalField::CompanyName)
        );
        assert_eq!(
            table.resolve("LinkedIn_URL"),
            Some(CanonicalField::LinkedinUrl)
        );
        assert_eq!(table.resolve("Zoominfo ID"), Some(CanonicalField::ZoominfoId));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let table = AliasTable::with_defaults();
        assert_eq!(
            table.resolve("  COMPANY NAME  "),
            Some(CanonicalField::CompanyName)
        );
        assert_eq!(table.resolve("company_website"), Some(CanonicalField::Website));
    }

    #[test]
    fn test_unknown_header_unresolved() {
        let table = AliasTable::with_defaults();
        assert_eq!(table.resolve("Ticker"), None);
    }

    #[test]
    fn test_first_alias_wins() {
        let mut table = AliasTable::with_defaults();
        // an attempt to remap an existing spelling is ignored
        table.register(CanonicalField::Website, "Company Name");
        assert_eq!(
            table.resolve("Company Name"),
            Some(CanonicalField::CompanyName)
        );
    }

    #[test]
    fn test_config_aliases_extend_table() {
        let mut config = crate::config::Config::default_config();
        config
            .aliases
            .insert("company_name".to_string(), vec!["Account Name".to_string()]);
        let table = AliasTable::from_config(&config).unwrap();
        assert_eq!(
            table.resolve("account name"),
            Some(CanonicalField::CompanyName)
        );
    }
}
