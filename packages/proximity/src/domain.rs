//! Category cap table: per-domain classification priorities and quotas.
//!
//! Each domain (services, transportation, parks, ...) is defined in a TOML
//! file under `domains/`. The defaults are embedded at compile time and
//! exposed via [`CategoryCapTable::embedded`]. Deployments that need
//! different quotas or keywords load a replacement table with
//! [`CategoryCapTable::load`] without touching the ranking code.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quota applied when a domain does not set one.
pub const DEFAULT_QUOTA: usize = 4;

/// Number of provider results considered when a domain does not set one.
pub const DEFAULT_MAX_CANDIDATES: usize = 20;

/// Errors from loading or validating a category cap table.
#[derive(Debug, Error)]
pub enum DomainConfigError {
    /// Reading the table file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table is not valid TOML or does not match the schema.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A domain parsed but violates a table rule.
    #[error("Invalid domain '{domain}': {message}")]
    Invalid {
        /// Offending domain id.
        domain: String,
        /// What is wrong with it.
        message: String,
    },
}

/// One `keyword -> category` rule. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    /// Raw provider tag to look for.
    pub keyword: String,
    /// Canonical category assigned when the keyword is present.
    pub category: String,
}

impl PriorityEntry {
    /// Creates a rule.
    #[must_use]
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: category.into(),
        }
    }
}

/// A logical group of categories queried and ranked together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Unique identifier (e.g., `"transportation"`), also the report key.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Category filter sent to the places provider (`|`-separated types).
    pub filter: String,
    /// Maximum records admitted per canonical category.
    #[serde(default = "default_quota")]
    pub quota: usize,
    /// Admit at most one candidate per name.
    #[serde(default)]
    pub dedupe_by_name: bool,
    /// Only this many leading provider results are considered.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Ordered classification rules.
    pub priority: Vec<PriorityEntry>,
}

const fn default_quota() -> usize {
    DEFAULT_QUOTA
}

const fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

impl DomainConfig {
    /// Creates a domain with default quota and candidate limit and no
    /// deduplication.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        filter: impl Into<String>,
        priority: Vec<PriorityEntry>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            filter: filter.into(),
            quota: DEFAULT_QUOTA,
            dedupe_by_name: false,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            priority,
        }
    }

    /// Returns the domain with a different per-category quota.
    #[must_use]
    pub const fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }

    /// Returns the domain with a different candidate prefix length.
    #[must_use]
    pub const fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    fn validate(&self) -> Result<(), DomainConfigError> {
        let invalid = |message: &str| DomainConfigError::Invalid {
            domain: self.id.clone(),
            message: message.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("empty id"));
        }
        if self.quota == 0 {
            return Err(invalid("quota must be at least 1"));
        }
        if self.max_candidates == 0 {
            return Err(invalid("max_candidates must be at least 1"));
        }
        if self.priority.is_empty() {
            return Err(invalid("priority list is empty"));
        }
        if self
            .priority
            .iter()
            .any(|p| p.keyword.is_empty() || p.category.is_empty())
        {
            return Err(invalid("priority entry with empty keyword or category"));
        }
        Ok(())
    }
}

/// The full set of domains, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCapTable {
    domains: Vec<DomainConfig>,
}

/// On-disk layout of an external table: a `[[domains]]` array.
#[derive(Deserialize)]
struct TableFile {
    domains: Vec<DomainConfig>,
}

// ── Compile-time embedded TOML files ────────────────────────────────

const DOMAIN_TOMLS: &[(&str, &str)] = &[
    ("services", include_str!("../domains/services.toml")),
    ("transportation", include_str!("../domains/transportation.toml")),
    ("parks", include_str!("../domains/parks.toml")),
    ("entertainment", include_str!("../domains/entertainment.toml")),
    ("emergency", include_str!("../domains/emergency.toml")),
];

impl CategoryCapTable {
    /// Builds a table from domains, validating each and rejecting duplicate
    /// ids.
    ///
    /// # Errors
    ///
    /// Returns [`DomainConfigError::Invalid`] for the first domain that
    /// breaks a rule.
    pub fn new(domains: Vec<DomainConfig>) -> Result<Self, DomainConfigError> {
        let mut seen = BTreeSet::new();
        for domain in &domains {
            domain.validate()?;
            if !seen.insert(domain.id.as_str()) {
                return Err(DomainConfigError::Invalid {
                    domain: domain.id.clone(),
                    message: "duplicate domain id".to_string(),
                });
            }
        }
        Ok(Self { domains })
    }

    /// The default table compiled into the binary.
    ///
    /// # Panics
    ///
    /// Panics if any embedded TOML is malformed (this is a compile-time
    /// guarantee since the files ship with the crate).
    #[must_use]
    pub fn embedded() -> Self {
        let domains = DOMAIN_TOMLS
            .iter()
            .map(|(name, toml_str)| {
                toml::de::from_str(toml_str)
                    .unwrap_or_else(|e| panic!("Failed to parse domain '{name}': {e}"))
            })
            .collect();
        Self::new(domains).unwrap_or_else(|e| panic!("Embedded domain table is invalid: {e}"))
    }

    /// Parses a table from a TOML document with a `[[domains]]` array.
    ///
    /// # Errors
    ///
    /// Returns [`DomainConfigError`] if the TOML is malformed or a domain
    /// is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, DomainConfigError> {
        let file: TableFile = toml::de::from_str(s)?;
        Self::new(file.domains)
    }

    /// Reads and parses a table file.
    ///
    /// # Errors
    ///
    /// Returns [`DomainConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DomainConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded {} domains from {}",
            table.domains.len(),
            path.display()
        );
        Ok(table)
    }

    /// Looks up a domain by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.id == id)
    }

    /// All domains, in display order.
    #[must_use]
    pub fn domains(&self) -> &[DomainConfig] {
        &self.domains
    }

    /// Domain ids, in display order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|d| d.id.as_str())
    }
}

impl Default for CategoryCapTable {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_embedded_domains() {
        let table = CategoryCapTable::embedded();
        let ids: Vec<&str> = table.ids().collect();
        assert_eq!(
            ids,
            ["services", "transportation", "parks", "entertainment", "emergency"]
        );
    }

    #[test]
    fn embedded_quotas_and_flags() {
        let table = CategoryCapTable::embedded();
        assert_eq!(table.get("entertainment").unwrap().quota, 3);
        assert_eq!(table.get("services").unwrap().quota, DEFAULT_QUOTA);
        assert!(table.get("transportation").unwrap().dedupe_by_name);
        assert!(!table.get("emergency").unwrap().dedupe_by_name);
        for domain in table.domains() {
            assert_eq!(domain.max_candidates, DEFAULT_MAX_CANDIDATES);
            assert!(!domain.filter.is_empty(), "{} has empty filter", domain.id);
        }
    }

    #[test]
    fn emergency_priority_order() {
        let table = CategoryCapTable::embedded();
        let categories: Vec<&str> = table
            .get("emergency")
            .unwrap()
            .priority
            .iter()
            .map(|p| p.category.as_str())
            .collect();
        assert_eq!(categories, ["hospital", "fire_station", "police"]);
    }

    #[test]
    fn every_filter_type_has_a_priority_rule() {
        for domain in CategoryCapTable::embedded().domains() {
            for tag in domain.filter.split('|') {
                assert!(
                    domain.priority.iter().any(|p| p.keyword == tag),
                    "{}: filter type {tag} has no priority entry",
                    domain.id
                );
            }
        }
    }

    #[test]
    fn parses_external_table() {
        let table = CategoryCapTable::from_toml_str(
            r#"
            [[domains]]
            id = "food"
            name = "Food"
            filter = "restaurant|cafe"
            quota = 2

            [[domains.priority]]
            keyword = "cafe"
            category = "coffee"

            [[domains.priority]]
            keyword = "restaurant"
            category = "restaurant"
            "#,
        )
        .unwrap();

        let food = table.get("food").unwrap();
        assert_eq!(food.quota, 2);
        assert!(!food.dedupe_by_name);
        assert_eq!(food.max_candidates, DEFAULT_MAX_CANDIDATES);
        assert_eq!(food.priority[0], PriorityEntry::new("cafe", "coffee"));
    }

    #[test]
    fn rejects_zero_quota() {
        let err = CategoryCapTable::new(vec![
            DomainConfig::new("parks", "park", vec![PriorityEntry::new("park", "park")])
                .with_quota(0),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainConfigError::Invalid { ref domain, .. } if domain == "parks"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let parks = DomainConfig::new("parks", "park", vec![PriorityEntry::new("park", "park")]);
        let err = CategoryCapTable::new(vec![parks.clone(), parks]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_empty_priority() {
        assert!(CategoryCapTable::new(vec![DomainConfig::new("parks", "park", vec![])]).is_err());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            CategoryCapTable::from_toml_str("domains = 3"),
            Err(DomainConfigError::Toml(_))
        ));
    }
}
