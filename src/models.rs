//! Row types for the staging tables.
//!
//! Each struct maps to one table in the `raw` schema through
//! [`TableRow`]. Column names follow the tables the downstream models
//! already read from, which is why the trends table calls its first column
//! `phishing_method`.

use crate::dimensions::UrlFeatures;
use crate::warehouse::{Cell, Column, ColumnType, TableRow};
use clap::ValueEnum;
use std::fmt;

/// Verdict stored in `phishing_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum PhishingStatus {
    /// Phishing (Verified)
    #[value(name = "verified")]
    Verified,
    /// Phishing (Unverified)
    #[value(name = "unverified")]
    Unverified,
    /// Unknown (Not in Database)
    #[value(name = "unknown")]
    NotInDatabase,
    /// Not Phishing
    #[value(name = "not-phishing")]
    NotPhishing,
}

impl PhishingStatus {
    pub fn label(self) -> &'static str {
        match self {
            PhishingStatus::Verified => "Phishing (Verified)",
            PhishingStatus::Unverified => "Phishing (Unverified)",
            PhishingStatus::NotInDatabase => "Unknown (Not in Database)",
            PhishingStatus::NotPhishing => "Not Phishing",
        }
    }
}

impl fmt::Display for PhishingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A phishing method and its description from the report's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhishingTrend {
    pub method: String,
    pub description: String,
}

impl TableRow for PhishingTrend {
    const TABLE: &'static str = "phishing_trends";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("phishing_method", ColumnType::Text),
            Column::new("description", ColumnType::Text),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.method.clone()),
            Cell::Text(self.description.clone()),
        ]
    }
}

/// A report section whose heading mentions AI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiMention {
    pub section_title: String,
    pub summary: String,
}

impl TableRow for AiMention {
    const TABLE: &'static str = "phishing_ai_mentions";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("section_title", ColumnType::Text),
            Column::new("summary", ColumnType::Text),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.section_title.clone()),
            Cell::Text(self.summary.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandImpersonation {
    pub brand: String,
    pub description: String,
}

impl TableRow for BrandImpersonation {
    const TABLE: &'static str = "brand_impersonation";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("brand", ColumnType::Text),
            Column::new("description", ColumnType::Text),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.brand.clone()),
            Cell::Text(self.description.clone()),
        ]
    }
}

/// A PhishTank verdict for one URL, without dimension keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhishtankResult {
    pub url: String,
    pub in_database: bool,
    pub phishing_status: PhishingStatus,
    pub timestamp: String,
}

impl TableRow for PhishtankResult {
    const TABLE: &'static str = "phishtank_results";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("url", ColumnType::Text),
            Column::new("in_database", ColumnType::Boolean),
            Column::new("phishing_status", ColumnType::Text),
            Column::new("timestamp", ColumnType::Text),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.url.clone()),
            Cell::Bool(self.in_database),
            Cell::Text(self.phishing_status.label().to_string()),
            Cell::Text(self.timestamp.clone()),
        ]
    }
}

/// A PhishTank verdict referencing its domain and feature dimension rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactPhishingUrl {
    pub url: String,
    pub in_database: bool,
    pub phishing_status: PhishingStatus,
    pub timestamp: String,
    pub domain_id: i64,
    pub feature_id: i64,
}

impl FactPhishingUrl {
    pub fn from_result(result: PhishtankResult, domain_id: i64, feature_id: i64) -> Self {
        Self {
            url: result.url,
            in_database: result.in_database,
            phishing_status: result.phishing_status,
            timestamp: result.timestamp,
            domain_id,
            feature_id,
        }
    }
}

impl TableRow for FactPhishingUrl {
    const TABLE: &'static str = "fact_phishing_urls";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("url", ColumnType::Text),
            Column::new("in_database", ColumnType::Boolean),
            Column::new("phishing_status", ColumnType::Text),
            Column::new("timestamp", ColumnType::Text),
            Column::new("domain_id", ColumnType::BigInt),
            Column::new("feature_id", ColumnType::BigInt),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.url.clone()),
            Cell::Bool(self.in_database),
            Cell::Text(self.phishing_status.label().to_string()),
            Cell::Text(self.timestamp.clone()),
            Cell::Int(self.domain_id),
            Cell::Int(self.feature_id),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRow {
    pub domain_id: i64,
    pub domain_name: String,
}

impl TableRow for DomainRow {
    const TABLE: &'static str = "dim_domains";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("domain_id", ColumnType::BigInt),
            Column::new("domain_name", ColumnType::Text),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.domain_id),
            Cell::Text(self.domain_name.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub feature_id: i64,
    pub features: UrlFeatures,
}

impl TableRow for FeatureRow {
    const TABLE: &'static str = "dim_url_features";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("feature_id", ColumnType::BigInt),
            Column::new("uses_https", ColumnType::Boolean),
            Column::new("has_ip_address", ColumnType::Boolean),
            Column::new("url_length", ColumnType::BigInt),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.feature_id),
            Cell::Bool(self.features.uses_https),
            Cell::Bool(self.features.has_ip_address),
            Cell::Int(self.features.url_length),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(PhishingStatus::Verified.to_string(), "Phishing (Verified)");
        assert_eq!(PhishingStatus::Unverified.to_string(), "Phishing (Unverified)");
        assert_eq!(
            PhishingStatus::NotInDatabase.to_string(),
            "Unknown (Not in Database)"
        );
        assert_eq!(PhishingStatus::NotPhishing.to_string(), "Not Phishing");
    }

    #[test]
    fn test_status_value_names() {
        let parsed = PhishingStatus::from_str("not-phishing", false).unwrap();
        assert_eq!(parsed, PhishingStatus::NotPhishing);
        let parsed = PhishingStatus::from_str("unknown", false).unwrap();
        assert_eq!(parsed, PhishingStatus::NotInDatabase);
    }

    #[test]
    fn test_cells_match_columns() {
        let fact = FactPhishingUrl {
            url: "http://example.com".to_string(),
            in_database: true,
            phishing_status: PhishingStatus::Verified,
            timestamp: "T".to_string(),
            domain_id: 3,
            feature_id: 9,
        };
        assert_eq!(fact.cells().len(), FactPhishingUrl::columns().len());
        assert_eq!(fact.cells()[2], Cell::Text("Phishing (Verified)".to_string()));

        let feature = FeatureRow {
            feature_id: 1,
            features: UrlFeatures {
                uses_https: true,
                has_ip_address: false,
                url_length: 20,
            },
        };
        assert_eq!(feature.cells().len(), FeatureRow::columns().len());
    }

    #[test]
    fn test_trend_column_names() {
        let names: Vec<_> = PhishingTrend::columns().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["phishing_method", "description"]);
    }

    #[test]
    fn test_fact_from_result() {
        let result = PhishtankResult {
            url: "http://example.com".to_string(),
            in_database: false,
            phishing_status: PhishingStatus::NotInDatabase,
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
        };
        let fact = FactPhishingUrl::from_result(result, 4, 2);
        assert_eq!(fact.domain_id, 4);
        assert_eq!(fact.feature_id, 2);
        assert_eq!(fact.phishing_status, PhishingStatus::NotInDatabase);
    }
}
