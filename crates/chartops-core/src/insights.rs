//! Predefined analytical queries
//!
//! The upstream model is asked to answer with one of six identifiers. The
//! [`QueryCatalog`] binds each identifier to an immutable SQL template and a
//! description, and [`QueryCatalog::resolve`] maps a token to its entry without
//! ever guessing a closest match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{CatalogError, ResultExt, UnknownIdentifier};

/// The six query identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryIdentifier {
    DailyThroughputAnalysis,
    BayPerformanceComparison,
    FlowRatePerformanceAnalysis,
    ScheduleAdherenceAnalysis,
    ProductPortfolioPerformance,
    OperationalTimePatterns,
}

impl QueryIdentifier {
    /// Every identifier, in catalog order
    pub const ALL: [QueryIdentifier; 6] = [
        QueryIdentifier::DailyThroughputAnalysis,
        QueryIdentifier::BayPerformanceComparison,
        QueryIdentifier::FlowRatePerformanceAnalysis,
        QueryIdentifier::ScheduleAdherenceAnalysis,
        QueryIdentifier::ProductPortfolioPerformance,
        QueryIdentifier::OperationalTimePatterns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIdentifier::DailyThroughputAnalysis => "DAILY_THROUGHPUT_ANALYSIS",
            QueryIdentifier::BayPerformanceComparison => "BAY_PERFORMANCE_COMPARISON",
            QueryIdentifier::FlowRatePerformanceAnalysis => "FLOW_RATE_PERFORMANCE_ANALYSIS",
            QueryIdentifier::ScheduleAdherenceAnalysis => "SCHEDULE_ADHERENCE_ANALYSIS",
            QueryIdentifier::ProductPortfolioPerformance => "PRODUCT_PORTFOLIO_PERFORMANCE",
            QueryIdentifier::OperationalTimePatterns => "OPERATIONAL_TIME_PATTERNS",
        }
    }
}

impl FromStr for QueryIdentifier {
    type Err = ();

    /// Exact, case-sensitive match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryIdentifier::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for QueryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template text and description bound to one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub template: String,
    pub description: String,
}

impl QueryTemplate {
    pub fn new(template: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            description: description.into(),
        }
    }
}

/// A successful resolution; template and description are returned as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedQuery<'a> {
    pub identifier: QueryIdentifier,
    pub template: &'a str,
    pub description: &'a str,
}

/// Immutable mapping from every [`QueryIdentifier`] to its [`QueryTemplate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCatalog {
    entries: BTreeMap<QueryIdentifier, QueryTemplate>,
}

#[derive(Deserialize)]
struct CatalogFile {
    queries: Vec<CatalogFileEntry>,
}

#[derive(Deserialize)]
struct CatalogFileEntry {
    identifier: String,
    description: String,
    template: String,
}

impl QueryCatalog {
    /// Build a catalog; every identifier must appear exactly once
    pub fn new(
        entries: impl IntoIterator<Item = (QueryIdentifier, QueryTemplate)>,
    ) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for (identifier, template) in entries {
            if map.insert(identifier, template).is_some() {
                return Err(CatalogError::DuplicateIdentifier(identifier));
            }
        }

        if let Some(missing) = QueryIdentifier::ALL
            .iter()
            .find(|id| !map.contains_key(*id))
        {
            return Err(CatalogError::MissingIdentifier(*missing));
        }

        Ok(Self { entries: map })
    }

    /// Parse a catalog from `[[queries]]` tables
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        let entries = file
            .queries
            .into_iter()
            .map(|entry| {
                let identifier = entry
                    .identifier
                    .parse::<QueryIdentifier>()
                    .map_err(|_| CatalogError::UnknownEntry(entry.identifier.clone()))?;
                Ok((identifier, QueryTemplate::new(entry.template, entry.description)))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Self::new(entries)
    }

    /// Load a catalog file from disk
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading query catalog {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing query catalog {}", path.display()))
    }

    /// The bulk-liquid terminal analytics catalog
    pub fn terminal_analytics() -> Self {
        Self {
            entries: builtin::ENTRIES
                .iter()
                .map(|(id, template, description)| (*id, QueryTemplate::new(*template, *description)))
                .collect(),
        }
    }

    /// Normalize `token` to upper case and look it up
    pub fn resolve(&self, token: &str) -> Result<ResolvedQuery<'_>, UnknownIdentifier> {
        let normalized = token.trim().to_uppercase();

        normalized
            .parse::<QueryIdentifier>()
            .ok()
            .and_then(|identifier| {
                self.entries.get(&identifier).map(|entry| ResolvedQuery {
                    identifier,
                    template: &entry.template,
                    description: &entry.description,
                })
            })
            .ok_or_else(|| UnknownIdentifier {
                token: normalized,
                valid: self.identifiers().collect(),
            })
    }

    pub fn get(&self, identifier: QueryIdentifier) -> Option<&QueryTemplate> {
        self.entries.get(&identifier)
    }

    /// Identifiers in catalog order
    pub fn identifiers(&self) -> impl Iterator<Item = QueryIdentifier> + '_ {
        self.entries.keys().copied()
    }

    /// All entries in catalog order
    pub fn iter(&self) -> impl Iterator<Item = ResolvedQuery<'_>> {
        self.entries.iter().map(|(identifier, entry)| ResolvedQuery {
            identifier: *identifier,
            template: &entry.template,
            description: &entry.description,
        })
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::terminal_analytics()
    }
}

mod builtin {
    use super::QueryIdentifier;

    pub(super) const ENTRIES: [(QueryIdentifier, &str, &str); 6] = [
        (
            QueryIdentifier::DailyThroughputAnalysis,
            "-- Daily throughput trends
SELECT
  CAST(STRPTIME(ScheduledDate, '%m/%d/%Y %H:%M:%S') AS DATE) AS operation_date,
  COUNT(*) AS total_shipments,
  SUM(GrossQuantity) AS daily_volume,
  AVG(FlowRate) AS avg_flow_rate,
  AVG(GrossQuantity) AS avg_shipment_size
FROM shipments
GROUP BY operation_date
ORDER BY operation_date",
            "Track overall terminal productivity, identify peak/low activity periods, and monitor capacity utilization trends",
        ),
        (
            QueryIdentifier::BayPerformanceComparison,
            "-- Bay performance comparison
SELECT
  BayCode,
  COUNT(*) AS total_operations,
  AVG(GrossQuantity) AS avg_volume_per_operation,
  AVG(FlowRate) AS avg_flow_rate,
  SUM(GrossQuantity) AS total_volume_handled
FROM shipments
GROUP BY BayCode
ORDER BY total_volume_handled DESC",
            "Identify high-performing vs. underperforming bays, optimize resource allocation, and detect equipment maintenance needs",
        ),
        (
            QueryIdentifier::FlowRatePerformanceAnalysis,
            "-- Flow rate performance by product and bay
SELECT
  BayCode,
  BaseProductCode,
  AVG(FlowRate) AS avg_flow_rate,
  MIN(FlowRate) AS min_flow_rate,
  MAX(FlowRate) AS max_flow_rate,
  STDDEV_POP(FlowRate) AS flow_rate_variance,
  COUNT(*) AS operations_count
FROM shipments
GROUP BY BayCode, BaseProductCode
HAVING COUNT(*) >= 5",
            "Optimize equipment efficiency, identify technical issues, and benchmark performance across different product types and bays",
        ),
        (
            QueryIdentifier::ScheduleAdherenceAnalysis,
            "-- Schedule vs actual performance analysis
SELECT
  CAST(STRPTIME(ScheduledDate, '%m/%d/%Y %H:%M:%S') AS DATE) AS scheduled_date,
  COUNT(*) AS total_shipments,
  AVG(EXTRACT(epoch FROM (STRPTIME(ExitTime, '%m/%d/%Y %H:%M:%S') - STRPTIME(ScheduledDate, '%m/%d/%Y %H:%M:%S'))) / 3600) AS avg_duration_hours,
  COUNT(CASE WHEN STRPTIME(ExitTime, '%m/%d/%Y %H:%M:%S') > STRPTIME(ScheduledDate, '%m/%d/%Y %H:%M:%S') + INTERVAL '2 hours' THEN 1 END) AS delayed_operations
FROM shipments
WHERE ExitTime IS NOT NULL
GROUP BY scheduled_date
ORDER BY scheduled_date",
            "Monitor operational efficiency, identify scheduling bottlenecks, and improve customer service by reducing delays",
        ),
        (
            QueryIdentifier::ProductPortfolioPerformance,
            "-- Product performance analysis
SELECT
  BaseProductCode,
  COUNT(*) AS shipment_frequency,
  SUM(GrossQuantity) AS total_volume,
  AVG(GrossQuantity) AS avg_shipment_size,
  AVG(FlowRate) AS avg_processing_rate,
  100.0 * SUM(GrossQuantity) / SUM(SUM(GrossQuantity)) OVER () AS volume_percentage
FROM shipments
GROUP BY BaseProductCode
ORDER BY total_volume DESC",
            "Analyze product mix profitability, identify high-volume vs. specialty products, and optimize terminal configuration",
        ),
        (
            QueryIdentifier::OperationalTimePatterns,
            "-- Hourly, daily, weekly patterns
SELECT
  EXTRACT(hour FROM STRPTIME(ScheduledDate, '%m/%d/%Y %H:%M:%S')) AS hour_of_day,
  EXTRACT(dow FROM STRPTIME(ScheduledDate, '%m/%d/%Y %H:%M:%S')) AS day_of_week,
  COUNT(*) AS operation_count,
  AVG(GrossQuantity) AS avg_volume,
  AVG(FlowRate) AS avg_flow_rate
FROM shipments
GROUP BY hour_of_day, day_of_week
ORDER BY hour_of_day, day_of_week",
            "Identify optimal operating hours, plan staffing schedules, and discover seasonal or weekly trends for capacity planning",
        ),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let catalog = QueryCatalog::terminal_analytics();
        let resolved = catalog.resolve("  bay_performance_comparison\n").unwrap();

        assert_eq!(resolved.identifier, QueryIdentifier::BayPerformanceComparison);
        assert!(resolved.template.contains("GROUP BY BayCode"));
    }

    #[test]
    fn test_unknown_token_lists_all_identifiers() {
        let catalog = QueryCatalog::terminal_analytics();
        let err = catalog.resolve("throughput").unwrap_err();

        assert_eq!(err.token, "THROUGHPUT");
        assert_eq!(err.valid, QueryIdentifier::ALL.to_vec());
    }

    #[test]
    fn test_no_closest_match_guessing() {
        let catalog = QueryCatalog::terminal_analytics();
        assert!(catalog.resolve("DAILY_THROUGHPUT").is_err());
        assert!(catalog.resolve("DAILY THROUGHPUT ANALYSIS").is_err());
    }

    #[test]
    fn test_new_requires_every_identifier() {
        let all = QueryIdentifier::ALL;
        let partial = all[..5]
            .iter()
            .map(|id| (*id, QueryTemplate::new("SELECT 1", "one")));

        assert!(matches!(
            QueryCatalog::new(partial),
            Err(CatalogError::MissingIdentifier(
                QueryIdentifier::OperationalTimePatterns
            ))
        ));
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let all = QueryIdentifier::ALL;
        let doubled = all
            .iter()
            .chain(std::iter::once(&QueryIdentifier::DailyThroughputAnalysis))
            .map(|id| (*id, QueryTemplate::new("SELECT 1", "one")));

        assert!(matches!(
            QueryCatalog::new(doubled),
            Err(CatalogError::DuplicateIdentifier(
                QueryIdentifier::DailyThroughputAnalysis
            ))
        ));
    }

    fn catalog_toml() -> String {
        let mut content = String::new();
        for id in QueryIdentifier::ALL {
            content.push_str(&format!(
                "[[queries]]\nidentifier = \"{}\"\ndescription = \"about {}\"\ntemplate = \"SELECT '{}'\"\n\n",
                id, id, id
            ));
        }
        content
    }

    #[test]
    fn test_from_toml_str() {
        let catalog = QueryCatalog::from_toml_str(&catalog_toml()).unwrap();
        let resolved = catalog.resolve("operational_time_patterns").unwrap();
        assert_eq!(resolved.template, "SELECT 'OPERATIONAL_TIME_PATTERNS'");
        assert_eq!(resolved.description, "about OPERATIONAL_TIME_PATTERNS");
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_entry() {
        let content = "[[queries]]\nidentifier = \"REVENUE\"\ndescription = \"d\"\ntemplate = \"t\"\n";
        assert!(matches!(
            QueryCatalog::from_toml_str(content),
            Err(CatalogError::UnknownEntry(name)) if name == "REVENUE"
        ));
    }

    #[test]
    fn test_iter_follows_catalog_order() {
        let catalog = QueryCatalog::default();
        let order: Vec<_> = catalog.iter().map(|q| q.identifier).collect();
        assert_eq!(order, QueryIdentifier::ALL.to_vec());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.toml");
        std::fs::write(&path, catalog_toml()).unwrap();

        let catalog = QueryCatalog::from_file(&path).unwrap();
        assert_eq!(
            catalog.resolve("DAILY_THROUGHPUT_ANALYSIS").unwrap().template,
            "SELECT 'DAILY_THROUGHPUT_ANALYSIS'"
        );
    }

    #[test]
    fn test_from_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        let message = QueryCatalog::from_file(&missing).unwrap_err().to_string();
        assert!(message.starts_with(&format!("reading query catalog {}: IO error", missing.display())));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[[queries]]\nidentifier = 1\n").unwrap();
        let message = QueryCatalog::from_file(&broken).unwrap_err().to_string();
        assert!(message.starts_with(&format!("parsing query catalog {}: Catalog error", broken.display())));
    }
}
