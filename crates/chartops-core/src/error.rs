//! Error types for Chartops Core
//!
//! Every failure the recovery pipeline and the query resolver can report lives here.
//! Parse failures before canonicalization never leave the pipeline; only
//! [`RecoveryError`] and [`UnknownIdentifier`] are handed to callers.

use thiserror::Error;

use crate::insights::QueryIdentifier;

/// Result type alias for Chartops operations
pub type Result<T> = std::result::Result<T, ChartOpsError>;

/// Main error type for Chartops operations
#[derive(Error, Debug)]
pub enum ChartOpsError {
    /// No command could be recovered from a completion
    #[error("Recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    /// Token outside the query catalog
    #[error(transparent)]
    UnknownIdentifier(#[from] UnknownIdentifier),

    /// Query catalog could not be built or loaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<ChartOpsError>,
    },
}

/// Stage 3 failure. Swallowed by the pipeline, which escalates to the next stage.
#[derive(Error, Debug)]
pub enum StructuralParseError {
    #[error("malformed object: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("expected a single object, found {0}")]
    NotAnObject(&'static str),
}

/// Terminal failures of the command recovery pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    /// The field scanner could not find both `plotName` and `operation`
    #[error("Failed to parse a command from the completion (fields found: {found:?}; plotName and operation are required)")]
    FieldScanInsufficient { found: Vec<&'static str> },

    /// A mapping was recovered but it violates the command schema
    #[error("Invalid command: {0}")]
    Schema(#[from] SchemaViolation),
}

/// First schema rule a recovered mapping violated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Missing required field for create operation: xAxis or yAxis")]
    MissingPieAxis,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid plotType: {0}")]
    InvalidPlotType(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("xAxis and yAxis cannot be the same: {0}")]
    DuplicateAxis(String),
}

/// A token that is not one of the catalog's identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid query identifier: {token} (available: {})", join_identifiers(.valid))]
pub struct UnknownIdentifier {
    /// The normalized token that failed to resolve
    pub token: String,
    /// Every identifier the catalog knows, in catalog order
    pub valid: Vec<QueryIdentifier>,
}

/// Errors raised while building or loading a query catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog is missing identifier {0}")]
    MissingIdentifier(QueryIdentifier),

    #[error("Catalog defines identifier {0} more than once")]
    DuplicateIdentifier(QueryIdentifier),

    #[error("Catalog entry names an unknown identifier: {0}")]
    UnknownEntry(String),

    #[error("Malformed catalog file: {0}")]
    Toml(#[from] toml::de::Error),
}

fn join_identifiers(valid: &[QueryIdentifier]) -> String {
    valid
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ChartOpsError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ChartOpsError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().context(f()))
    }
}
