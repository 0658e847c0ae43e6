//! Chartops Core - recovery of validated chart commands from noisy LLM output
//!
//! An upstream text-generation model is asked for a chart-operation command
//! (or for one of a handful of query identifiers) and answers with free text
//! that may be fenced, prefixed with commentary, commented, trailing-comma'd,
//! smart-quoted, unquoted or truncated. This crate turns that text into a
//! [`ChartOperationCommand`] that satisfies the schema, or fails with a single
//! explicit reason.
//!
//! # Architecture
//!
//! 1. **Recovery** (`recovery`): normalize, locate, strict parse, repair once, field scan
//! 2. **Canonicalization** (`canonical`): lower-casing, allow-list, delete pruning, validation
//! 3. **Insights** (`insights`): identifier resolution against the query catalog
//!
//! Everything here is a pure, synchronous function of its input. No state is
//! shared between invocations, so callers may run them in parallel freely.
//!
//! # Quick Start
//!
//! ```
//! use chartops_core::{recover, Operation, RecoveryStage};
//!
//! let raw = "Here is the JSON:\n```json\n{\"plotName\": \"flow_rate_chart\", \"operation\": \"delete\",}\n```";
//! let recovery = recover(raw).unwrap();
//!
//! assert_eq!(recovery.stage, RecoveryStage::StrictParse);
//! assert_eq!(recovery.command.plot_name(), "flow_rate_chart");
//! assert_eq!(recovery.command.operation(), Operation::Delete);
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod canonical;
pub mod command;
pub mod error;
pub mod insights;
pub mod recovery;

pub use canonical::canonicalize;
pub use command::{ChartOperationCommand, ChartSize, FieldMapping, Operation, PlotType};
pub use error::{
    CatalogError, ChartOpsError, RecoveryError, Result, ResultExt, SchemaViolation,
    StructuralParseError, UnknownIdentifier,
};
pub use insights::{QueryCatalog, QueryIdentifier, QueryTemplate, ResolvedQuery};
pub use recovery::{recover, recover_command, Recovery, RecoveryStage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
