//! Command recovery pipeline
//!
//! Stages run in order and each runs at most once:
//!
//! 1. [`normalize`] strips fences, commentary, comments, trailing commas, smart quotes
//! 2. [`locate_object`] narrows to the first plausible object
//! 3. [`CleanCandidate::parse`] strict parse
//! 4. [`CleanCandidate::repair`] re-quotes tokens, then one more strict parse
//! 5. [`scan_fields`] per-field regex scan over the raw text
//!
//! The first stage that yields a mapping short-circuits the rest, and the
//! mapping goes through [`canonicalize`](crate::canonical::canonicalize).
//! Failures of stages 3 and 4 are logged and never surfaced.

pub mod locator;
pub mod normalizer;
pub mod parser;
pub mod scanner;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::canonicalize;
use crate::command::{ChartOperationCommand, FieldMapping};
use crate::error::RecoveryError;

pub use locator::locate_object;
pub use normalizer::normalize;
pub use parser::{parse_strict, repair_quotes, CleanCandidate, RepairedCandidate};
pub use scanner::scan_fields;

/// The stage whose mapping became the command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    StrictParse,
    RepairedParse,
    FieldScan,
}

impl fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryStage::StrictParse => "strict_parse",
            RecoveryStage::RepairedParse => "repaired_parse",
            RecoveryStage::FieldScan => "field_scan",
        };
        f.write_str(name)
    }
}

/// A validated command plus the stage that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recovery {
    pub command: ChartOperationCommand,
    pub stage: RecoveryStage,
}

/// Recover a validated command from a raw completion
pub fn recover(raw: &str) -> Result<Recovery, RecoveryError> {
    let (mapping, stage) = extract_mapping(raw).map_err(|err| {
        tracing::warn!(error = %err, "No command recovered from completion");
        err
    })?;

    let command = canonicalize(mapping).map_err(|violation| {
        tracing::warn!(%stage, %violation, "Recovered mapping failed validation");
        RecoveryError::from(violation)
    })?;

    tracing::info!(
        %stage,
        plot_name = command.plot_name(),
        operation = %command.operation(),
        "Recovered chart command"
    );

    Ok(Recovery { command, stage })
}

/// [`recover`] without the stage
pub fn recover_command(raw: &str) -> Result<ChartOperationCommand, RecoveryError> {
    recover(raw).map(|recovery| recovery.command)
}

/// Run stages 1-5 and return the first mapping found
pub fn extract_mapping(raw: &str) -> Result<(FieldMapping, RecoveryStage), RecoveryError> {
    let normalized = normalize(raw);
    let located = locate_object(&normalized);
    tracing::debug!(
        raw_len = raw.len(),
        candidate = located,
        "Normalized completion"
    );

    let candidate = CleanCandidate::new(located);
    match candidate.parse() {
        Ok(mapping) => return Ok((mapping, RecoveryStage::StrictParse)),
        Err(err) => tracing::debug!(error = %err, "Strict parse failed, repairing quotes"),
    }

    let repaired = candidate.repair();
    match repaired.parse() {
        Ok(mapping) => return Ok((mapping, RecoveryStage::RepairedParse)),
        Err(err) => tracing::debug!(
            error = %err,
            repaired = repaired.as_str(),
            "Repaired parse failed, scanning fields"
        ),
    }

    scan_fields(raw).map(|mapping| (mapping, RecoveryStage::FieldScan))
}
