//! Stage 5: per-field extraction over the raw completion
//!
//! Last resort once both parses have failed. Runs on the original text, not the
//! cleaned candidate, so nothing the normalizer removed is lost.

use lazy_static::lazy_static;
use regex::Regex;

use crate::command::{
    FieldMapping, ALLOWED_FIELDS, OPERATION, PLOT_NAME, PLOT_TYPE, SIZE, X_AXIS, Y_AXIS,
};
use crate::error::RecoveryError;

lazy_static! {
    /// One pattern per allow-listed field, in scan order
    static ref FIELD_PATTERNS: Vec<(&'static str, Regex)> = vec![
        (PLOT_NAME, Regex::new(r#"(?i)plotName["']?\s*:\s*["']?([^",}\n]+)"#).unwrap()),
        (OPERATION, Regex::new(r#"(?i)operation["']?\s*:\s*["']?([^",}\n]+)"#).unwrap()),
        (PLOT_TYPE, Regex::new(r#"(?i)plotType["']?\s*:\s*["']?([^",}\n]+)"#).unwrap()),
        (SIZE, Regex::new(r#"(?i)size["']?\s*:\s*["']?([^",}\n]+)"#).unwrap()),
        (X_AXIS, Regex::new(r#"(?i)xAxis["']?\s*:\s*["']?([^",}\n]+)"#).unwrap()),
        (Y_AXIS, Regex::new(r#"(?i)yAxis["']?\s*:\s*["']?([^",}\n]+)"#).unwrap()),
    ];
}

/// Scan `raw` for each field independently.
///
/// Succeeds only when both `plotName` and `operation` are found; whatever else
/// was found rides along.
pub fn scan_fields(raw: &str) -> Result<FieldMapping, RecoveryError> {
    let mut mapping = FieldMapping::new();

    for (field, pattern) in FIELD_PATTERNS.iter() {
        let value = pattern
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| trim_value(m.as_str()))
            .filter(|value| !value.is_empty());

        if let Some(value) = value {
            mapping.insert(*field, value);
        }
    }

    if mapping.contains_key(PLOT_NAME) && mapping.contains_key(OPERATION) {
        Ok(mapping)
    } else {
        Err(RecoveryError::FieldScanInsufficient {
            found: ALLOWED_FIELDS
                .iter()
                .copied()
                .filter(|field| mapping.contains_key(field))
                .collect(),
        })
    }
}

fn trim_value(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string()
}
