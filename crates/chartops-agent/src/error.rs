//! Error types for the agent

use std::path::PathBuf;

use chartops_core::{ChartOpsError, RecoveryError, UnknownIdentifier};
use thiserror::Error;

/// Failures talking to the text-generation service
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("Generation service returned an empty completion")]
    EmptyCompletion,

    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

impl From<serde_json::Error> for UpstreamError {
    fn from(e: serde_json::Error) -> Self {
        UpstreamError::MalformedBody(e.to_string())
    }
}

/// Errors surfaced by [`CommandService`](crate::CommandService)
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("Generation service unavailable: {0}")]
    UpstreamUnavailable(#[source] UpstreamError),

    #[error("{source}")]
    Recovery {
        source: RecoveryError,
        raw_response: String,
    },

    #[error("{source}")]
    UnknownIdentifier {
        source: UnknownIdentifier,
        raw_response: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceError {
    /// The completion that failed to recover or resolve, when there was one
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ServiceError::Recovery { raw_response, .. }
            | ServiceError::UnknownIdentifier { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Failed to load query catalog: {0}")]
    Catalog(#[from] ChartOpsError),
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chartops_core::SchemaViolation;

    #[test]
    fn test_recovery_error_keeps_raw_response() {
        let err = ServiceError::Recovery {
            source: RecoveryError::Schema(SchemaViolation::MissingField("size")),
            raw_response: "{\"plotName\":\"a\"}".to_string(),
        };

        assert_eq!(err.to_string(), "Invalid command: Missing required field: size");
        assert_eq!(err.raw_response(), Some("{\"plotName\":\"a\"}"));
        assert_eq!(ServiceError::EmptyQuery.raw_response(), None);
    }

    #[test]
    fn test_upstream_messages() {
        let err = ServiceError::UpstreamUnavailable(UpstreamError::Timeout(100));
        assert_eq!(
            err.to_string(),
            "Generation service unavailable: Generation timed out after 100s"
        );
    }
}
