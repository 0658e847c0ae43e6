//! Chartops Agent - live generation in front of the recovery pipeline
//!
//! Builds prompts, calls an Ollama-compatible text-generation service under a
//! timeout and passes the completion to [`chartops_core`].
//!
//! ```no_run
//! use chartops_agent::{AgentConfig, CommandService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::default().with_env_overrides()?;
//! let service = CommandService::from_config(config)?;
//!
//! let outcome = service
//!     .generate_command("pie chart of GrossQuantity", &["flow_rate_chart".to_string()])
//!     .await?;
//! println!("{}", serde_json::to_string(&outcome.command)?);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod client;
pub mod config;
pub mod error;
pub mod prompts;
pub mod service;

pub use client::{OllamaClient, TextGenerator};
pub use config::{AgentConfig, GenerationSettings};
pub use error::{ConfigError, Result, ServiceError, UpstreamError};
pub use service::{CommandOutcome, CommandService, CommandSource, InsightOutcome};
