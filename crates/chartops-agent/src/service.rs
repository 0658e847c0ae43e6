//! Timeout-bounded command service
//!
//! Calls the generator, then hands the completion to the core. When the
//! generator fails, times out or returns nothing, the core is never invoked.
//! A configured fallback command may stand in for a missing completion, but
//! never for one that failed to recover.

use std::sync::Arc;
use std::time::Duration;

use chartops_core::{
    recover, ChartOperationCommand, QueryCatalog, QueryIdentifier, RecoveryStage, ResolvedQuery,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{OllamaClient, TextGenerator};
use crate::config::{AgentConfig, GenerationSettings};
use crate::error::{ConfigError, Result, ServiceError, UpstreamError};
use crate::prompts;

/// Where a returned command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    Generated,
    Fallback,
}

/// Result of [`CommandService::generate_command`]
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub request_id: Uuid,
    pub query: String,
    pub command: ChartOperationCommand,
    /// `None` for fallback commands
    pub stage: Option<RecoveryStage>,
    pub source: CommandSource,
    /// `None` when the generator produced nothing
    pub raw_response: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Result of [`CommandService::resolve_insight`]
#[derive(Debug, Clone, Serialize)]
pub struct InsightOutcome {
    pub request_id: Uuid,
    pub query: String,
    pub identifier: QueryIdentifier,
    pub template: String,
    pub description: String,
}

/// Natural-language front end over the recovery pipeline and query catalog
#[derive(Debug, Clone)]
pub struct CommandService {
    generator: Arc<dyn TextGenerator>,
    config: AgentConfig,
    catalog: QueryCatalog,
}

impl CommandService {
    /// Service over `generator` with the built-in catalog
    pub fn new(generator: Arc<dyn TextGenerator>, config: AgentConfig) -> Self {
        Self {
            generator,
            config,
            catalog: QueryCatalog::terminal_analytics(),
        }
    }

    /// Service over an [`OllamaClient`] and the configured catalog
    pub fn from_config(config: AgentConfig) -> std::result::Result<Self, ConfigError> {
        let catalog = config.load_catalog()?;
        let generator = Arc::new(OllamaClient::from_config(&config));
        Ok(Self::new(generator, config).with_catalog(catalog))
    }

    pub fn with_catalog(mut self, catalog: QueryCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    /// Turn `query` into a validated chart command
    pub async fn generate_command(
        &self,
        query: &str,
        existing_charts: &[String],
    ) -> Result<CommandOutcome> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("generate_command", %request_id);

        async move {
            let query = non_blank(query)?;
            let prompt = prompts::chart_prompt(query, existing_charts);

            let raw = match self.complete(&prompt, &self.config.chart).await {
                Ok(raw) => raw,
                Err(err) => return self.fallback(request_id, query, err),
            };

            let recovery = recover(&raw).map_err(|source| ServiceError::Recovery {
                source,
                raw_response: raw.clone(),
            })?;

            Ok(CommandOutcome {
                request_id,
                query: query.to_string(),
                command: recovery.command,
                stage: Some(recovery.stage),
                source: CommandSource::Generated,
                raw_response: Some(raw),
                generated_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    /// Map `question` to one of the catalog's queries
    pub async fn resolve_insight(&self, question: &str) -> Result<InsightOutcome> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("resolve_insight", %request_id);

        async move {
            let query = non_blank(question)?;
            let prompt = prompts::insights_prompt(&self.catalog, query);

            let raw = self
                .complete(&prompt, &self.config.insights)
                .await
                .map_err(|err| {
                    tracing::warn!(error = %err, "Generation failed");
                    ServiceError::UpstreamUnavailable(err)
                })?;

            let resolved = self.catalog.resolve(&raw).map_err(|source| {
                tracing::warn!(token = %source.token, "Completion is not a known identifier");
                ServiceError::UnknownIdentifier {
                    source,
                    raw_response: raw.clone(),
                }
            })?;

            tracing::info!(identifier = %resolved.identifier, "Resolved insight query");

            Ok(InsightOutcome {
                request_id,
                query: query.to_string(),
                identifier: resolved.identifier,
                template: resolved.template.to_string(),
                description: resolved.description.to_string(),
            })
        }
        .instrument(span)
        .await
    }

    /// Every catalog entry, in catalog order
    pub fn list_queries(&self) -> Vec<ResolvedQuery<'_>> {
        self.catalog.iter().collect()
    }

    async fn complete(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> std::result::Result<String, UpstreamError> {
        let limit = Duration::from_secs(self.config.timeout_secs);
        let raw = tokio::time::timeout(limit, self.generator.generate(prompt, settings))
            .await
            .map_err(|_| UpstreamError::Timeout(self.config.timeout_secs))??;

        if raw.trim().is_empty() {
            return Err(UpstreamError::EmptyCompletion);
        }
        tracing::debug!(raw_len = raw.len(), "Received completion");
        Ok(raw)
    }

    fn fallback(&self, request_id: Uuid, query: &str, err: UpstreamError) -> Result<CommandOutcome> {
        match &self.config.fallback_command {
            Some(command) => {
                tracing::warn!(
                    error = %err,
                    plot_name = command.plot_name(),
                    "Generation failed, returning configured fallback command"
                );
                Ok(CommandOutcome {
                    request_id,
                    query: query.to_string(),
                    command: command.clone(),
                    stage: None,
                    source: CommandSource::Fallback,
                    raw_response: None,
                    generated_at: Utc::now(),
                })
            }
            None => {
                tracing::warn!(error = %err, "Generation failed");
                Err(ServiceError::UpstreamUnavailable(err))
            }
        }
    }
}

fn non_blank(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ServiceError::EmptyQuery);
    }
    Ok(query)
}
