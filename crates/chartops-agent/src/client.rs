//! Text-generation clients

use serde::{Deserialize, Serialize};

use crate::config::{AgentConfig, GenerationSettings};
use crate::error::UpstreamError;

/// Anything that turns a prompt into a completion
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generate a completion for `prompt`. The text is returned as received.
    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, UpstreamError>;
}

/// Client for an Ollama-compatible `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.base_url.clone(), config.model.clone())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Names of the models the service has pulled
    pub async fn list_models(&self) -> Result<Vec<String>, UpstreamError> {
        let response = self.http_client.get(self.endpoint("/api/tags")).send().await?;
        let body = read_success(response).await?;
        let tags: TagsResponse = serde_json::from_str(&body)?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

async fn read_success(response: reqwest::Response) -> Result<String, UpstreamError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[async_trait::async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, UpstreamError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_tokens: settings.max_tokens,
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let response = self
            .http_client
            .post(self.endpoint("/api/generate"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;
        let body = read_success(response).await?;
        let completion: GenerateResponse = serde_json::from_str(&body)?;

        tracing::debug!(completion_len = completion.response.len(), "Completion received");
        Ok(completion.response)
    }
}
