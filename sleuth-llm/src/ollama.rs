use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sleuth_common::{Result, SleuthError};
use sleuth_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

/// Local generation is slow on CPU-only hosts.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const TAGS_TIMEOUT: Duration = Duration::from_secs(10);
const PULL_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Client for a local Ollama server (see https://github.com/ollama/ollama).
pub struct OllamaClient {
    client: HttpClient,
    model: String,
}

impl OllamaClient {
    /// Connect to `base_url`, pulling `model` if the server does not have it.
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let client = HttpClient::new(&base)
            .map_err(|e| SleuthError::Agent(format!("ollama: {e}")))?
            .with_timeout(GENERATE_TIMEOUT)
            .with_retries(0);
        let ollama = Self { client, model };

        let installed = ollama.installed_models().await?;
        if !installed.iter().any(|name| name == &ollama.model) {
            tracing::info!(model = %ollama.model, "model not installed, pulling");
            ollama.pull_model().await?;
        }
        Ok(ollama)
    }

    async fn installed_models(&self) -> Result<Vec<String>> {
        let opts = RequestOpts {
            timeout: Some(TAGS_TIMEOUT),
            retries: Some(0),
            ..Default::default()
        };
        let tags: TagsResponse = self
            .client
            .get_json("api/tags", opts)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "ollama tags request failed");
                SleuthError::Agent(OLLAMA_CONNECTION_ERROR.to_string())
            })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self) -> Result<()> {
        let request = PullRequest {
            model: &self.model,
            stream: false,
        };
        let opts = RequestOpts {
            timeout: Some(PULL_TIMEOUT),
            ..Default::default()
        };
        let reply: PullResponse = self
            .client
            .post_json_opts("api/pull", &request, opts)
            .await
            .map_err(|e| SleuthError::Agent(format!("ollama pull of {} failed: {e}", self.model)))?;
        tracing::info!(model = %self.model, status = %reply.status, "model pulled");
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system: system_prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };
        let reply: GenerateResponse = self
            .client
            .post_json("api/generate", None, &request)
            .await
            .map_err(http_to_sleuth)?;

        Ok(LlmResponse {
            text: reply.response,
            model: Some(self.model.clone()),
            tokens_used: reply.eval_count,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.installed_models().await.is_ok())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_sleuth(e: HttpError) -> SleuthError {
    SleuthError::Agent(format!("ollama: {e}"))
}
