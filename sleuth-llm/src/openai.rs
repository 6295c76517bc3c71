use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sleuth_common::{Result, SleuthError};
use sleuth_http::{HttpClient, HttpError};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// A full page of context can take a while to answer.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

const DEFAULT_INSTRUCTIONS: &str = "You are a careful assistant that answers strictly from the provided material.";

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ResponsesApiRequest<'a> {
    model: &'a str,
    input: &'a str,
    instructions: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    model: String,
    #[serde(default)]
    output: Vec<ResponseMessage>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// One element in the `output` array
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ResponseContent>,
}

/// One part of the message `content`
#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI endpoint.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(api_key, model, OPENAI_API_BASE)
    }

    /// Create a client against an OpenAI-compatible gateway.
    pub fn with_base_url(api_key: String, model: String, base_url: &str) -> Result<Self> {
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        // Generation is billed per attempt; failures go straight to the caller.
        let client = HttpClient::new(&base)
            .map_err(|e| SleuthError::Agent(format!("HttpClient init failed: {e}")))?
            .with_timeout(GENERATE_TIMEOUT)
            .with_retries(0);

        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let req = ResponsesApiRequest {
            model: &self.model,
            input: prompt,
            instructions: system_prompt.unwrap_or(DEFAULT_INSTRUCTIONS),
            max_output_tokens: max_tokens,
            temperature,
        };

        let resp: ResponsesApiResponse = self
            .client
            .post_json("responses", Some(&self.api_key), &req)
            .await
            .map_err(http_to_sleuth)?;

        let text = resp
            .output
            .iter()
            .flat_map(|msg| &msg.content)
            .find(|c| c.kind == "output_text")
            .map(|c| c.text.clone())
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: Some(resp.model),
            tokens_used: resp.usage.map(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .generate("Respond with just 'OK'", None, Some(16), Some(0.0))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("OpenAI health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

fn http_to_sleuth(e: HttpError) -> SleuthError {
    SleuthError::Agent(format!("openai: {e}"))
}
