use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sleuth_common::Result;

/// One completion. `tokens_used` is whatever usage figure the provider reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// A text-generation backend.
///
/// Sampling arguments are hints; `None` leaves the provider default in place.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// `Ok(false)` when the backend answers but is not usable.
    async fn health_check(&self) -> Result<bool>;

    fn model_name(&self) -> &str;

    /// Prompt in, text out, with provider defaults.
    async fn generate_from_prompt(&self, prompt: &str) -> Result<String> {
        let LlmResponse {
            text, tokens_used, ..
        } = self.generate(prompt, None, None, None).await?;
        tracing::debug!(model = %self.model_name(), ?tokens_used, "llm.generate.done");
        Ok(text)
    }
}
