//! Provider-agnostic LLM integration for Sleuth.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and concrete
//! provider implementations for Ollama and OpenAI. [`ensure_llm_ready`] turns
//! a [`sleuth_common::LlmConfig`] into a shareable client.
//!
//! # Examples
//! ```no_run
//! use sleuth_common::{LlmConfig, Result};
//! use sleuth_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = LlmConfig::default();
//! let client = ensure_llm_ready(&cfg).await?;
//! assert!(!client.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
pub mod ollama;
pub mod openai;
pub mod traits;

use sleuth_common::{LlmConfig, SleuthError};
use std::sync::Arc;
use traits::LlmClient;

pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Build the configured LLM client, probing local servers where relevant.
pub async fn ensure_llm_ready(
    config: &LlmConfig,
) -> sleuth_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        #[cfg(feature = "ollama")]
        LlmConfig::Ollama { base_url, model } => {
            let client = ollama::OllamaClient::new(base_url.clone(), model.clone()).await?;
            Ok(Arc::new(client))
        }
        #[cfg(feature = "openai")]
        LlmConfig::OpenAi {
            api_key,
            model,
            base_url,
        } => {
            let client = match base_url {
                Some(base) => {
                    openai::OpenAiClient::with_base_url(api_key.clone(), model.clone(), base)?
                }
                None => openai::OpenAiClient::new(api_key.clone(), model.clone())?,
            };
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(SleuthError::Config("No LLM configured".to_string())),
        #[allow(unreachable_patterns)]
        _ => Err(SleuthError::Config("LLM provider not enabled".to_string())),
    }
}
