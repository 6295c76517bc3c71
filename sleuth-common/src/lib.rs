//! Common types and utilities shared across Sleuth crates.
//!
//! This crate defines the provider-agnostic LLM configuration, observability
//! helpers, and the shared error type used throughout the Sleuth workspace.
//! It stays dependency-light so every crate can depend on it.
//!
//! # Overview
//!
//! - [`LlmConfig`]: Provider-agnostic LLM configuration
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`SleuthError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use sleuth_common::{LlmConfig, SleuthError};
//!
//! let cfg: LlmConfig = serde_json::from_str(r#""None""#).unwrap();
//! assert!(matches!(cfg, LlmConfig::None));
//!
//! let err = SleuthError::Config("missing model".into());
//! assert_eq!(err.to_string(), "Configuration error: missing model");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Configuration for an LLM provider used by the tools.
///
/// Feature flags control which variants are compiled in.
/// See the `sleuth-llm` crate for concrete client implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmConfig {
    #[cfg(feature = "ollama")]
    Ollama { base_url: String, model: String },
    #[cfg(feature = "openai")]
    OpenAi {
        api_key: String,
        model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    None,
}

impl Default for LlmConfig {
    fn default() -> Self {
        #[cfg(feature = "ollama")]
        {
            Self::Ollama {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
            }
        }
        #[cfg(not(feature = "ollama"))]
        {
            Self::None
        }
    }
}

/// Error types used across the Sleuth system.
#[derive(thiserror::Error, Debug)]
pub enum SleuthError {
    /// A provider or collaborator failed to complete a requested operation.
    #[error("Agent error: {0}")]
    Agent(String),

    /// A driver (browser, network, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`SleuthError`].
pub type Result<T> = std::result::Result<T, SleuthError>;
