use crate::context::{CallContext, Interrupted};
use crate::crawler::SearchError;
use async_trait::async_trait;
use sleuth_http::HttpError;

/// Errors surfaced by a tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("upstream request failed: {0}")]
    Http(HttpError),
    #[error("unexpected response shape in {context}: {reason}")]
    Schema {
        context: &'static str,
        reason: String,
    },
    #[error("no data: {0}")]
    NoData(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("call interrupted: {0}")]
    Interrupted(#[from] Interrupted),
    #[error("no tool registered as '{0}'")]
    NotRegistered(String),
}

impl ToolError {
    /// Classify an HTTP failure, keeping decode failures apart as schema drift.
    pub fn from_http(context: &'static str, err: HttpError) -> Self {
        match err {
            HttpError::Decode(reason, _) => ToolError::Schema { context, reason },
            other => ToolError::Http(other),
        }
    }

    pub(crate) fn invalid_json(expected: &str, err: serde_json::Error) -> Self {
        ToolError::InvalidInput(format!("expected JSON {expected}: {err}"))
    }
}

/// A named capability the host can invoke with a textual payload.
///
/// Implementations must be safe to call concurrently; per-call state lives
/// in the call, never in the tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Human-readable usage text, including the expected input format.
    fn description(&self) -> &str;

    async fn call(&self, ctx: &CallContext, input: &str) -> Result<String, ToolError>;
}
