use crate::context::CallContext;
use crate::tool::{Tool, ToolError};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sleuth_http::{HttpClient, RequestOpts};
use std::time::Duration;
use tracing::debug;

pub const PYTHON_TOOL_NAME: &str = "python_exec";

const PYTHON_DESCRIPTION: &str = "Runs Python code on a remote execution service and returns \
what it printed. Input: Python source, optionally wrapped in a ```python fence.";

const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ExecRequest<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecResponse {
    #[serde(default)]
    result: String,
    #[serde(default)]
    error: String,
}

/// Strip markdown code fences from model-written Python.
///
/// Fenced blocks are extracted and joined; text without a complete fence has
/// any stray fence markers removed.
pub fn clean_python(text: &str) -> String {
    match fenced_blocks(text) {
        Some(code) => code,
        None => text
            .replace("```python", "")
            .replace("```", "")
            .trim()
            .to_string(),
    }
}

fn fenced_blocks(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```(?:python|py)?[ \t]*\r?\n?(.*?)```").ok()?;
    let blocks: Vec<&str> = re
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .collect();
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

/// Sends code to an execution service that answers `{result, error}`.
///
/// Execution is not idempotent, so requests are never retried.
pub struct PythonExecTool {
    client: HttpClient,
}

impl PythonExecTool {
    pub fn new(endpoint: &str) -> Result<Self, ToolError> {
        let client = HttpClient::new(endpoint)
            .map_err(ToolError::Http)?
            .with_timeout(DEFAULT_EXEC_TIMEOUT)
            .with_retries(0);
        Ok(Self { client })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl Tool for PythonExecTool {
    fn name(&self) -> &str {
        PYTHON_TOOL_NAME
    }

    fn description(&self) -> &str {
        PYTHON_DESCRIPTION
    }

    async fn call(&self, ctx: &CallContext, input: &str) -> Result<String, ToolError> {
        let code = clean_python(input);
        if code.is_empty() {
            return Err(ToolError::InvalidInput("no Python code supplied".into()));
        }
        debug!(target: "tools.python", lines = code.lines().count(), "submitting code");

        let request = ExecRequest { code: &code };
        let response: ExecResponse = ctx
            .run(
                self.client
                    .post_json_opts("", &request, RequestOpts::default()),
            )
            .await?
            .map_err(|e| ToolError::from_http("python_exec", e))?;

        if !response.error.is_empty() {
            return Err(ToolError::Execution(response.error));
        }
        Ok(response.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn fences_are_removed() {
        assert_eq!(clean_python("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(clean_python("```\nx = 2\n```"), "x = 2");
        assert_eq!(clean_python("  print('plain')  "), "print('plain')");
        assert_eq!(clean_python("```python\nprint(3)"), "print(3)");
    }

    #[test]
    fn prose_around_a_block_is_dropped() {
        let reply = "Here you go:\n```python\nprint(sum([1, 2]))\n```\nThis prints 3.";
        assert_eq!(clean_python(reply), "print(sum([1, 2]))");
    }

    #[tokio::test]
    async fn posts_cleaned_code_and_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .and(body_json(json!({"code": "print(6 * 7)"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "42\n"})))
            .expect(1)
            .mount(&server)
            .await;

        let tool = PythonExecTool::new(&format!("{}/execute", server.uri())).unwrap();
        let out = tool
            .call(&CallContext::new(), "```python\nprint(6 * 7)\n```")
            .await
            .unwrap();
        assert_eq!(out, "42\n");
    }

    #[tokio::test]
    async fn service_error_is_execution_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "",
                "error": "NameError: name 'x' is not defined"
            })))
            .mount(&server)
            .await;

        let tool = PythonExecTool::new(&server.uri()).unwrap();
        let err = tool.call(&CallContext::new(), "print(x)").await.unwrap_err();
        assert!(matches!(err, ToolError::Execution(ref m) if m.starts_with("NameError")));
    }

    #[tokio::test]
    async fn server_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let tool = PythonExecTool::new(&server.uri()).unwrap();
        let err = tool.call(&CallContext::new(), "print(1)").await.unwrap_err();
        assert!(matches!(err, ToolError::Http(_)));
    }

    #[tokio::test]
    async fn blank_code_is_rejected() {
        let tool = PythonExecTool::new("http://127.0.0.1:9").unwrap();
        let err = tool.call(&CallContext::new(), "```python\n```").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
