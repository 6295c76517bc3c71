//! JSON-over-HTTP client shared by the Sleuth adapters and LLM providers.
//!
//! - Per-request options: bearer auth, extra headers, query params, timeout, retries
//! - Sensitive query params and the `Authorization` header never reach the logs
//! - 429 and 5xx responses are retried with exponential backoff, honoring `Retry-After`
//! - Transport failures (connect, body read) are retried with the same budget
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), sleuth_http::HttpError> {
//! let client = sleuth_http::HttpClient::new("https://query1.finance.yahoo.com")?;
//! let chart: serde_json::Value = client
//!     .get_json("v8/finance/chart/AAPL", sleuth_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

const BODY_SNIPPET_MAX: usize = 500;
const BACKOFF_BASE_MS: u64 = 200;
const RATE_LIMIT_FLOOR: Duration = Duration::from_millis(1100);

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "api_key",
    "apikey",
    "auth",
    "authorization",
    "bearer",
    "client_secret",
    "key",
    "secret",
    "token",
];

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for API errors, `None` for transport/decode failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use sleuth_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(0),
///     query: vec![("interval", "1d".to_string())],
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.bearer.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub bearer: Option<&'a str>,
    pub headers: Option<HeaderMap>,
    pub query: Vec<(&'a str, String)>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use sleuth_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("sleuth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.send_json::<(), T>(Method::GET, path, None, opts).await
    }

    /// POST a JSON body with optional bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            bearer,
            ..Default::default()
        };
        self.send_json(Method::POST, path, Some(body), opts).await
    }

    /// POST a JSON body with full per-request options.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, Some(body), opts).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let body_bytes = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        let bearer = opts.bearer.map(sanitize_bearer).transpose()?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let req_id = uuid::Uuid::new_v4().simple().to_string();

        let mut attempt = 0usize;
        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if !opts.query.is_empty() {
                rb = rb.query(&opts.query);
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }
            if let Some(token) = &bearer {
                rb = rb.bearer_auth(token);
            }
            if let Some(bytes) = &body_bytes {
                rb = rb
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }

            tracing::debug!(
                req_id = %req_id,
                attempt = attempt + 1,
                max_retries,
                method = %method,
                host_path = %host_path(&url),
                query = ?redact_pairs(&opts.query),
                timeout_ms = timeout.as_millis() as u64,
                has_auth = bearer.is_some(),
                has_body = body_bytes.is_some(),
                "http.request.start"
            );

            let started = Instant::now();
            let outcome = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    resp.bytes().await.map(|b| (status, headers, b))
                }
                Err(err) => Err(err),
            };

            let (status, headers, bytes) = match outcome {
                Ok(parts) => parts,
                Err(err) if attempt < max_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(
                        req_id = %req_id,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "http.retrying.network"
                    );
                    sleep(delay).await;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(req_id = %req_id, attempt, error = %err, "http.network_error");
                    return Err(HttpError::Network(err.to_string()));
                }
            };

            let snippet = snip_body(&bytes);
            tracing::debug!(
                req_id = %req_id,
                %status,
                duration_ms = started.elapsed().as_millis() as u64,
                body_len = bytes.len(),
                "http.response"
            );
            tracing::trace!(req_id = %req_id, body_snippet = %snippet, "http.response.body");

            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        req_id = %req_id,
                        serde_err = %e,
                        body_snippet = %snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < max_retries {
                attempt += 1;
                let delay = match retry_after(&headers) {
                    Some(d) => d,
                    None if status == StatusCode::TOO_MANY_REQUESTS => {
                        backoff(attempt).max(RATE_LIMIT_FLOOR)
                    }
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id = %req_id,
                    %status,
                    attempt,
                    backoff_ms = delay.as_millis() as u64,
                    "http.retrying.status"
                );
                sleep(delay).await;
                continue;
            }

            let message = extract_error_message(&bytes);
            let request_id = headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(req_id.as_str())
                .to_string();
            tracing::warn!(req_id = %req_id, %status, message = %message, "http.error");
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }
    }
}

fn backoff(attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(1u64 << exp))
}

fn retry_after(h: &HeaderMap) -> Option<Duration> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
        .map(Duration::from_secs)
}

fn host_path(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or("-"), url.path())
}

fn redact_pairs(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let secret = SECRET_PARAMS.contains(&k.to_ascii_lowercase().as_str());
            let shown = if secret { "<redacted>" } else { v.as_str() };
            ((*k).to_string(), shown.to_string())
        })
        .collect()
}

fn extract_error_message(body: &[u8]) -> String {
    // {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }
    // {"message":"..."} | {"detail":"..."} | {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(n) = serde_json::from_slice::<Nested>(body) {
        return n.error.message;
    }
    if let Ok(f) = serde_json::from_slice::<Flat>(body) {
        for candidate in [f.message, f.detail, f.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= BODY_SNIPPET_MAX {
        return text.into_owned();
    }
    let mut cut = BODY_SNIPPET_MAX;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

fn sanitize_bearer(raw: &str) -> Result<String, HttpError> {
    let mut token = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    token.retain(|ch| !ch.is_ascii_whitespace());

    if token.is_empty() {
        return Err(HttpError::Build("bearer token is empty".into()));
    }
    if !token.is_ascii() || token.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "bearer token contains non-printable bytes".into(),
        ));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_json_sends_query_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/items"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let opts = RequestOpts {
            query: vec![("interval", "1d".into())],
            ..Default::default()
        };
        let got: Value = client.get_json("v1/items", opts).await.unwrap();
        assert_eq!(got, json!({"ok": true}));
    }

    #[tokio::test]
    async fn post_json_sets_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({"input": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let got: Value = client
            .post_json("responses", Some(" 'sk-test' "), &json!({"input": "hi"}))
            .await
            .unwrap();
        assert_eq!(got["id"], "r1");
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"error": {"message": "busy"}})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap().with_retries(1);
        let err = client
            .get_json::<Value>("flaky", RequestOpts::default())
            .await
            .unwrap_err();
        match err {
            HttpError::Api {
                status, message, ..
            } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(message, "busy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "nope"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<Value>("missing", RequestOpts::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<Value>("x", RequestOpts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Decode(_, ref snip) if snip == "<html>"));
    }

    #[test]
    fn secret_query_params_are_redacted() {
        let pairs = vec![("q", "aapl".to_string()), ("API_KEY", "hunter2".to_string())];
        let shown = redact_pairs(&pairs);
        assert_eq!(shown[0].1, "aapl");
        assert_eq!(shown[1].1, "<redacted>");
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert_eq!(backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn empty_bearer_is_rejected() {
        assert!(sanitize_bearer("  ").is_err());
        assert_eq!(sanitize_bearer("\"abc def\"").unwrap(), "abcdef");
    }
}
