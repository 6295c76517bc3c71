//! Yahoo Finance adapters: a daily closing price and the news feed for a
//! ticker. Both talk to the public JSON endpoints through [`HttpClient`].

pub mod news;
pub mod quote;

pub use news::YahooNewsTool;
pub use quote::YahooQuoteTool;

use crate::tool::ToolError;
use serde::Deserialize;
use sleuth_http::HttpClient;

pub const DEFAULT_YAHOO_BASE: &str = "https://query1.finance.yahoo.com";

/// `{"code": ..., "description": ...}` as Yahoo reports it inside a body.
#[derive(Debug, Deserialize)]
pub(crate) struct YahooApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

pub(crate) fn yahoo_client(base_url: &str) -> Result<HttpClient, ToolError> {
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    HttpClient::new(&base).map_err(ToolError::Http)
}

/// Tickers go into the URL path, so only characters Yahoo uses are allowed.
pub(crate) fn validate_ticker(raw: &str) -> Result<String, ToolError> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(ToolError::InvalidInput("ticker symbol is empty".into()));
    }
    // All-dot tickers would resolve as `.` or `..` path segments.
    if ticker.chars().all(|c| c == '.')
        || !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        return Err(ToolError::InvalidInput(format!(
            "'{ticker}' is not a valid ticker symbol"
        )));
    }
    Ok(ticker.to_ascii_uppercase())
}
