use super::{DEFAULT_YAHOO_BASE, YahooApiError, validate_ticker, yahoo_client};
use crate::context::CallContext;
use crate::tool::{Tool, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use sleuth_http::{HttpClient, RequestOpts};
use tracing::debug;

pub const NEWS_TOOL_NAME: &str = "yahoo_finance_news";

const NEWS_DESCRIPTION: &str = "Fetches recent news articles for a company ticker. \
Input: JSON {\"query\": \"AAPL\"}. Output: one block per article with title, description and link.";

#[derive(Debug, Deserialize)]
struct NewsRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    #[serde(default)]
    news: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
}

impl NewsArticle {
    fn render(&self) -> String {
        format!("{}\n{}\nLink: {}", self.title, self.description, self.link)
    }
}

pub struct YahooNewsTool {
    client: HttpClient,
}

impl YahooNewsTool {
    pub fn new() -> Result<Self, ToolError> {
        Self::with_base_url(DEFAULT_YAHOO_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: yahoo_client(base_url)?,
        })
    }

    async fn articles(&self, ticker: &str) -> Result<Vec<NewsArticle>, ToolError> {
        let opts = RequestOpts {
            query: vec![("modules", "news".to_string())],
            ..Default::default()
        };
        let envelope: SummaryEnvelope = self
            .client
            .get_json(&format!("v10/finance/quoteSummary/{ticker}"), opts)
            .await
            .map_err(|e| ToolError::from_http("quoteSummary", e))?;

        if let Some(err) = envelope.quote_summary.error {
            return Err(ToolError::NoData(format!(
                "{ticker}: {} ({})",
                err.description, err.code
            )));
        }
        Ok(envelope
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .flat_map(|r| r.news)
            .collect())
    }
}

#[async_trait]
impl Tool for YahooNewsTool {
    fn name(&self) -> &str {
        NEWS_TOOL_NAME
    }

    fn description(&self) -> &str {
        NEWS_DESCRIPTION
    }

    async fn call(&self, ctx: &CallContext, input: &str) -> Result<String, ToolError> {
        let request: NewsRequest =
            serde_json::from_str(input).map_err(|e| ToolError::invalid_json("{query}", e))?;
        let ticker = validate_ticker(&request.query)?;

        let articles = ctx.run(self.articles(&ticker)).await??;
        debug!(target: "tools.finance", %ticker, count = articles.len(), "news fetched");

        if articles.is_empty() {
            return Ok(format!("No news found for company ticker {ticker}"));
        }
        Ok(articles
            .iter()
            .map(NewsArticle::render)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
