use super::{DEFAULT_YAHOO_BASE, YahooApiError, validate_ticker, yahoo_client};
use crate::context::CallContext;
use crate::tool::{Tool, ToolError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sleuth_http::{HttpClient, RequestOpts};
use tracing::debug;

pub const QUOTE_TOOL_NAME: &str = "yahoo_finance_quote";

const QUOTE_DESCRIPTION: &str = "Looks up the daily closing price of a stock on a given date. \
Input: JSON {\"stock_symbol\": \"AAPL\", \"stock_name\": \"Apple Inc.\", \"partition\": \"YYYY-MM-DD\"}.";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    stock_symbol: String,
    stock_name: String,
    partition: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Closing price for one symbol on one calendar day (UTC).
pub struct YahooQuoteTool {
    client: HttpClient,
}

impl YahooQuoteTool {
    pub fn new() -> Result<Self, ToolError> {
        Self::with_base_url(DEFAULT_YAHOO_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: yahoo_client(base_url)?,
        })
    }

    async fn close_price(&self, symbol: &str, day: NaiveDate) -> Result<f64, ToolError> {
        let period1 = day.and_time(NaiveTime::default()).and_utc().timestamp();
        let period2 = period1 + SECONDS_PER_DAY;
        let opts = RequestOpts {
            query: vec![
                ("interval", "1d".to_string()),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
            ],
            ..Default::default()
        };

        let envelope: ChartEnvelope = self
            .client
            .get_json(&format!("v8/finance/chart/{symbol}"), opts)
            .await
            .map_err(|e| ToolError::from_http("chart", e))?;

        if let Some(err) = envelope.chart.error {
            return Err(ToolError::NoData(format!(
                "{symbol}: {} ({})",
                err.description, err.code
            )));
        }

        let result = envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ToolError::NoData(format!("no chart data for {symbol} on {day}")))?;
        let series = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::NoData(format!("no quote series for {symbol} on {day}")))?;
        series
            .close
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| ToolError::NoData(format!("no closing price for {symbol} on {day}")))
    }
}

#[async_trait]
impl Tool for YahooQuoteTool {
    fn name(&self) -> &str {
        QUOTE_TOOL_NAME
    }

    fn description(&self) -> &str {
        QUOTE_DESCRIPTION
    }

    async fn call(&self, ctx: &CallContext, input: &str) -> Result<String, ToolError> {
        let request: QuoteRequest = serde_json::from_str(input)
            .map_err(|e| ToolError::invalid_json("{stock_symbol, stock_name, partition}", e))?;
        let symbol = validate_ticker(&request.stock_symbol)?;
        let day = NaiveDate::parse_from_str(request.partition.trim(), "%Y-%m-%d").map_err(|e| {
            ToolError::InvalidInput(format!(
                "partition '{}' is not a YYYY-MM-DD date: {e}",
                request.partition
            ))
        })?;

        let close = ctx.run(self.close_price(&symbol, day)).await??;
        debug!(target: "tools.finance", %symbol, %day, close, "quote fetched");

        Ok(format!(
            "The stock price of {symbol} ({}) on {day} was {close:.6}.",
            request.stock_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chart_body(closes: serde_json::Value) -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL"},
                    "timestamp": [1704205800],
                    "indicators": {"quote": [{"close": closes, "open": [187.15]}]}
                }],
                "error": null
            }
        })
    }

    const INPUT: &str =
        r#"{"stock_symbol": "aapl", "stock_name": "Apple Inc.", "partition": "2024-01-02"}"#;

    #[tokio::test]
    async fn formats_closing_price_for_the_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("interval", "1d"))
            .and(query_param("period1", "1704153600"))
            .and(query_param("period2", "1704240000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(json!([185.64]))))
            .expect(1)
            .mount(&server)
            .await;

        let tool = YahooQuoteTool::with_base_url(&server.uri()).unwrap();
        let out = tool.call(&CallContext::new(), INPUT).await.unwrap();
        assert_eq!(
            out,
            "The stock price of AAPL (Apple Inc.) on 2024-01-02 was 185.640000."
        );
    }

    #[tokio::test]
    async fn null_closes_are_skipped_then_reported_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(json!([null]))))
            .mount(&server)
            .await;

        let tool = YahooQuoteTool::with_base_url(&server.uri()).unwrap();
        let err = tool.call(&CallContext::new(), INPUT).await.unwrap_err();
        assert!(matches!(err, ToolError::NoData(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_result_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"chart": {"result": [], "error": null}})),
            )
            .mount(&server)
            .await;

        let tool = YahooQuoteTool::with_base_url(&server.uri()).unwrap();
        let err = tool.call(&CallContext::new(), INPUT).await.unwrap_err();
        assert!(matches!(err, ToolError::NoData(_)));
    }

    #[tokio::test]
    async fn unexpected_shape_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quotes": []})))
            .mount(&server)
            .await;

        let tool = YahooQuoteTool::with_base_url(&server.uri()).unwrap();
        let err = tool.call(&CallContext::new(), INPUT).await.unwrap_err();
        assert!(matches!(err, ToolError::Schema { context: "chart", .. }), "{err:?}");
    }

    #[tokio::test]
    async fn unknown_symbol_surfaces_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}
            })))
            .mount(&server)
            .await;

        let tool = YahooQuoteTool::with_base_url(&server.uri()).unwrap();
        let err = tool.call(&CallContext::new(), INPUT).await.unwrap_err();
        match err {
            ToolError::Http(e) => assert_eq!(e.status().map(|s| s.as_u16()), Some(404)),
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_input_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let tool = YahooQuoteTool::with_base_url(&server.uri()).unwrap();
        let ctx = CallContext::new();

        let missing = tool.call(&ctx, r#"{"stock_symbol": "AAPL"}"#).await;
        assert!(matches!(missing, Err(ToolError::InvalidInput(_))));

        let bad_date = tool
            .call(
                &ctx,
                r#"{"stock_symbol": "AAPL", "stock_name": "Apple", "partition": "02/01/2024"}"#,
            )
            .await;
        assert!(matches!(bad_date, Err(ToolError::InvalidInput(_))));
    }
}
