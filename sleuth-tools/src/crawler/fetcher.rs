use async_trait::async_trait;
use sleuth_drivers::browser::{BrowserConfig, render_body_text};
use tracing::debug;

/// Visible text rendered from one result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub content: String,
}

/// Turns a URL into the visible text a user would see.
///
/// Implementations must tolerate concurrent calls and must not keep state
/// between them.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage>;
}

/// Renders pages in a fresh headless Chrome session per fetch.
///
/// Every fetch is bounded by the configured page timeout; the session is
/// closed on success, failure and timeout.
#[derive(Debug, Clone, Default)]
pub struct BrowserFetcher {
    config: BrowserConfig,
}

impl BrowserFetcher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage> {
        let content = render_body_text(&self.config, url).await?;
        debug!(target: "crawler.fetch", %url, chars = content.len(), "page rendered");
        Ok(FetchedPage {
            url: url.to_string(),
            content,
        })
    }
}
