use super::{capabilities::chrome_capabilities, BrowserConfig};
use anyhow::{anyhow, Context, Result};
use fantoccini::{Client, ClientBuilder, Locator};
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// A single WebDriver session.
///
/// Close it with [`BrowserSession::close`]. If the session is dropped while
/// still open (an error path, a timeout, or a cancelled caller), the drop
/// spawns the close onto the current Tokio runtime so the browser is never
/// left running.
pub struct BrowserSession {
    client: Option<Client>,
}

impl BrowserSession {
    /// Connect to the configured WebDriver and start a new session.
    pub async fn open(config: &BrowserConfig) -> Result<Self> {
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(config))
            .connect(&config.webdriver_url)
            .await
            .with_context(|| format!("webdriver connect to {} failed", config.webdriver_url))?;
        debug!(target: "browser.session", webdriver = %config.webdriver_url, "session opened");
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow!("browser session already closed"))
    }

    /// Navigate to `url` and wait for the document to load.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client()?
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))
    }

    /// Visible text of the document `body`.
    pub async fn body_text(&self) -> Result<String> {
        let body = self
            .client()?
            .find(Locator::Css("body"))
            .await
            .context("document has no body")?;
        body.text().await.context("body text extraction failed")
    }

    /// End the WebDriver session.
    pub async fn close(mut self) -> Result<()> {
        match self.client.take() {
            Some(client) => client.close().await.context("session close failed"),
            None => Ok(()),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                debug!(target: "browser.session", "session dropped while open; closing in background");
                handle.spawn(async move {
                    if let Err(e) = client.close().await {
                        warn!(target: "browser.session", error = %e, "background session close failed");
                    }
                });
            }
            Err(_) => {
                warn!(target: "browser.session", "session dropped outside a runtime; it may outlive this process");
            }
        }
    }
}

/// Open a session, render `url`, read the visible `body` text and close the
/// session, all under `config.page_timeout`.
///
/// Exceeding the timeout is an error; partial text is never returned.
pub async fn render_body_text(config: &BrowserConfig, url: &str) -> Result<String> {
    let work = async {
        let session = BrowserSession::open(config).await?;
        let extracted = async {
            session.goto(url).await?;
            session.body_text().await
        }
        .await;
        if let Err(e) = session.close().await {
            warn!(target: "browser.session", %url, error = %e, "closing session after render failed");
        }
        extracted
    };

    match tokio::time::timeout(config.page_timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!(
            "rendering {url} exceeded {}s",
            config.page_timeout.as_secs()
        )),
    }
}
