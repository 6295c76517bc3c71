pub mod capabilities;
pub mod session;

pub use session::{BrowserSession, render_body_text};

use std::time::Duration;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the WebDriver lives and how long a single render may take.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    /// Ceiling for connect + navigate + extract.
    pub page_timeout: Duration,
    /// Overrides the user agent chrome would report.
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            user_agent: None,
        }
    }
}
