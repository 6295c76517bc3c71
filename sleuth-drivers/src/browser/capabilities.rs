use super::BrowserConfig;
use serde_json::json;
use webdriver::capabilities::Capabilities;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Chrome command-line arguments for a rendering session.
pub fn chrome_arguments(config: &BrowserConfig) -> Vec<String> {
    let user_agent = config.user_agent.as_deref().unwrap_or(DESKTOP_USER_AGENT);
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--no-sandbox".to_string(),
        "--window-size=1440,900".to_string(),
        "--lang=en-US,en".to_string(),
        format!("--user-agent={user_agent}"),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// W3C capability map carrying `goog:chromeOptions`.
pub fn chrome_capabilities(config: &BrowserConfig) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": chrome_arguments(config) }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_adds_headless_flags() {
        let cfg = BrowserConfig::default();
        let args = chrome_arguments(&cfg);
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
    }

    #[test]
    fn headed_session_has_no_headless_flag() {
        let cfg = BrowserConfig {
            headless: false,
            user_agent: Some("sleuth-test".into()),
            ..BrowserConfig::default()
        };
        let args = chrome_arguments(&cfg);
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(args.contains(&"--user-agent=sleuth-test".to_string()));
    }

    #[test]
    fn capabilities_embed_chrome_options() {
        let caps = chrome_capabilities(&BrowserConfig::default());
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.is_empty());
    }
}
