use sleuth_drivers::browser::session::render_body_text;
use sleuth_drivers::browser::BrowserConfig;
use std::time::Duration;

// Requires a chromedriver listening on localhost:9515.
#[tokio::test]
#[ignore]
async fn renders_example_dot_com() {
    let cfg = BrowserConfig::default();
    let text = render_body_text(&cfg, "https://example.com").await.unwrap();
    assert!(text.contains("Example Domain"));
}

#[tokio::test]
async fn unreachable_webdriver_is_an_error_not_a_hang() {
    let cfg = BrowserConfig {
        webdriver_url: "http://127.0.0.1:9".to_string(),
        page_timeout: Duration::from_secs(5),
        ..BrowserConfig::default()
    };
    let started = std::time::Instant::now();
    let err = render_body_text(&cfg, "https://example.com").await.unwrap_err();
    assert!(started.elapsed() <= Duration::from_secs(6), "{err:#}");
}
