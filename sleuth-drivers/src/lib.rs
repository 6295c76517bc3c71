//! Driver layer for browser automation.
//!
//! This crate wraps a WebDriver endpoint (chromedriver by default) so the
//! tools can render a page and read its visible text without leaking
//! sessions.
//!
//! - [`browser::session::BrowserSession`]: one WebDriver session, closed on every exit path
//! - [`browser::session::render_body_text`]: open, navigate, extract `body` text, close, under one timeout
//! - [`browser::capabilities`]: chrome arguments and capability map
pub mod browser;
