//! Loader for `sleuth.yaml` with environment overlays.
//!
//! Sources are merged in order: files and inline YAML first, then
//! `SLEUTH__`-prefixed environment variables (`SLEUTH__BROWSER__HEADLESS=false`
//! overrides `browser.headless`). After merging, every string value has
//! `${VAR}` placeholders expanded, and the result is deserialized into
//! [`SleuthConfig`].
//!
//! ```yaml
//! version: "1"
//! logging:
//!   format: json
//!   stderr: true
//! llm:
//!   provider: openai
//!   model: gpt-4o-mini
//!   auth_token: ${OPENAI_API_KEY}
//! browser:
//!   webdriver_url: http://localhost:9515
//!   page_timeout_secs: 15
//! tools:
//!   - id: crawler
//!     kind: crawler
//!     config:
//!       verdict_policy: non_empty
//!   - id: quote
//!     kind: yahoo_quote
//!   - id: python
//!     kind: python
//!     config:
//!       endpoint: https://exec.example.com/run
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use sleuth_common::observability::LogFormat;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const ENV_PREFIX: &str = "SLEUTH";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct SleuthConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
}

impl SleuthConfig {
    /// Tool specs that are not explicitly disabled.
    pub fn enabled_tools(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter().filter(|t| t.enabled.unwrap_or(true))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            filter: default_filter(),
            stderr: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Openai {
        model: String,
        auth_token: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
    },
    Ollama {
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
}

impl LlmConfig {
    pub fn sampling(&self) -> (Option<f32>, Option<u32>) {
        match self {
            Self::Openai {
                temperature,
                max_tokens,
                ..
            }
            | Self::Ollama {
                temperature,
                max_tokens,
                ..
            } => (*temperature, *max_tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            page_timeout_secs: default_page_timeout_secs(),
            user_agent: None,
        }
    }
}

/// Shared fields + the per-kind details.
#[derive(Debug, Deserialize)]
pub struct ToolSpec {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub details: ToolDetails,
}

/// The tag is `kind`; the payload lives in `config`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolDetails {
    Crawler {
        #[serde(default)]
        config: CrawlerConfig,
    },
    YahooQuote {
        #[serde(default)]
        config: YahooConfig,
    },
    YahooNews {
        #[serde(default)]
        config: YahooConfig,
    },
    Python { config: PythonConfig },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictMode {
    #[default]
    NonEmpty,
    Sentinel,
}

#[derive(Debug, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default = "default_search_base")]
    pub search_base: String,
    #[serde(default)]
    pub verdict_policy: VerdictMode,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            search_base: default_search_base(),
            verdict_policy: VerdictMode::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct YahooConfig {
    #[serde(default = "default_yahoo_base")]
    pub base_url: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: default_yahoo_base(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PythonConfig {
    pub endpoint: String,
}

fn default_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_page_timeout_secs() -> u64 {
    15
}
fn default_search_base() -> String {
    "https://www.google.com/search".into()
}
fn default_yahoo_base() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn validate(cfg: &SleuthConfig) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for tool in &cfg.tools {
        if tool.id.trim().is_empty() {
            return Err(LoadError::Invalid("tool id must not be empty".into()));
        }
        if !seen.insert(tool.id.as_str()) {
            return Err(LoadError::Invalid(format!("duplicate tool id '{}'", tool.id)));
        }
    }
    if cfg.browser.page_timeout_secs == 0 {
        return Err(LoadError::Invalid(
            "browser.page_timeout_secs must be positive".into(),
        ));
    }
    Ok(())
}

/// Builder over the `config` crate wiring (files + env overrides).
pub struct SleuthConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SleuthConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SleuthConfigLoader {
    /// Start with no file sources; environment overrides are always applied last.
    ///
    /// ```
    /// use sleuth_config::SleuthConfigLoader;
    ///
    /// let config = SleuthConfigLoader::new()
    ///     .with_yaml_str("version: '1'\ntools: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.tools.is_empty());
    /// assert_eq!(config.browser.page_timeout_secs, 15);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent (env-only deployments).
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use sleuth_config::{SleuthConfigLoader, ToolDetails, VerdictMode};
    ///
    /// let cfg = SleuthConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// tools:
    ///   - id: "web"
    ///     kind: "crawler"
    ///     config:
    ///       verdict_policy: sentinel
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// match &cfg.tools[0].details {
    ///     ToolDetails::Crawler { config } => {
    ///         assert_eq!(config.verdict_policy, VerdictMode::Sentinel);
    ///         assert_eq!(config.search_base, "https://www.google.com/search");
    ///     }
    ///     other => panic!("unexpected tool: {other:?}"),
    /// }
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<SleuthConfig, LoadError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: SleuthConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        validate(&typed)?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("SLEUTH_T_FOO", Some("bar"), || {
            let mut v = json!("prefix-${SLEUTH_T_FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars(
            [("SLEUTH_T_HOST", Some("exec")), ("SLEUTH_T_PORT", Some("8080"))],
            || {
                let mut v = json!([
                    "http://$SLEUTH_T_HOST",
                    { "endpoint": "${SLEUTH_T_HOST}:${SLEUTH_T_PORT}" },
                    42,
                    true,
                    null
                ]);
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!(["http://exec", { "endpoint": "exec:8080" }, 42, true, null])
                );
            },
        );
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("SLEUTH_T_C", Some("qux")),
                ("SLEUTH_T_B", Some("mid-${SLEUTH_T_C}")),
                ("SLEUTH_T_A", Some("start-${SLEUTH_T_B}-end")),
            ],
            || {
                let mut v = json!("X=${SLEUTH_T_A}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars(
            [("SLEUTH_T_X", Some("${SLEUTH_T_Y}")), ("SLEUTH_T_Y", Some("${SLEUTH_T_X}"))],
            || {
                let mut v = json!("x=${SLEUTH_T_X}-y");
                expand_env_in_value(&mut v);
                let s = v.as_str().unwrap();
                assert!(s.starts_with("x=") && s.ends_with("-y"));
                assert!(s.contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${SLEUTH_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${SLEUTH_DOES_NOT_EXIST}"));
    }

    #[test]
    fn duplicate_tool_ids_are_rejected() {
        let err = SleuthConfigLoader::new()
            .with_yaml_str(
                r#"
tools:
  - id: quote
    kind: yahoo_quote
  - id: quote
    kind: yahoo_news
"#,
            )
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn python_tool_requires_endpoint() {
        let err = SleuthConfigLoader::new()
            .with_yaml_str("tools:\n  - id: py\n    kind: python\n")
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Source(_)));
    }

    #[test]
    fn disabled_tools_are_filtered() {
        let cfg = SleuthConfigLoader::new()
            .with_yaml_str(
                r#"
tools:
  - id: news
    kind: yahoo_news
    enabled: false
  - id: quote
    kind: yahoo_quote
"#,
            )
            .load()
            .unwrap();
        let ids: Vec<_> = cfg.enabled_tools().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["quote"]);
    }

    #[test]
    fn llm_sampling_knobs_are_exposed() {
        let cfg = SleuthConfigLoader::new()
            .with_yaml_str(
                r#"
llm:
  provider: ollama
  model: llama3.2:3b
  temperature: 0.1
"#,
            )
            .load()
            .unwrap();
        let llm = cfg.llm.unwrap();
        assert_eq!(llm.sampling(), (Some(0.1), None));
        match llm {
            LlmConfig::Ollama { endpoint, .. } => assert_eq!(endpoint, "http://localhost:11434"),
            other => panic!("unexpected provider: {other:?}"),
        }
    }
}
