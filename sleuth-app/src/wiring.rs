use anyhow::{Context, Result, bail};
use sleuth_common::LlmConfig as ClientConfig;
use sleuth_config::{BrowserSettings, LlmConfig, SleuthConfig, ToolDetails, VerdictMode};
use sleuth_drivers::browser::BrowserConfig;
use sleuth_llm::{ensure_llm_ready, traits::LlmClient};
use sleuth_tools::crawler::{
    AnswerOracle, BrowserFetcher, SearchOrchestrator, SearchUrlBuilder, VerdictPolicy,
};
use sleuth_tools::finance::{YahooNewsTool, YahooQuoteTool};
use sleuth_tools::python::PythonExecTool;
use sleuth_tools::{Tool, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build a registry holding every enabled tool in `cfg`, keyed by tool id.
///
/// The LLM client is only created when a crawler needs it, and is shared
/// between crawlers.
pub async fn build_registry(cfg: &SleuthConfig) -> Result<ToolRegistry> {
    let registry = ToolRegistry::new();
    let browser = browser_config(&cfg.browser);
    let mut llm: Option<Arc<dyn LlmClient + Send + Sync>> = None;

    for spec in cfg.enabled_tools() {
        let tool: Arc<dyn Tool> = match &spec.details {
            ToolDetails::Crawler { config } => {
                let Some(llm_cfg) = &cfg.llm else {
                    bail!("tool '{}' needs an `llm` section in the config", spec.id);
                };
                let client = match &llm {
                    Some(client) => client.clone(),
                    None => {
                        let client = build_llm_client(llm_cfg).await?;
                        llm = Some(client.clone());
                        client
                    }
                };
                let (temperature, max_tokens) = llm_cfg.sampling();
                let oracle = AnswerOracle::new(client)
                    .with_policy(verdict_policy(config.verdict_policy))
                    .with_sampling(temperature, max_tokens);
                Arc::new(
                    SearchOrchestrator::new(Arc::new(BrowserFetcher::new(browser.clone())), oracle)
                        .with_url_builder(SearchUrlBuilder::new(config.search_base.clone())),
                )
            }
            ToolDetails::YahooQuote { config } => Arc::new(
                YahooQuoteTool::with_base_url(&config.base_url)
                    .with_context(|| format!("tool '{}'", spec.id))?,
            ),
            ToolDetails::YahooNews { config } => Arc::new(
                YahooNewsTool::with_base_url(&config.base_url)
                    .with_context(|| format!("tool '{}'", spec.id))?,
            ),
            ToolDetails::Python { config } => Arc::new(
                PythonExecTool::new(&config.endpoint)
                    .with_context(|| format!("tool '{}'", spec.id))?,
            ),
        };
        info!(id = %spec.id, name = tool.name(), "tool registered");
        registry.register(spec.id.clone(), tool);
    }

    Ok(registry)
}

pub async fn build_llm_client(cfg: &LlmConfig) -> Result<Arc<dyn LlmClient + Send + Sync>> {
    let client_cfg = match cfg {
        LlmConfig::Openai {
            model,
            auth_token,
            endpoint,
            ..
        } => ClientConfig::OpenAi {
            api_key: auth_token.clone(),
            model: model.clone(),
            base_url: Some(endpoint.clone()),
        },
        LlmConfig::Ollama {
            model, endpoint, ..
        } => ClientConfig::Ollama {
            base_url: endpoint.clone(),
            model: model.clone(),
        },
    };
    Ok(ensure_llm_ready(&client_cfg).await?)
}

fn browser_config(settings: &BrowserSettings) -> BrowserConfig {
    BrowserConfig {
        webdriver_url: settings.webdriver_url.clone(),
        headless: settings.headless,
        page_timeout: Duration::from_secs(settings.page_timeout_secs),
        user_agent: settings.user_agent.clone(),
    }
}

fn verdict_policy(mode: VerdictMode) -> VerdictPolicy {
    match mode {
        VerdictMode::NonEmpty => VerdictPolicy::NonEmpty,
        VerdictMode::Sentinel => VerdictPolicy::Sentinel,
    }
}
