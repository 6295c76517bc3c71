//! Oracle-guided search crawling.
//!
//! [`SearchOrchestrator`] walks up to [`MAX_PAGES`] search-result pages for a
//! query. Each page is rendered by a [`PageFetcher`] and judged by an
//! [`AnswerOracle`]; the first page the oracle accepts ends the search.
//!
//! ```text
//! Searching(0) -> Searching(1) -> ... -> Searching(4) -> Exhausted
//!       |               |                     |
//!       +-> Found       +-> Found             +-> Found
//!       +-> Aborted     +-> Aborted           +-> Aborted
//! ```

pub mod fetcher;
pub mod oracle;
pub mod search_url;

pub use fetcher::{BrowserFetcher, FetchedPage, PageFetcher};
pub use oracle::{AnswerOracle, NO_ANSWER_SENTINEL, OracleVerdict, VerdictPolicy};
pub use search_url::{DEFAULT_SEARCH_BASE, RESULTS_PER_PAGE, SearchUrlBuilder};

use crate::context::{CallContext, Interrupted};
use crate::tool::{Tool, ToolError};
use async_trait::async_trait;
use sleuth_common::SleuthError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};

/// Result pages examined before giving up.
pub const MAX_PAGES: usize = 5;

pub const CRAWLER_TOOL_NAME: &str = "llm_guided_web_crawler";

const CRAWLER_DESCRIPTION: &str = "Searches the web for a query, reading up to five result pages \
in order and asking a language model whether each one answers it. Input: the plain-text query. \
Output: the answer from the first page that contains it.";

/// Part of a page iteration that was running when the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => f.write_str("fetch"),
            Stage::Classify => f.write_str("classify"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("fetching page {page} ({url}) failed")]
    Fetch {
        page: usize,
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("oracle failed on page {page}")]
    Oracle {
        page: usize,
        #[source]
        source: SleuthError,
    },
    #[error("answer not found after {pages} pages")]
    NotFound { pages: usize },
    #[error("search cancelled during {stage} of page {page}")]
    Cancelled { stage: Stage, page: usize },
    #[error("search deadline exceeded during {stage} of page {page}")]
    DeadlineExceeded { stage: Stage, page: usize },
}

impl SearchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchError::NotFound { .. })
    }

    fn interrupted(reason: Interrupted, stage: Stage, page: usize) -> Self {
        match reason {
            Interrupted::Cancelled => SearchError::Cancelled { stage, page },
            Interrupted::DeadlineExceeded => SearchError::DeadlineExceeded { stage, page },
        }
    }
}

/// Position of one search in its page loop.
#[derive(Debug)]
pub enum SearchState {
    /// About to fetch and classify the zero-based page.
    Searching(usize),
    Found(String),
    /// Every page was classified and none held the answer.
    Exhausted,
    Aborted(SearchError),
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Searching(_))
    }

    /// Transition after `page` has been classified.
    pub fn after_verdict(page: usize, verdict: OracleVerdict) -> Self {
        if verdict.found {
            SearchState::Found(verdict.answer)
        } else if page + 1 < MAX_PAGES {
            SearchState::Searching(page + 1)
        } else {
            SearchState::Exhausted
        }
    }
}

/// Advisory progress for observers of a running search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchProgress {
    PageStarted { page: usize, url: String },
    PageClassified { page: usize, found: bool },
}

/// Drives the fetch/classify loop for a query.
///
/// Holds no per-search state, so one orchestrator serves concurrent calls.
#[derive(Clone)]
pub struct SearchOrchestrator {
    urls: SearchUrlBuilder,
    fetcher: Arc<dyn PageFetcher>,
    oracle: AnswerOracle,
    progress: Option<mpsc::Sender<SearchProgress>>,
}

impl SearchOrchestrator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, oracle: AnswerOracle) -> Self {
        Self {
            urls: SearchUrlBuilder::default(),
            fetcher,
            oracle,
            progress: None,
        }
    }

    pub fn with_url_builder(mut self, urls: SearchUrlBuilder) -> Self {
        self.urls = urls;
        self
    }

    /// Report progress on `tx`. Events are dropped when the channel is full.
    pub fn with_progress(mut self, tx: mpsc::Sender<SearchProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Search for `query`, returning the first answer the oracle accepts.
    pub async fn search(&self, ctx: &CallContext, query: &str) -> Result<String, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let span = info_span!("search", call_id = %ctx.call_id(), %query);
        async {
            let mut state = SearchState::Searching(0);
            loop {
                state = match state {
                    SearchState::Searching(page) => self.step(ctx, query, page).await,
                    SearchState::Found(answer) => {
                        info!("answer found");
                        return Ok(answer);
                    }
                    SearchState::Exhausted => {
                        warn!(pages = MAX_PAGES, "no page held the answer");
                        return Err(SearchError::NotFound { pages: MAX_PAGES });
                    }
                    SearchState::Aborted(err) => {
                        warn!(error = %err, "search aborted");
                        return Err(err);
                    }
                };
            }
        }
        .instrument(span)
        .await
    }

    async fn step(&self, ctx: &CallContext, query: &str, page: usize) -> SearchState {
        let url = self.urls.build_url(query, page);
        info!(page, %url, "fetching result page");
        self.notify(SearchProgress::PageStarted {
            page,
            url: url.clone(),
        });

        let fetched = match ctx.run(self.fetcher.fetch(&url)).await {
            Err(reason) => {
                return SearchState::Aborted(SearchError::interrupted(reason, Stage::Fetch, page));
            }
            Ok(Err(source)) => {
                return SearchState::Aborted(SearchError::Fetch { page, url, source });
            }
            Ok(Ok(fetched)) => fetched,
        };
        debug!(page, chars = fetched.content.len(), "page fetched");

        let verdict = match ctx.run(self.oracle.classify(&fetched.content, query)).await {
            Err(reason) => {
                return SearchState::Aborted(SearchError::interrupted(
                    reason,
                    Stage::Classify,
                    page,
                ));
            }
            Ok(Err(source)) => return SearchState::Aborted(SearchError::Oracle { page, source }),
            Ok(Ok(verdict)) => verdict,
        };
        info!(page, found = verdict.found, "page classified");
        self.notify(SearchProgress::PageClassified {
            page,
            found: verdict.found,
        });

        SearchState::after_verdict(page, verdict)
    }

    fn notify(&self, event: SearchProgress) {
        if let Some(tx) = &self.progress {
            if let Err(e) = tx.try_send(event) {
                debug!(error = %e, "progress event dropped");
            }
        }
    }
}

#[async_trait]
impl Tool for SearchOrchestrator {
    fn name(&self) -> &str {
        CRAWLER_TOOL_NAME
    }

    fn description(&self) -> &str {
        CRAWLER_DESCRIPTION
    }

    async fn call(&self, ctx: &CallContext, input: &str) -> Result<String, ToolError> {
        Ok(self.search(ctx, input).await?)
    }
}
