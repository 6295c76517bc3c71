use sleuth_common::SleuthError;
use sleuth_llm::traits::LlmClient;
use std::sync::Arc;
use tracing::debug;

/// Reply the model is asked to give under [`VerdictPolicy::Sentinel`] when
/// the page does not answer the query.
pub const NO_ANSWER_SENTINEL: &str = "NO_ANSWER";

/// How a raw model reply is turned into a found / not-found decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerdictPolicy {
    /// Any reply that is non-empty after trimming counts as an answer. The
    /// prompt asks for `''` on a miss, and a model that literally prints the
    /// two quote characters is therefore read as a hit. A whitespace-only
    /// reply is a miss here, unlike a bare emptiness check on the raw text.
    #[default]
    NonEmpty,
    /// The prompt asks for [`NO_ANSWER_SENTINEL`] on a miss. The sentinel,
    /// an empty reply, `''` and `""` all count as not found.
    Sentinel,
}

impl VerdictPolicy {
    pub fn verdict(self, reply: &str) -> OracleVerdict {
        let normalized = reply.trim().to_lowercase();
        let found = match self {
            VerdictPolicy::NonEmpty => !normalized.is_empty(),
            VerdictPolicy::Sentinel => !(normalized.is_empty()
                || normalized == NO_ANSWER_SENTINEL.to_lowercase()
                || normalized == "''"
                || normalized == "\"\""),
        };
        OracleVerdict {
            found,
            answer: if found { reply.to_string() } else { String::new() },
        }
    }

    fn miss_instruction(self) -> &'static str {
        match self {
            VerdictPolicy::NonEmpty => "otherwise return ''.",
            VerdictPolicy::Sentinel => "otherwise reply with exactly NO_ANSWER and nothing else.",
        }
    }
}

/// Outcome of asking the model about one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleVerdict {
    pub found: bool,
    /// Model reply as returned when `found`, empty otherwise.
    pub answer: String,
}

/// Asks a language model whether a page answers a query.
#[derive(Clone)]
pub struct AnswerOracle {
    llm: Arc<dyn LlmClient + Send + Sync>,
    policy: VerdictPolicy,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl AnswerOracle {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self {
            llm,
            policy: VerdictPolicy::default(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_policy(mut self, policy: VerdictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn policy(&self) -> VerdictPolicy {
        self.policy
    }

    /// Prompt sent for one page: instruction, then query, then content.
    pub fn build_prompt(&self, query: &str, content: &str) -> String {
        format!(
            "You are an expert at reading web page text. Decide whether the content below answers the query: \"{query}\".\n\
             If it does, return only the answer; {}\n\
             Content: {content}",
            self.policy.miss_instruction()
        )
    }

    /// Classify `content` against `query`. Model errors pass through unchanged.
    pub async fn classify(&self, content: &str, query: &str) -> Result<OracleVerdict, SleuthError> {
        let prompt = self.build_prompt(query, content);
        let reply = self
            .llm
            .generate(&prompt, None, self.max_tokens, self.temperature)
            .await?;
        let verdict = self.policy.verdict(&reply.text);
        debug!(
            target: "crawler.oracle",
            model = %self.llm.model_name(),
            found = verdict.found,
            tokens = ?reply.tokens_used,
            "page classified"
        );
        Ok(verdict)
    }
}
