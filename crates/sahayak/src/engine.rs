//! Engine wiring: reference data + per-session state + router + optional
//! downstream formatter.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::data::{EmployeeDirectory, HolidayCalendar};
use crate::embeddings::minilm::{MiniLmConfig, MiniLmEmbeddings};
use crate::index::{PolicyIndex, PolicyStore};
use crate::llm::{GenerationConfig, LlmClient, TextGenerator};
use crate::router::{PolicySearch, Router};
use crate::session::SessionStore;
use crate::types::{Answer, RoutedReply, NO_ANSWER_TEXT};

/// Constrained formatting prompt for semantic answers. Deterministic
/// sampling plus the "only from context" instruction keep the formatter
/// from inventing facts the index did not return.
fn build_format_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a strict HR assistant.\n\
         Answer ONLY from the context.\n\
         If not found, say: Information not available.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        context, question
    )
}

pub struct HrEngine {
    router: Router,
    sessions: SessionStore,
    llm: Option<Arc<dyn TextGenerator>>,
    generation: GenerationConfig,
}

impl HrEngine {
    /// Load reference data, open the pre-built policy index, and stand up
    /// the router. Data problems surface here, before any question is
    /// served.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        config.validate().map_err(|e| anyhow!(e))?;

        let employees = EmployeeDirectory::from_csv_path(&config.employees_file)
            .context("Failed to load employee roster")?;
        let holidays = HolidayCalendar::from_json_path(&config.holidays_file)
            .context("Failed to load holiday calendar")?;

        let minilm_config = MiniLmConfig::auto_detect(&config.index.model_dir).ok_or_else(|| {
            anyhow!(
                "Embedding model not found under {}",
                config.index.model_dir.display()
            )
        })?;
        let embeddings = Arc::new(
            MiniLmEmbeddings::new(minilm_config).context("Failed to load embedding model")?,
        );

        let index_path = config.index.index_dir.display().to_string();
        let store = PolicyStore::open(&index_path, config.index.dimension)
            .await
            .context("Failed to open policy index")?;
        let policies: Arc<dyn PolicySearch> = Arc::new(PolicyIndex::new(store, embeddings));

        // A missing formatter degrades ask_formatted, never construction.
        let llm = match LlmClient::from_config(&config.llm) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn TextGenerator>),
            Err(e) => {
                tracing::warn!(error = %e, "LLM formatter unavailable, semantic answers stay raw");
                None
            }
        };

        Ok(Self::with_components(
            employees,
            holidays,
            policies,
            llm,
            GenerationConfig::from(&config.llm),
            config.search.fallback_k,
        ))
    }

    /// Assemble an engine from already-constructed components. This is the
    /// seam tests and embedding applications use.
    pub fn with_components(
        employees: EmployeeDirectory,
        holidays: HolidayCalendar,
        policies: Arc<dyn PolicySearch>,
        llm: Option<Arc<dyn TextGenerator>>,
        generation: GenerationConfig,
        fallback_k: usize,
    ) -> Self {
        let router = Router::new(Arc::new(employees), Arc::new(holidays), policies, fallback_k);
        Self {
            router,
            sessions: SessionStore::new(),
            llm,
            generation,
        }
    }

    /// Route one question within a session and return the typed answer.
    /// Session state is snapshotted before routing and committed after, so
    /// no lock is held across the semantic-search await.
    pub async fn ask(&self, session_id: &str, question: &str) -> RoutedReply {
        let start = std::time::Instant::now();

        let mut state = self.sessions.snapshot(session_id);
        let outcome = self.router.route(question, &mut state).await;
        self.sessions.commit(session_id, state);

        let rule = outcome.rule.map(|r| r.name());
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(session = session_id, rule, duration_ms, "Answered question");

        RoutedReply {
            answer: outcome.answer,
            rule,
            duration_ms,
        }
    }

    /// Route and produce the final user-facing string: structured answers
    /// pass through untouched, semantic answers go through the constrained
    /// formatter. Formatter failures degrade to an apology; this method
    /// never fails.
    pub async fn ask_formatted(&self, session_id: &str, question: &str) -> String {
        let reply = self.ask(session_id, question).await;

        match reply.answer {
            Answer::Structured { text } => text,
            Answer::NoAnswer => NO_ANSWER_TEXT.to_string(),
            Answer::Semantic { context } => match &self.llm {
                Some(llm) => {
                    let prompt = build_format_prompt(&context, question);
                    match llm.generate(&prompt, &self.generation).await {
                        Ok(text) => text.trim().to_string(),
                        Err(e) => {
                            tracing::warn!(error = %e, "Formatting call failed, degrading");
                            format!(
                                "I apologize, but I encountered an error: {}. Please try again.",
                                e
                            )
                        }
                    }
                }
                None => {
                    tracing::warn!("No LLM formatter configured, returning raw policy context");
                    context.trim().to_string()
                }
            },
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::employees::tests::sample_directory;
    use crate::data::holidays::tests::sample_calendar;
    use crate::types::PolicyHit;
    use async_trait::async_trait;

    struct FixedPolicies(Vec<PolicyHit>);

    #[async_trait]
    impl PolicySearch for FixedPolicies {
        async fn search(&self, _query: &str, k: usize) -> Result<Vec<PolicyHit>> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
    }

    struct CannedGenerator(Result<String, String>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow!(e.clone())),
            }
        }
    }

    fn leave_hit() -> PolicyHit {
        PolicyHit {
            id: "c0".into(),
            text: "Employees receive 20 paid leave days per year.".into(),
            source: "handbook.txt".into(),
            heading: String::new(),
            score: 0.9,
        }
    }

    fn engine(llm: Option<Arc<dyn TextGenerator>>) -> HrEngine {
        HrEngine::with_components(
            sample_directory(),
            sample_calendar(),
            Arc::new(FixedPolicies(vec![leave_hit()])),
            llm,
            GenerationConfig::default(),
            2,
        )
    }

    #[test]
    fn format_prompt_carries_instruction_context_and_question() {
        let prompt = build_format_prompt("ctx passage", "leave policy?");
        assert!(prompt.starts_with("You are a strict HR assistant."));
        assert!(prompt.contains("Answer ONLY from the context."));
        assert!(prompt.contains("Context:\nctx passage"));
        assert!(prompt.contains("Question: leave policy?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[tokio::test]
    async fn concurrent_sessions_keep_separate_pointers() {
        let engine = engine(None);

        let _ = engine.ask("alpha", "who is anushree sharma").await;
        let _ = engine.ask("beta", "details of 102").await;

        let alpha = engine.ask("alpha", "what is her salary?").await;
        let beta = engine.ask("beta", "what is his salary?").await;

        assert_eq!(
            alpha.answer,
            Answer::structured("Anushree Sharma's salary is 55000.")
        );
        assert_eq!(
            beta.answer,
            Answer::structured("Rahul Verma's salary is 82000.")
        );
    }

    #[tokio::test]
    async fn ask_reports_the_matched_rule() {
        let engine = engine(None);
        let reply = engine.ask("s", "how many employees").await;
        assert_eq!(reply.rule, Some("employee_count"));
        let reply = engine.ask("s", "what is the weather today").await;
        assert_eq!(reply.rule, None);
    }

    #[tokio::test]
    async fn formatted_semantic_answer_goes_through_the_llm() {
        let llm: Arc<dyn TextGenerator> =
            Arc::new(CannedGenerator(Ok("  You get 20 leave days per year.  ".into())));
        let engine = engine(Some(llm));

        let text = engine.ask_formatted("s", "what is the leave policy?").await;
        assert_eq!(text, "You get 20 leave days per year.");
    }

    #[tokio::test]
    async fn formatter_failure_produces_the_apology_text() {
        let llm: Arc<dyn TextGenerator> = Arc::new(CannedGenerator(Err("model offline".into())));
        let engine = engine(Some(llm));

        let text = engine.ask_formatted("s", "what is the leave policy?").await;
        assert!(text.starts_with("I apologize, but I encountered an error:"));
        assert!(text.ends_with("Please try again."));
    }

    #[tokio::test]
    async fn formatted_structured_answer_skips_the_llm() {
        // A generator that would fail loudly if consulted.
        let llm: Arc<dyn TextGenerator> = Arc::new(CannedGenerator(Err("must not be called".into())));
        let engine = engine(Some(llm));

        let text = engine.ask_formatted("s", "how many holidays?").await;
        assert_eq!(text, "There are 4 holidays in 2026.");
    }

    #[tokio::test]
    async fn missing_formatter_returns_raw_context() {
        let engine = engine(None);
        let text = engine.ask_formatted("s", "what is the leave policy?").await;
        assert_eq!(text, "Employees receive 20 paid leave days per year.");
    }

    #[tokio::test]
    async fn no_answer_is_the_fixed_literal() {
        let engine = engine(None);
        let text = engine.ask_formatted("s", "what is the weather today").await;
        assert_eq!(text, NO_ANSWER_TEXT);
    }
}
